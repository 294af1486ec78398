pub mod ids;
pub mod latlng;
pub mod math;
pub mod time;

// Foundation crate: small, well-tested primitives only.
pub use ids::*;
pub use latlng::*;
pub use time::*;
