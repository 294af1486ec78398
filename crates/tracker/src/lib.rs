pub mod backend;
pub mod config;
pub mod error;
pub mod live_map;
pub mod marker;
pub mod motion;
pub mod reveal;
pub mod stops;

pub use backend::*;
pub use config::*;
pub use error::*;
pub use live_map::*;
pub use marker::*;
pub use reveal::*;
pub use stops::*;
