//! Per-tick marker perturbation.

use foundation::latlng::LatLng;
use rand::Rng;

use crate::config::MotionConfig;

/// Uniform draw from the open interval `(-half_width, half_width)`.
///
/// Returns 0 for a zero or negative half-width.
pub fn open_offset<R: Rng + ?Sized>(rng: &mut R, half_width: f64) -> f64 {
    if half_width <= 0.0 {
        return 0.0;
    }
    loop {
        let d = rng.gen_range(-half_width..half_width);
        if d > -half_width {
            return d;
        }
    }
}

/// Adds an independent uniform offset to each axis.
pub fn jitter<R: Rng + ?Sized>(at: LatLng, half_width: f64, rng: &mut R) -> LatLng {
    let d_lat = open_offset(rng, half_width);
    let d_lng = open_offset(rng, half_width);
    at.offset(d_lat, d_lng)
}

/// Next position of a marker currently at `at` whose stop is at `origin`.
pub fn step<R: Rng + ?Sized>(at: LatLng, origin: LatLng, cfg: &MotionConfig, rng: &mut R) -> LatLng {
    let next = jitter(at, cfg.jitter_deg, rng);
    match cfg.max_drift_deg {
        Some(radius) => next.clamp_around(origin, radius),
        None => next,
    }
}
