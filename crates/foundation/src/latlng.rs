use serde::{Deserialize, Serialize};

/// Geographic coordinate in decimal degrees (WGS84).
///
/// No range validation happens here: a `LatLng` may carry NaN or out-of-range
/// values when it was built from untrusted markup. Use [`LatLng::is_finite`]
/// and [`LatLng::is_in_range`] to check.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    pub fn is_in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn offset(self, d_lat: f64, d_lng: f64) -> Self {
        Self {
            lat: self.lat + d_lat,
            lng: self.lng + d_lng,
        }
    }

    /// Clamps each axis to `origin ± radius_deg`.
    ///
    /// Returns `self` unchanged when the origin or radius is not finite.
    pub fn clamp_around(self, origin: LatLng, radius_deg: f64) -> Self {
        if !origin.is_finite() || !radius_deg.is_finite() {
            return self;
        }
        let r = radius_deg.abs();
        Self {
            lat: self.lat.clamp(origin.lat - r, origin.lat + r),
            lng: self.lng.clamp(origin.lng - r, origin.lng + r),
        }
    }

    /// Largest per-axis difference in degrees.
    pub fn max_axis_delta(&self, other: &LatLng) -> f64 {
        (self.lat - other.lat).abs().max((self.lng - other.lng).abs())
    }
}

/// `[lat, lng]`, the pair order Leaflet uses.
impl From<[f64; 2]> for LatLng {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}
