use foundation::latlng::LatLng;
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// What to do with a stop whose `data-lat` / `data-lng` does not parse to a
/// finite number.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatePolicy {
    /// Create the marker anyway, at the NaN coordinate. Only useful with a
    /// backend that tolerates it; Leaflet throws on NaN.
    PassThrough,
    /// Drop the stop: no marker, no click handler.
    #[default]
    Skip,
    /// Fail initialization.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLayerConfig {
    pub url_template: String,
    pub max_zoom: u32,
    pub attribution: String,
}

impl Default for TileLayerConfig {
    fn default() -> Self {
        Self {
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            max_zoom: 19,
            attribution: "© OpenStreetMap".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub interval_ms: u64,
    /// Half-width of the uniform per-axis offset applied on every tick (degrees).
    pub jitter_deg: f64,
    /// Keep each marker within `origin ± max_drift_deg` per axis. `None` leaves
    /// the random walk unbounded.
    pub max_drift_deg: Option<f64>,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            interval_ms: 3000,
            jitter_deg: 0.00075,
            max_drift_deg: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Element id of the map mount point.
    pub mount_id: String,
    pub stop_selector: String,
    /// `dataset` keys holding the stop coordinate.
    pub lat_key: String,
    pub lng_key: String,
    pub center: LatLng,
    pub zoom: f64,
    pub focus_zoom: f64,
    pub animate_focus: bool,
    pub tiles: TileLayerConfig,
    pub motion: MotionConfig,
    pub coordinate_policy: CoordinatePolicy,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            mount_id: "map".to_string(),
            stop_selector: ".bus-list li".to_string(),
            lat_key: "lat".to_string(),
            lng_key: "lng".to_string(),
            center: LatLng::new(28.7041, 77.1025),
            zoom: 13.0,
            focus_zoom: 15.0,
            animate_focus: true,
            tiles: TileLayerConfig::default(),
            motion: MotionConfig::default(),
            coordinate_policy: CoordinatePolicy::default(),
        }
    }
}

impl MapConfig {
    /// Parses a (possibly partial) JSON override; missing fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, TrackerError> {
        let cfg = serde_json::from_str::<MapConfig>(raw)
            .map_err(|e| TrackerError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.mount_id.trim().is_empty() {
            return Err(TrackerError::Config("mount_id is empty".to_string()));
        }
        if !self.center.is_finite() || !self.center.is_in_range() {
            return Err(TrackerError::Config(format!(
                "center out of range: ({}, {})",
                self.center.lat, self.center.lng
            )));
        }
        if !self.zoom.is_finite() || !self.focus_zoom.is_finite() {
            return Err(TrackerError::Config("zoom levels must be finite".to_string()));
        }
        if self.motion.interval_ms == 0 {
            return Err(TrackerError::Config("motion.interval_ms must be > 0".to_string()));
        }
        if !self.motion.jitter_deg.is_finite() || self.motion.jitter_deg < 0.0 {
            return Err(TrackerError::Config(
                "motion.jitter_deg must be a non-negative number".to_string(),
            ));
        }
        if let Some(d) = self.motion.max_drift_deg
            && (!d.is_finite() || d < 0.0)
        {
            return Err(TrackerError::Config(
                "motion.max_drift_deg must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub selector: String,
    pub shown_class: String,
    /// Visible fraction of the element required before it is revealed.
    pub threshold: f64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            selector: ".reveal".to_string(),
            shown_class: "show".to_string(),
            threshold: 0.2,
        }
    }
}

impl RevealConfig {
    pub fn from_json(raw: &str) -> Result<Self, TrackerError> {
        let cfg = serde_json::from_str::<RevealConfig>(raw)
            .map_err(|e| TrackerError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), TrackerError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(TrackerError::Config(format!(
                "reveal threshold {} not in [0, 1]",
                self.threshold
            )));
        }
        Ok(())
    }
}
