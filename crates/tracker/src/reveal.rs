use foundation::ids::TargetId;

use crate::config::RevealConfig;

/// Observers report ratios with limited precision; an entry sitting right at
/// the threshold must still count.
const RATIO_TOLERANCE: f64 = 1e-4;

/// One visibility change reported by the browser.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct IntersectionEntry {
    pub target: TargetId,
    pub is_intersecting: bool,
    /// Visible fraction of the element, `0.0..=1.0`.
    pub ratio: f64,
}

/// Tracks which reveal targets have been shown.
///
/// Shown state is monotonic: a target flips to shown at most once and never
/// flips back, whatever the observer reports afterwards.
#[derive(Debug, Clone)]
pub struct RevealController {
    threshold: f64,
    shown: Vec<bool>,
}

impl RevealController {
    /// `threshold` is clamped into `[0, 1]`; NaN falls back to the default.
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold.is_nan() {
            RevealConfig::default().threshold
        } else {
            threshold.clamp(0.0, 1.0)
        };
        Self {
            threshold,
            shown: Vec::new(),
        }
    }

    pub fn from_config(config: &RevealConfig) -> Self {
        Self::new(config.threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Registers `count` targets found at page-ready and returns their ids in
    /// document order. Calling it again appends further targets.
    pub fn observe(&mut self, count: usize) -> Vec<TargetId> {
        let start = self.shown.len();
        self.shown.resize(start + count, false);
        (start..start + count)
            .map(|i| TargetId::new(i as u32))
            .collect()
    }

    /// Applies a batch of observer entries and returns the targets that became
    /// shown in this batch, in entry order. Unknown targets are ignored.
    pub fn on_intersections(&mut self, entries: &[IntersectionEntry]) -> Vec<TargetId> {
        let mut newly_shown = Vec::new();
        for entry in entries {
            if !entry.is_intersecting || entry.ratio + RATIO_TOLERANCE < self.threshold {
                continue;
            }
            let Some(shown) = self.shown.get_mut(entry.target.index() as usize) else {
                continue;
            };
            if *shown {
                continue;
            }
            *shown = true;
            newly_shown.push(entry.target);
        }
        newly_shown
    }

    pub fn is_shown(&self, target: TargetId) -> bool {
        self.shown
            .get(target.index() as usize)
            .copied()
            .unwrap_or(false)
    }

    pub fn target_count(&self) -> usize {
        self.shown.len()
    }

    pub fn shown_count(&self) -> usize {
        self.shown.iter().filter(|s| **s).count()
    }

    /// Every registered target has been shown; the observer can be dropped.
    pub fn is_complete(&self) -> bool {
        self.shown.iter().all(|s| *s)
    }
}

impl Default for RevealController {
    fn default() -> Self {
        Self::from_config(&RevealConfig::default())
    }
}
