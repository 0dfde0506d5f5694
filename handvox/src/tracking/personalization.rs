//! Personalized gesture thresholds.
//!
//! The training collaborator that learns per-user thresholds lives outside
//! this crate; the classifier only asks it for a value at construction time.

use std::collections::HashMap;

use tracing::debug;

use super::classifier::GestureLabel;

/// Source of per-user gesture thresholds.
pub trait ThresholdProvider {
    /// Personalized threshold for `gesture`, or None to keep the default.
    fn personalized_threshold(&self, gesture: GestureLabel) -> Option<f32>;
}

/// Provider with no personalization data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPersonalization;

impl ThresholdProvider for NoPersonalization {
    fn personalized_threshold(&self, _gesture: GestureLabel) -> Option<f32> {
        None
    }
}

/// Fixed thresholds, e.g. supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct StaticThresholds {
    values: HashMap<GestureLabel, f32>,
}

impl StaticThresholds {
    pub fn with(mut self, gesture: GestureLabel, value: f32) -> Self {
        debug!("Personalized threshold for {}: {:.4}", gesture.threshold_key(), value);
        self.values.insert(gesture, value);
        self
    }
}

impl ThresholdProvider for StaticThresholds {
    fn personalized_threshold(&self, gesture: GestureLabel) -> Option<f32> {
        self.values.get(&gesture).copied()
    }
}
