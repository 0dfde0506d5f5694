//! Per-frame gesture pipeline: classify each detected hand, then stabilize.

use tracing::debug;

use super::classifier::{ClassifierConfig, GestureLabel, HandAnalysis, HandPoseClassifier};
use super::hand_landmarks::{HandLandmarks, MAX_HANDS};
use super::stabilizer::{GestureStabilizer, StabilizerConfig};
use glam::Vec3;

/// Output of one pipeline step.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedFrame {
    /// Stabilized (or composite/swipe) gesture.
    pub gesture: GestureLabel,
    /// Per-hand analysis in detection order.
    pub hands: Vec<HandAnalysis>,
}

impl TrackedFrame {
    /// Primary hand (detection index 0).
    pub fn primary(&self) -> Option<&HandAnalysis> {
        self.hands.first()
    }

    /// Pointer in normalized image space, if a hand is present.
    pub fn pointer(&self) -> Option<Vec3> {
        self.primary().map(HandAnalysis::pointer)
    }
}

/// One classifier per hand slot plus a shared stabilizer.
pub struct GestureTracker {
    classifiers: [HandPoseClassifier; MAX_HANDS],
    stabilizer: GestureStabilizer,
    hands_seen: usize,
}

impl GestureTracker {
    pub fn new(classifier: ClassifierConfig, stabilizer: StabilizerConfig) -> Self {
        Self {
            classifiers: [
                HandPoseClassifier::new(classifier.clone()),
                HandPoseClassifier::new(classifier),
            ],
            stabilizer: GestureStabilizer::new(stabilizer),
            hands_seen: 0,
        }
    }

    /// Run classification and stabilization for one frame.
    pub fn process(&mut self, hands: &[HandLandmarks]) -> TrackedFrame {
        let count = hands.len().min(MAX_HANDS);
        if count != self.hands_seen {
            debug!("Hands in view: {} -> {}", self.hands_seen, count);
            // Slots that emptied lose their smoothing history.
            for slot in count..MAX_HANDS {
                self.classifiers[slot].reset();
            }
            self.hands_seen = count;
        }

        let analyses: Vec<HandAnalysis> = hands
            .iter()
            .take(MAX_HANDS)
            .zip(self.classifiers.iter_mut())
            .map(|(hand, classifier)| classifier.analyze(hand))
            .collect();

        let gesture = self.stabilizer.update(&analyses);
        TrackedFrame {
            gesture,
            hands: analyses,
        }
    }

    /// Current stable single-hand label.
    pub fn stable(&self) -> GestureLabel {
        self.stabilizer.stable()
    }

    /// Drop every smoothing buffer and the vote window.
    pub fn reset(&mut self) {
        for c in self.classifiers.iter_mut() {
            c.reset();
        }
        self.stabilizer.reset();
        self.hands_seen = 0;
    }
}

impl Default for GestureTracker {
    fn default() -> Self {
        Self::new(ClassifierConfig::default(), StabilizerConfig::default())
    }
}
