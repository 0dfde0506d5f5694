//! Hand tracking subsystem: landmark model, pose classification and
//! temporal stabilization.

pub mod classifier;
pub mod hand_landmarks;
pub mod personalization;
pub mod stabilizer;
pub mod tracker;

pub use classifier::{ClassifierConfig, GestureLabel, HandAnalysis, HandPoseClassifier};
pub use hand_landmarks::{HandLandmark, HandLandmarks};
pub use personalization::{NoPersonalization, StaticThresholds, ThresholdProvider};
pub use stabilizer::{GestureStabilizer, StabilizerConfig};
pub use tracker::{GestureTracker, TrackedFrame};
