//! Interaction layer: clock, state machine, camera and the frame controller.

pub mod camera;
pub mod clock;
pub mod controller;
pub mod machine;

pub use camera::{CameraConfig, CameraRig};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use controller::{FrameOutput, InteractionController};
pub use machine::{InteractionConfig, InteractionMachine, InteractionState};
