//! S-expression command interface for the presentation layer.

pub mod dispatch;

pub use dispatch::{format_event, handle_message};
