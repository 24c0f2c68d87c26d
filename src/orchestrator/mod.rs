//! Application-level orchestration.
//!
//! Executes the commands the wizard emits (analysis requests, deferred chart
//! draws, downloads) and turns their completions back into wizard events.
//! The TUI talks to [`run_controller`] over channels; headless runs call
//! [`drive`] directly.

mod controller;
mod downloads;

pub(crate) use controller::{run_controller, Feedback, UiCommand};
pub use controller::drive;
pub use downloads::save_download;
