//! TUI debugger.
//!
//! Provides an interactive terminal front end with:
//! - Program listing with the step cursor
//! - Register and memory views
//! - Console view of the execution trace
//! - Run/step/stop controls and source reload

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
