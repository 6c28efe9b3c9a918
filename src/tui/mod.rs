//! TUI debugger for the 4-bit machine.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register and clock view with bit coloring
//! - Program store view with disassembly
//! - Step/run/pause/breakpoint/reset controls

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
