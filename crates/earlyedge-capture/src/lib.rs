//! earlyedge-capture — Response-capture surfaces.
//!
//! Implements the `ResponseCapture` capability trait for the environments
//! this harness runs in: scripted responses for automation and tests, and
//! an interactive terminal. Each surface declares which input modalities it
//! can actually provide; a test whose modality is missing fails before any
//! trial begins.

pub mod scripted;
pub mod strokes;
pub mod terminal;

pub use scripted::{ScriptedAction, ScriptedCapture};
pub use strokes::TraceSample;
pub use terminal::TerminalCapture;
