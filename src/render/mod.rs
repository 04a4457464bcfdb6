//! Rendering: the boundary between the session and whatever displays it.
//!
//! The session core only talks to [`RenderSink`]. Two sinks ship with the
//! crate:
//! - [`TerminalSink`]: draws to a terminal with a live region for the turn
//! - [`RecordingSink`]: records every call, for headless runs and tests

mod output;
mod recording;
mod sink;
mod terminal;

pub use output::{OutputBuffer, Row, Tone};
pub use recording::{RecordingSink, RenderCall};
pub use sink::RenderSink;
pub use terminal::{wrap, TerminalSink};
