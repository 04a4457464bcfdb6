//! Wire protocol: JSON frames over the chat WebSocket and the model catalog.
//!
//! # Frames
//!
//! ```text
//! client ──▶ server   {"model", "messages": [{role, content}], "system_prompt"}
//! client ──▶ server   {"type": "cancel"}
//! server ──▶ client   thinking · thinking_chunk · chunk · done · cancelled · error
//! ```
//!
//! Inbound frames are parsed into [`StreamEvent`]; anything that does not
//! fit the vocabulary is a protocol error and never reaches the session.

mod catalog;
mod frames;

pub use catalog::{ModelCatalog, ModelInfo};
pub use frames::{ChatRequest, OutboundFrame, StreamEvent, WireMessage};
