//! # Chatwheel
//!
//! A streaming chat client for conversational LLM backends.
//!
//! Chatwheel drives one chat session over a persistent WebSocket. The
//! backend answers each request with a stream of small frames: an optional
//! thinking phase, content chunks, and exactly one terminal event. The
//! session controller turns that stream into a coherent message list and a
//! series of render calls.
//!
//! ## Core Concepts
//!
//! - **Typed events**: every inbound frame becomes a [`StreamEvent`]
//! - **Single dispatch**: one thread applies events in arrival order, each to completion
//! - **Actor model**: isolated threads for the connection, user input, and the thinking clock
//! - **Full-content updates**: sinks always receive the whole accumulated text
//!
//! ## Example
//!
//! ```rust,ignore
//! use chatwheel::{ClientConfig, RecordingSink, SessionController};
//!
//! let mut controller = SessionController::new(&ClientConfig::default(), transport, RecordingSink::new());
//! controller.load_catalog(catalog, None);
//! controller.submit("Hello")?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod config;
pub mod error;
pub mod protocol;
pub mod render;
pub mod session;

// Re-exports for convenience
pub use actor::{
    ChatClient, ClientEvent, ConnectionActor, ConnectionStatus, ReconnectPolicy, Transport,
    UserCommand, COMMAND_HELP,
};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use protocol::{ChatRequest, ModelCatalog, ModelInfo, OutboundFrame, StreamEvent};
pub use render::{RecordingSink, RenderCall, RenderSink, TerminalSink};
pub use session::{Message, MessageId, Role, SessionController, SessionState};
