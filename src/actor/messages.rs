//! Message types for actor communication.
//!
//! Every actor reports into the event loop with a [`ClientEvent`]; the loop
//! hands each one to the session controller in arrival order.

use crate::protocol::StreamEvent;
use std::time::Duration;

/// A tick from the thinking clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Generation of the clock that produced the tick.
    pub generation: u64,
    /// Tick number (monotonically increasing per clock).
    pub count: u64,
    /// Time elapsed since the clock was started.
    pub elapsed: Duration,
}

/// Connection lifecycle changes reported by the connection actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// The WebSocket handshake completed.
    Connected,
    /// An established connection dropped.
    Lost {
        /// Why the connection ended.
        reason: String,
    },
    /// A reconnect attempt is scheduled.
    Reconnecting {
        /// Consecutive failed attempts so far (1-based).
        attempt: u32,
        /// Delay before the next attempt.
        delay: Duration,
    },
    /// The reconnect policy is exhausted.
    GaveUp {
        /// Attempts made.
        attempts: u32,
    },
}

/// Commands typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Send a message.
    Submit(String),
    /// Stop the current response.
    Cancel,
    /// Start a new conversation.
    NewChat,
    /// List the available models.
    ListModels,
    /// Select a model by id.
    SelectModel(String),
    /// Show the current system prompt.
    ShowSystemPrompt,
    /// Replace the system prompt (empty clears it).
    SetSystemPrompt(String),
    /// Show the command summary.
    Help,
    /// A slash command that does not exist.
    Unknown(String),
    /// Leave the client.
    Quit,
}

/// Events delivered to the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A well-formed frame from the server.
    Stream(StreamEvent),

    /// A frame that could not be interpreted.
    Malformed {
        /// The frame text as received.
        raw: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Connection status changed.
    Connection(ConnectionStatus),

    /// Thinking clock tick.
    Tick(Tick),

    /// User action.
    Command(UserCommand),

    /// An actor is shutting down (input closed, for example).
    Shutdown,
}
