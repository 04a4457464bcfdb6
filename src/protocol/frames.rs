//! JSON frames exchanged over the chat WebSocket.

use crate::error::{ClientError, ClientResult};
use crate::session::{Message, Role};
use serde::{Deserialize, Serialize};

/// A message as sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireMessage {
    /// Author role.
    pub role: Role,
    /// Message text.
    pub content: String,
}

/// A chat request opening a new turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    /// Model id.
    pub model: String,
    /// Conversation history, oldest first.
    pub messages: Vec<WireMessage>,
    /// System prompt (may be empty).
    pub system_prompt: String,
}

impl ChatRequest {
    /// Build a request from the session history.
    ///
    /// System-role messages never travel in `messages`; the system prompt
    /// has its own field.
    pub fn from_history<'a>(
        model: &str,
        history: impl IntoIterator<Item = &'a Message>,
        system_prompt: &str,
    ) -> Self {
        let messages = history
            .into_iter()
            .filter(|message| message.role != Role::System)
            .map(|message| WireMessage {
                role: message.role,
                content: message.content.clone(),
            })
            .collect();

        Self {
            model: model.to_string(),
            messages,
            system_prompt: system_prompt.to_string(),
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ControlFrame {
    Cancel,
}

/// Frames sent from the client to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// Start a turn.
    Chat(ChatRequest),
    /// Ask the server to stop the current turn.
    Cancel,
}

impl OutboundFrame {
    /// Serialize the frame to its JSON text form.
    pub fn to_json(&self) -> ClientResult<String> {
        let text = match self {
            Self::Chat(request) => serde_json::to_string(request)?,
            Self::Cancel => serde_json::to_string(&ControlFrame::Cancel)?,
        };
        Ok(text)
    }
}

/// Inbound frame before it is checked against the event vocabulary.
///
/// The server attaches a `content` field to every frame, including the ones
/// that carry no payload; it is ignored there.
#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Events received from the server during a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The backend started working on the turn.
    Thinking,
    /// A fragment of thinking text.
    ThinkingChunk(String),
    /// A fragment of answer text.
    Chunk(String),
    /// The turn completed.
    Done,
    /// The turn was cancelled.
    Cancelled,
    /// The backend failed the turn.
    Error(String),
}

impl StreamEvent {
    /// Parse one inbound text frame.
    ///
    /// Unknown `type` values and missing payloads are protocol errors.
    pub fn parse(text: &str) -> ClientResult<Self> {
        let raw: RawFrame = serde_json::from_str(text)?;
        let kind = raw
            .kind
            .ok_or_else(|| ClientError::Protocol("frame has no type".to_string()))?;

        let payload = |content: Option<String>| {
            content.ok_or_else(|| ClientError::Protocol(format!("{kind} frame has no content")))
        };

        Ok(match kind.as_str() {
            "thinking" => Self::Thinking,
            "thinking_chunk" => Self::ThinkingChunk(payload(raw.content)?),
            "chunk" => Self::Chunk(payload(raw.content)?),
            "done" => Self::Done,
            "cancelled" => Self::Cancelled,
            "error" => Self::Error(payload(raw.content)?),
            other => {
                return Err(ClientError::Protocol(format!("unknown frame type: {other}")));
            }
        })
    }

    /// Whether this event closes a turn.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Cancelled | Self::Error(_))
    }

    /// Wire name of the event.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Thinking => "thinking",
            Self::ThinkingChunk(_) => "thinking_chunk",
            Self::Chunk(_) => "chunk",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
            Self::Error(_) => "error",
        }
    }
}
