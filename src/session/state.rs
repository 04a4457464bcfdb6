//! Session State: the authoritative model of the conversation.

use super::message::{Message, MessageId, Role};

/// In-memory state of one chat session.
///
/// Only the controller and the interpreter mutate this; sinks receive copies
/// of the text they need.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Conversation, oldest first.
    messages: Vec<Message>,
    /// Whether a request is awaiting its terminal event.
    is_streaming: bool,
    /// Assistant message accumulating the current turn.
    active_message_id: Option<MessageId>,
    /// Thinking text of the current or most recent turn.
    thinking_buffer: String,
    /// Seconds spent thinking, while the clock runs.
    thinking_elapsed_secs: Option<u64>,
    /// System prompt sent with each request.
    system_prompt: String,
}

impl SessionState {
    /// Create an empty session with the given system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            ..Self::default()
        }
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether a turn is in flight.
    pub const fn is_streaming(&self) -> bool {
        self.is_streaming
    }

    /// Id of the assistant message receiving chunks.
    pub const fn active_message_id(&self) -> Option<&MessageId> {
        self.active_message_id.as_ref()
    }

    /// The assistant message receiving chunks.
    pub fn active_message(&self) -> Option<&Message> {
        let id = self.active_message_id.as_ref()?;
        self.messages.last().filter(|message| &message.id == id)
    }

    /// Accumulated thinking text.
    pub fn thinking_buffer(&self) -> &str {
        &self.thinking_buffer
    }

    /// Elapsed thinking time, while the clock runs.
    pub const fn thinking_elapsed_secs(&self) -> Option<u64> {
        self.thinking_elapsed_secs
    }

    /// The system prompt.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Replace the system prompt. Blank prompts are stored empty.
    pub fn set_system_prompt(&mut self, prompt: &str) {
        self.system_prompt = prompt.trim().to_string();
    }

    /// Find a message by id.
    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|message| &message.id == id)
    }

    /// Append the user's message and open a turn.
    pub(crate) fn begin_turn(&mut self, message: Message) -> &Message {
        debug_assert!(!self.is_streaming, "turn opened while streaming");
        self.is_streaming = true;
        self.active_message_id = None;
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// Close the turn: clear the streaming flag, active id and clock.
    ///
    /// The thinking buffer survives until the next turn opens its thinking
    /// phase.
    pub(crate) fn end_turn(&mut self) {
        self.is_streaming = false;
        self.active_message_id = None;
        self.thinking_elapsed_secs = None;
    }

    /// The active assistant message, created empty if the turn has none yet.
    ///
    /// Returns `true` alongside the message when it was just created.
    pub(crate) fn ensure_active_message(&mut self) -> (bool, &mut Message) {
        let live = self.active_message_id.as_ref().is_some_and(|id| {
            self.messages.last().is_some_and(|message| &message.id == id)
        });

        if !live {
            let message = Message::new(Role::Assistant, String::new());
            self.active_message_id = Some(message.id.clone());
            self.messages.push(message);
        }

        let last = self.messages.len() - 1;
        (!live, &mut self.messages[last])
    }

    /// Start a new thinking phase.
    pub(crate) fn open_thinking(&mut self) {
        self.thinking_buffer.clear();
        self.thinking_elapsed_secs = Some(0);
    }

    /// Append thinking text and return the accumulated buffer.
    pub(crate) fn append_thinking(&mut self, text: &str) -> &str {
        self.thinking_buffer.push_str(text);
        &self.thinking_buffer
    }

    /// Record the thinking clock reading.
    pub(crate) const fn set_thinking_elapsed(&mut self, secs: u64) {
        self.thinking_elapsed_secs = Some(secs);
    }

    /// Forget the whole conversation.
    pub(crate) fn reset(&mut self) {
        self.messages.clear();
        self.thinking_buffer.clear();
        self.end_turn();
    }
}
