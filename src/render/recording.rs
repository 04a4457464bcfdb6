//! A sink that records every call, for headless use and tests.

use super::sink::RenderSink;
use crate::protocol::ModelInfo;
use crate::session::{MessageId, Role};

/// One call received by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCall {
    /// `display_message`.
    Display {
        /// Message id.
        id: MessageId,
        /// Author.
        role: Role,
        /// Initial content.
        content: String,
    },
    /// `update_message_content`.
    Update {
        /// Message id.
        id: MessageId,
        /// Full content.
        content: String,
    },
    /// `show_working_indicator`.
    ShowWorking,
    /// `hide_working_indicator`.
    HideWorking,
    /// `show_thinking_panel`.
    ShowThinking,
    /// `update_thinking_text`.
    ThinkingText(String),
    /// `hide_thinking_panel`.
    HideThinking,
    /// `show_system_notice`.
    Notice(String),
    /// `update_thinking_elapsed`.
    Elapsed(u64),
    /// `streaming_changed`.
    Streaming(bool),
    /// `finish_render`.
    FinishRender,
    /// `clear`.
    Clear,
    /// `model_selected`.
    ModelSelected(String),
}

/// Records render calls in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: Vec<RenderCall>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded calls.
    pub fn calls(&self) -> &[RenderCall] {
        &self.calls
    }

    /// Take the recorded calls, leaving the recorder empty.
    pub fn take(&mut self) -> Vec<RenderCall> {
        std::mem::take(&mut self.calls)
    }

    /// Notices shown so far.
    pub fn notices(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RenderCall::Notice(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of recorded calls equal to `call`.
    pub fn count(&self, call: &RenderCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }
}

impl RenderSink for RecordingSink {
    fn display_message(&mut self, id: &MessageId, role: Role, content: &str) {
        self.calls.push(RenderCall::Display {
            id: id.clone(),
            role,
            content: content.to_string(),
        });
    }

    fn update_message_content(&mut self, id: &MessageId, content: &str) {
        self.calls.push(RenderCall::Update {
            id: id.clone(),
            content: content.to_string(),
        });
    }

    fn show_working_indicator(&mut self) {
        self.calls.push(RenderCall::ShowWorking);
    }

    fn hide_working_indicator(&mut self) {
        self.calls.push(RenderCall::HideWorking);
    }

    fn show_thinking_panel(&mut self) {
        self.calls.push(RenderCall::ShowThinking);
    }

    fn update_thinking_text(&mut self, text: &str) {
        self.calls.push(RenderCall::ThinkingText(text.to_string()));
    }

    fn hide_thinking_panel(&mut self) {
        self.calls.push(RenderCall::HideThinking);
    }

    fn show_system_notice(&mut self, text: &str) {
        self.calls.push(RenderCall::Notice(text.to_string()));
    }

    fn update_thinking_elapsed(&mut self, secs: u64) {
        self.calls.push(RenderCall::Elapsed(secs));
    }

    fn streaming_changed(&mut self, streaming: bool) {
        self.calls.push(RenderCall::Streaming(streaming));
    }

    fn finish_render(&mut self) {
        self.calls.push(RenderCall::FinishRender);
    }

    fn clear(&mut self) {
        self.calls.push(RenderCall::Clear);
    }

    fn model_selected(&mut self, model: &ModelInfo) {
        self.calls.push(RenderCall::ModelSelected(model.id.clone()));
    }
}
