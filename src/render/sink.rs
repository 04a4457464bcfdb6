//! The `RenderSink` trait: where session changes become visible.

use crate::protocol::ModelInfo;
use crate::session::{MessageId, Role};

/// A presentation layer driven by the session controller.
///
/// Content is handed over as opaque text: the core never parses, escapes or
/// formats it. Updates always carry the full accumulated text rather than a
/// diff, so renderers that cannot resume mid-token (markdown, math) can
/// simply re-render.
pub trait RenderSink {
    /// A message entered the conversation.
    fn display_message(&mut self, id: &MessageId, role: Role, content: &str);

    /// The content of a displayed message changed.
    fn update_message_content(&mut self, id: &MessageId, content: &str);

    /// The backend started working on a turn.
    fn show_working_indicator(&mut self);

    /// The backend stopped working on the turn.
    fn hide_working_indicator(&mut self);

    /// A thinking phase opened.
    fn show_thinking_panel(&mut self);

    /// The accumulated thinking text changed.
    fn update_thinking_text(&mut self, text: &str);

    /// The thinking panel is no longer relevant.
    fn hide_thinking_panel(&mut self);

    /// Show a notice outside the message list.
    fn show_system_notice(&mut self, text: &str);

    /// The thinking clock advanced.
    fn update_thinking_elapsed(&mut self, _secs: u64) {}

    /// A turn opened or closed.
    fn streaming_changed(&mut self, _streaming: bool) {}

    /// The turn's last mutation has been applied; run deferred passes.
    fn finish_render(&mut self) {}

    /// The conversation was reset.
    fn clear(&mut self) {}

    /// A model became the active selection.
    fn model_selected(&mut self, _model: &ModelInfo) {}
}
