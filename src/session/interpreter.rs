//! Stream Event Interpreter: applies inbound events to the session.
//!
//! A turn is either **Idle** (nothing outstanding) or **Active**. While
//! Active, thinking chunks and content chunks may interleave in any order;
//! the only structure enforced is that one terminal event closes the turn.
//!
//! ```text
//!            submit                        done | cancelled | error
//!   Idle ────────────▶ Active ───────────────────────────────────▶ Idle
//!                       │  ▲
//!                       └──┘ thinking · thinking_chunk · chunk
//! ```
//!
//! Events arriving while Idle are protocol anomalies: they are logged and
//! change nothing.

use super::state::SessionState;
use crate::protocol::StreamEvent;
use crate::render::RenderSink;
use crate::session::Role;
use tracing::{debug, warn};

/// Content given to an assistant message that was stopped before it said
/// anything.
pub const STOPPED_PLACEHOLDER: &str = "Response stopped.";

/// What the thinking clock should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockDirective {
    /// Start (or restart) the clock.
    Start,
    /// Stop the clock.
    Stop,
    /// Leave the clock as it is.
    Keep,
}

/// Result of dispatching one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The event changed the session.
    Applied(ClockDirective),
    /// The event arrived outside a turn and was dropped.
    Ignored,
}

impl Transition {
    /// The clock directive, `Keep` for ignored events.
    pub const fn clock(self) -> ClockDirective {
        match self {
            Self::Applied(directive) => directive,
            Self::Ignored => ClockDirective::Keep,
        }
    }
}

/// Apply one inbound event to the session and notify the sink.
///
/// Runs to completion; the sink sees the full accumulated text on every
/// update.
pub fn dispatch<S: RenderSink + ?Sized>(
    state: &mut SessionState,
    event: &StreamEvent,
    sink: &mut S,
) -> Transition {
    if !state.is_streaming() {
        warn!("Ignoring {} event outside a turn", event.kind());
        return Transition::Ignored;
    }

    let directive = match event {
        StreamEvent::Thinking => {
            state.open_thinking();
            sink.show_working_indicator();
            sink.show_thinking_panel();
            ClockDirective::Start
        }
        StreamEvent::ThinkingChunk(text) => {
            let full = state.append_thinking(text);
            sink.update_thinking_text(full);
            ClockDirective::Keep
        }
        StreamEvent::Chunk(text) => {
            append_content(state, text, sink);
            ClockDirective::Keep
        }
        StreamEvent::Done => {
            state.end_turn();
            sink.hide_working_indicator();
            if state.thinking_buffer().is_empty() {
                sink.hide_thinking_panel();
            }
            sink.streaming_changed(false);
            sink.finish_render();
            ClockDirective::Stop
        }
        StreamEvent::Cancelled => {
            settle_stopped_message(state, sink);
            state.end_turn();
            sink.hide_working_indicator();
            sink.hide_thinking_panel();
            sink.streaming_changed(false);
            ClockDirective::Stop
        }
        StreamEvent::Error(message) => {
            state.end_turn();
            sink.hide_working_indicator();
            sink.hide_thinking_panel();
            sink.streaming_changed(false);
            sink.show_system_notice(message);
            ClockDirective::Stop
        }
    };

    Transition::Applied(directive)
}

/// Append a content chunk, creating the assistant message on first use.
fn append_content<S: RenderSink + ?Sized>(state: &mut SessionState, text: &str, sink: &mut S) {
    let (created, message) = state.ensure_active_message();
    if created {
        debug!("Opened assistant message {}", message.id);
        sink.display_message(&message.id, Role::Assistant, &message.content);
    }
    message.content.push_str(text);
    sink.update_message_content(&message.id, &message.content);
}

/// Give a cancelled turn's assistant message the placeholder if it is blank.
fn settle_stopped_message<S: RenderSink + ?Sized>(state: &mut SessionState, sink: &mut S) {
    let (created, message) = state.ensure_active_message();
    let blank = message.content.trim().is_empty();
    if blank {
        STOPPED_PLACEHOLDER.clone_into(&mut message.content);
    }

    if created {
        sink.display_message(&message.id, Role::Assistant, &message.content);
    } else if blank {
        sink.update_message_content(&message.id, &message.content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RecordingSink, RenderCall};
    use crate::session::Message;

    fn active_state() -> SessionState {
        let mut state = SessionState::new("");
        state.begin_turn(Message::new(Role::User, "Hello"));
        state
    }

    fn feed(state: &mut SessionState, sink: &mut RecordingSink, events: &[StreamEvent]) {
        for event in events {
            dispatch(state, event, sink);
        }
    }

    fn chunk(text: &str) -> StreamEvent {
        StreamEvent::Chunk(text.to_string())
    }

    fn thinking_chunk(text: &str) -> StreamEvent {
        StreamEvent::ThinkingChunk(text.to_string())
    }

    #[test]
    fn test_chunks_concatenate_in_order() {
        let mut state = active_state();
        let mut sink = RecordingSink::new();
        let parts = ["The ", "quick ", "", "brown ", "fox", " ✓\n"];
        for part in parts {
            dispatch(&mut state, &chunk(part), &mut sink);
        }
        dispatch(&mut state, &StreamEvent::Done, &mut sink);

        assert_eq!(state.messages().len(), 2);
        assert_eq!(state.messages()[1].content, parts.concat());
        assert_eq!(state.messages()[1].role, Role::Assistant);
    }

    #[test]
    fn test_sink_receives_full_content() {
        let mut state = active_state();
        let mut sink = RecordingSink::new();
        feed(&mut state, &mut sink, &[chunk("Hi"), chunk(" there")]);

        let id = state.active_message_id().unwrap().clone();
        assert_eq!(
            sink.calls(),
            &[
                RenderCall::Display {
                    id: id.clone(),
                    role: Role::Assistant,
                    content: String::new(),
                },
                RenderCall::Update {
                    id: id.clone(),
                    content: "Hi".to_string(),
                },
                RenderCall::Update {
                    id,
                    content: "Hi there".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_thinking_chunks_concatenate() {
        let mut state = active_state();
        let mut sink = RecordingSink::new();
        feed(
            &mut state,
            &mut sink,
            &[StreamEvent::Thinking, thinking_chunk("a"), thinking_chunk("b"), thinking_chunk("c")],
        );

        assert_eq!(state.thinking_buffer(), "abc");
        assert_eq!(sink.calls().last(), Some(&RenderCall::ThinkingText("abc".to_string())));
    }

    #[test]
    fn test_thinking_directives() {
        let mut state = active_state();
        let mut sink = RecordingSink::new();

        assert_eq!(
            dispatch(&mut state, &StreamEvent::Thinking, &mut sink),
            Transition::Applied(ClockDirective::Start)
        );
        assert_eq!(
            dispatch(&mut state, &chunk("x"), &mut sink).clock(),
            ClockDirective::Keep
        );
        assert_eq!(
            dispatch(&mut state, &StreamEvent::Done, &mut sink),
            Transition::Applied(ClockDirective::Stop)
        );
    }

    #[test]
    fn test_chunk_before_thinking_is_tolerated() {
        let mut state = active_state();
        let mut sink = RecordingSink::new();
        feed(
            &mut state,
            &mut sink,
            &[chunk("early "), StreamEvent::Thinking, chunk("late"), StreamEvent::Done],
        );

        assert_eq!(state.messages().len(), 2);
        assert_eq!(state.messages()[1].content, "early late");
    }

    #[test]
    fn test_events_ignored_when_idle() {
        let mut state = SessionState::new("");
        let mut sink = RecordingSink::new();

        for event in [
            StreamEvent::Thinking,
            thinking_chunk("x"),
            chunk("x"),
            StreamEvent::Done,
            StreamEvent::Cancelled,
            StreamEvent::Error("boom".to_string()),
        ] {
            assert_eq!(dispatch(&mut state, &event, &mut sink), Transition::Ignored);
        }

        assert!(state.messages().is_empty());
        assert!(state.thinking_buffer().is_empty());
        assert!(sink.calls().is_empty());
    }

    #[test]
    fn test_done_twice_is_noop() {
        let mut state = active_state();
        let mut sink = RecordingSink::new();
        feed(&mut state, &mut sink, &[chunk("once"), StreamEvent::Done]);
        let calls_after_first = sink.calls().len();

        assert_eq!(dispatch(&mut state, &StreamEvent::Done, &mut sink), Transition::Ignored);
        assert_eq!(sink.calls().len(), calls_after_first);
        assert_eq!(state.messages()[1].content, "once");
        assert!(!state.is_streaming());
    }

    #[test]
    fn test_done_keeps_thinking_panel_with_text() {
        let mut state = active_state();
        let mut sink = RecordingSink::new();
        feed(
            &mut state,
            &mut sink,
            &[StreamEvent::Thinking, thinking_chunk("pondering"), StreamEvent::Done],
        );
        assert_eq!(sink.count(&RenderCall::HideThinking), 0);
        assert_eq!(sink.calls().last(), Some(&RenderCall::FinishRender));
    }

    #[test]
    fn test_done_hides_empty_thinking_panel() {
        let mut state = active_state();
        let mut sink = RecordingSink::new();
        feed(&mut state, &mut sink, &[StreamEvent::Thinking, chunk("hi"), StreamEvent::Done]);
        assert_eq!(sink.count(&RenderCall::HideThinking), 1);
        assert_eq!(sink.count(&RenderCall::FinishRender), 1);
    }

    #[test]
    fn test_cancelled_without_chunks_gets_placeholder() {
        let mut state = active_state();
        let mut sink = RecordingSink::new();
        feed(&mut state, &mut sink, &[StreamEvent::Thinking, StreamEvent::Cancelled]);

        assert_eq!(state.messages().len(), 2);
        assert_eq!(state.messages()[1].role, Role::Assistant);
        assert_eq!(state.messages()[1].content, STOPPED_PLACEHOLDER);
        assert!(!state.is_streaming());
        assert!(state.active_message_id().is_none());
    }

    #[test]
    fn test_cancelled_keeps_partial_content() {
        let mut state = active_state();
        let mut sink = RecordingSink::new();
        feed(&mut state, &mut sink, &[chunk("partial"), StreamEvent::Cancelled]);
        assert_eq!(state.messages()[1].content, "partial");
    }

    #[test]
    fn test_cancelled_replaces_whitespace_only_content() {
        let mut state = active_state();
        let mut sink = RecordingSink::new();
        feed(&mut state, &mut sink, &[chunk("  \n"), StreamEvent::Cancelled]);
        assert_eq!(state.messages()[1].content, STOPPED_PLACEHOLDER);
    }

    #[test]
    fn test_error_preserves_partial_and_notifies() {
        let mut state = active_state();
        let mut sink = RecordingSink::new();
        feed(
            &mut state,
            &mut sink,
            &[chunk("half an ans"), StreamEvent::Error("model crashed".to_string())],
        );

        assert_eq!(state.messages()[1].content, "half an ans");
        assert!(!state.is_streaming());
        assert_eq!(sink.notices(), vec!["model crashed"]);
    }

    #[test]
    fn test_error_without_chunks_adds_no_message() {
        let mut state = active_state();
        let mut sink = RecordingSink::new();
        feed(&mut state, &mut sink, &[StreamEvent::Error("offline".to_string())]);
        assert_eq!(state.messages().len(), 1);
    }

    #[test]
    fn test_new_thinking_clears_buffer() {
        let mut state = active_state();
        let mut sink = RecordingSink::new();
        feed(
            &mut state,
            &mut sink,
            &[StreamEvent::Thinking, thinking_chunk("first"), StreamEvent::Done],
        );
        assert_eq!(state.thinking_buffer(), "first");

        state.begin_turn(Message::new(Role::User, "again"));
        assert_eq!(state.thinking_buffer(), "first");
        dispatch(&mut state, &StreamEvent::Thinking, &mut sink);
        assert!(state.thinking_buffer().is_empty());
    }
}
