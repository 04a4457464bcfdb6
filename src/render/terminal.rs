//! Terminal Sink: renders the session to a line-oriented terminal.
//!
//! Finished messages and notices scroll by as ordinary output. The turn in
//! flight lives in a **live region** at the bottom: the thinking panel, the
//! assistant message and the working indicator. Every update erases the
//! region and draws it again from the full text, so the sink never has to
//! reason about token boundaries.
//!
//! ```text
//!  you › What is Rust?              ← committed
//!  ─────────────────────────────
//!  thinking (3s)                    ┐
//!  ┊ The user asks about ...        │ live region, redrawn in place
//!  assistant ›                      │
//!  Rust is a systems programming    ┘
//! ```
//!
//! The region never grows taller than the screen: rows that would push it
//! past the top are printed permanently and dropped from the region. When
//! the turn ends the region is left on screen as it is.

use super::output::{OutputBuffer, Row, Tone};
use super::sink::RenderSink;
use crate::protocol::ModelInfo;
use crate::session::{MessageId, Role};
use crossterm::style::Color;
use crossterm::terminal;
use std::io::{self, Stdout, Write};
use tracing::{debug, warn};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Width used when the terminal size is unknown.
const FALLBACK_SIZE: (u16, u16) = (80, 24);

/// Prefix of thinking rows.
const THINKING_GUTTER: &str = "┊ ";

/// The assistant message being streamed.
struct LiveMessage {
    id: MessageId,
    role: Role,
    content: String,
}

/// Everything drawn in the live region.
#[derive(Default)]
struct LiveTurn {
    working: bool,
    thinking: Option<String>,
    elapsed: Option<u64>,
    message: Option<LiveMessage>,
    /// The thinking panel was printed permanently to make room.
    panel_frozen: bool,
}

/// A [`RenderSink`] that draws to a terminal.
pub struct TerminalSink<W: Write> {
    /// Destination.
    out: W,
    /// Frame being assembled.
    frame: OutputBuffer,
    /// Fixed size, or `None` to query the terminal.
    size: Option<(u16, u16)>,
    /// Live region contents.
    turn: LiveTurn,
    /// Rows of the live region currently on screen.
    drawn_rows: usize,
    /// Message rows already printed permanently.
    committed_rows: usize,
}

impl TerminalSink<Stdout> {
    /// A sink writing to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalSink<W> {
    /// A sink that follows the terminal size.
    pub fn new(out: W) -> Self {
        Self {
            out,
            frame: OutputBuffer::new(),
            size: None,
            turn: LiveTurn::default(),
            drawn_rows: 0,
            committed_rows: 0,
        }
    }

    /// A sink with a fixed size.
    pub fn with_size(out: W, width: u16, height: u16) -> Self {
        Self {
            size: Some((width, height)),
            ..Self::new(out)
        }
    }

    /// Get a reference to the writer.
    pub const fn writer(&self) -> &W {
        &self.out
    }

    /// Consume the sink, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn dimensions(&self) -> (u16, u16) {
        let (width, height) = self
            .size
            .or_else(|| terminal::size().ok())
            .unwrap_or(FALLBACK_SIZE);
        (width.max(8), height.max(4))
    }

    /// Start a frame by erasing the live region.
    fn begin_frame(&mut self) {
        self.frame.clear();
        self.frame.erase_rows(self.drawn_rows);
        self.drawn_rows = 0;
    }

    /// Queue the live region, committing rows that no longer fit.
    fn queue_live(&mut self) {
        let (width, height) = self.dimensions();
        let width = usize::from(width);
        let max_live = usize::from(height.saturating_sub(2)).max(3);

        let mut panel = if self.turn.panel_frozen {
            Vec::new()
        } else {
            self.panel_rows(width)
        };
        let message = self.message_rows(width);
        let mut from = self.committed_rows.min(message.len());

        if !panel.is_empty() && panel.len() + message.len() - from > max_live {
            for row in panel.drain(..) {
                self.frame.row(&row);
            }
            self.turn.panel_frozen = true;
        }

        let overflow = (panel.len() + message.len() - from).saturating_sub(max_live);
        for row in &message[from..from + overflow] {
            self.frame.row(row);
        }
        from += overflow;
        self.committed_rows = from;

        for row in panel.iter().chain(&message[from..]) {
            self.frame.row(row);
        }
        self.drawn_rows = panel.len() + message.len() - from;
    }

    fn flush(&mut self) {
        if self.frame.is_empty() {
            return;
        }
        if let Err(e) = self.frame.flush_to(&mut self.out) {
            warn!("Failed to write to terminal: {}", e);
        }
        self.frame.clear();
    }

    /// Redraw the live region.
    fn refresh(&mut self) {
        self.begin_frame();
        self.queue_live();
        self.flush();
    }

    /// Print rows above the live region.
    fn print_above(&mut self, rows: &[Row]) {
        self.begin_frame();
        for row in rows {
            self.frame.row(row);
        }
        self.queue_live();
        self.flush();
    }

    fn panel_rows(&self, width: usize) -> Vec<Row> {
        let mut rows = Vec::new();
        if let Some(thinking) = &self.turn.thinking {
            let header = match self.turn.elapsed.filter(|_| self.turn.working) {
                Some(secs) => format!("thinking ({secs}s)"),
                None => "thinking".to_string(),
            };
            rows.push(Row::new(header, Tone::Muted));
            let inner = width.saturating_sub(THINKING_GUTTER.width()).max(1);
            rows.extend(
                wrap(thinking, inner)
                    .into_iter()
                    .map(|line| Row::new(format!("{THINKING_GUTTER}{line}"), Tone::Muted)),
            );
        } else if self.turn.working && self.turn.message.is_none() {
            rows.push(Row::new("working...", Tone::Muted));
        }
        rows
    }

    fn message_rows(&self, width: usize) -> Vec<Row> {
        let Some(message) = &self.turn.message else {
            return Vec::new();
        };
        let mut rows = vec![label(message.role)];
        rows.extend(
            wrap(&message.content, width)
                .into_iter()
                .map(|line| Row::new(line, Tone::Plain)),
        );
        rows
    }
}

impl<W: Write> RenderSink for TerminalSink<W> {
    fn display_message(&mut self, id: &MessageId, role: Role, content: &str) {
        if role == Role::Assistant {
            self.turn.message = Some(LiveMessage {
                id: id.clone(),
                role,
                content: content.to_string(),
            });
            self.committed_rows = 0;
            self.refresh();
            return;
        }

        let mut rows = vec![label(role)];
        rows.extend(content.lines().map(|line| Row::new(line, Tone::Plain)));
        self.print_above(&rows);
    }

    fn update_message_content(&mut self, id: &MessageId, content: &str) {
        match &mut self.turn.message {
            Some(message) if &message.id == id => {
                content.clone_into(&mut message.content);
            }
            _ => {
                debug!("Update for message {} outside the live region", id);
                return;
            }
        }
        self.refresh();
    }

    fn show_working_indicator(&mut self) {
        self.turn.working = true;
        self.refresh();
    }

    fn hide_working_indicator(&mut self) {
        self.turn.working = false;
        self.refresh();
    }

    fn show_thinking_panel(&mut self) {
        self.turn.thinking = Some(String::new());
        self.turn.elapsed = Some(0);
        self.refresh();
    }

    fn update_thinking_text(&mut self, text: &str) {
        self.turn.thinking = Some(text.to_string());
        self.refresh();
    }

    fn hide_thinking_panel(&mut self) {
        self.turn.thinking = None;
        self.refresh();
    }

    fn show_system_notice(&mut self, text: &str) {
        let rows: Vec<Row> = text
            .lines()
            .map(|line| Row::new(line, Tone::Warning))
            .collect();
        self.print_above(&rows);
    }

    fn update_thinking_elapsed(&mut self, secs: u64) {
        self.turn.elapsed = Some(secs);
        if self.turn.thinking.is_some() && !self.turn.panel_frozen {
            self.refresh();
        }
    }

    fn streaming_changed(&mut self, streaming: bool) {
        if streaming {
            return;
        }
        // The region stays on screen as the turn's final output.
        self.turn = LiveTurn::default();
        self.drawn_rows = 0;
        self.committed_rows = 0;
    }

    fn finish_render(&mut self) {
        if let Err(e) = self.out.flush() {
            warn!("Failed to flush terminal: {}", e);
        }
    }

    fn clear(&mut self) {
        self.turn = LiveTurn::default();
        self.drawn_rows = 0;
        self.committed_rows = 0;
        self.frame.clear();
        self.frame.clear_screen();
        self.frame.row(&Row::new("New chat.", Tone::Muted));
        self.flush();
    }

    fn model_selected(&mut self, model: &ModelInfo) {
        self.print_above(&[Row::new(format!("Model: {}", model.name), Tone::Muted)]);
    }
}

fn label(role: Role) -> Row {
    let (text, color) = match role {
        Role::User => ("you ›", Color::Cyan),
        Role::Assistant => ("assistant ›", Color::Green),
        Role::System => ("system ›", Color::Magenta),
    };
    Row::new(text, Tone::Accent(color))
}

/// Break `text` into rows no wider than `width` columns.
///
/// Explicit newlines always start a row; empty text gives no rows.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let width = width.max(1);
    let mut rows = Vec::new();
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let mut row = String::new();
        let mut used = 0;
        for ch in line.chars() {
            let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
            if used + ch_width > width && !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                used = 0;
            }
            row.push(ch);
            used += ch_width;
        }
        rows.push(row);
    }
    rows
}
