//! `OutputBuffer`: Single-syscall output buffer for terminal frames.

use crossterm::cursor::{MoveTo, MoveToPreviousLine};
use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use std::io::Write;

/// How a row is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Default colors.
    Plain,
    /// De-emphasized (thinking text, status).
    Muted,
    /// Bold and colored (role labels).
    Accent(Color),
    /// System notices.
    Warning,
}

/// One terminal row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Text, already fitted to the terminal width.
    pub text: String,
    /// Style.
    pub tone: Tone,
}

impl Row {
    /// A row with the given tone.
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

/// Pre-allocated buffer for building a frame.
///
/// All output is accumulated here, then flushed in a single `write()` syscall
/// to prevent terminal flickering.
pub struct OutputBuffer {
    data: Vec<u8>,
}

impl OutputBuffer {
    /// Create a new output buffer with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Create a buffer sized for a typical frame (4KB).
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    /// Clear the buffer for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Get the buffer contents.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Check if buffer is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Queuing into a Vec cannot fail, so command results are discarded below.

    /// Erase the `count` rows above the cursor and leave it at their start.
    pub fn erase_rows(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        let up = u16::try_from(count).unwrap_or(u16::MAX);
        let _ = queue!(
            self.data,
            MoveToPreviousLine(up),
            Clear(ClearType::FromCursorDown)
        );
    }

    /// Write one row and move to the start of the next.
    pub fn row(&mut self, row: &Row) {
        let _ = match row.tone {
            Tone::Plain => Ok(()),
            Tone::Muted => queue!(self.data, SetForegroundColor(Color::DarkGrey)),
            Tone::Accent(color) => queue!(
                self.data,
                SetAttribute(Attribute::Bold),
                SetForegroundColor(color)
            ),
            Tone::Warning => queue!(self.data, SetForegroundColor(Color::Yellow)),
        };
        let _ = queue!(self.data, Print(&row.text));
        if row.tone != Tone::Plain {
            let _ = queue!(self.data, SetAttribute(Attribute::Reset));
        }
        self.data.extend_from_slice(b"\r\n");
    }

    /// Clear the screen and home the cursor.
    pub fn clear_screen(&mut self) {
        let _ = queue!(self.data, Clear(ClearType::All), MoveTo(0, 0));
    }

    /// Flush to a writer in a single syscall.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn flush_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.data)?;
        writer.flush()
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}
