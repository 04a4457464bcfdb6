//! Cancellation Coordinator.
//!
//! Cancelling is cooperative: the coordinator sends a cancel frame on the
//! same connection as the turn and leaves the session alone. The turn only
//! ends when the server answers with a terminal event; chunks that arrive
//! in between are still applied.
//!
//! The server answers every cancel frame with one `cancelled`, and it
//! handles frames in order. A cancel that was overtaken by `done` or
//! `error` is therefore echoed after that terminal, before any frame of a
//! later turn. The coordinator counts those echoes and swallows them, and
//! it absorbs every frame of a turn the user walked away from with a new
//! chat until that turn's terminal arrives.

use super::state::SessionState;
use crate::actor::Transport;
use crate::error::ClientResult;
use crate::protocol::{OutboundFrame, StreamEvent};
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{debug, info};

/// Tracks cancel requests and the frames they still owe.
#[derive(Debug, Default)]
pub struct CancelCoordinator {
    /// When the first cancel of the current turn was sent.
    pending_since: Option<Instant>,
    /// Cancel frames sent during the current turn.
    turn_cancels: u32,
    /// Turns reset locally whose terminal has not arrived, oldest first.
    /// Each entry is the number of cancels sent for that turn.
    abandoned: VecDeque<u32>,
    /// `cancelled` echoes still expected for overtaken cancels.
    stray_echoes: u32,
}

impl CancelCoordinator {
    /// Create an idle coordinator.
    pub const fn new() -> Self {
        Self {
            pending_since: None,
            turn_cancels: 0,
            abandoned: VecDeque::new(),
            stray_echoes: 0,
        }
    }

    /// Ask the server to stop the current turn.
    ///
    /// Returns `Ok(false)` without sending anything when no turn is in
    /// flight.
    pub fn request<T: Transport + ?Sized>(
        &mut self,
        state: &SessionState,
        transport: &mut T,
    ) -> ClientResult<bool> {
        if !state.is_streaming() {
            debug!("Cancel requested with no turn in flight");
            return Ok(false);
        }

        transport.send(OutboundFrame::Cancel)?;
        self.turn_cancels += 1;
        if self.pending_since.is_none() {
            self.pending_since = Some(Instant::now());
        }
        info!("Cancel requested");
        Ok(true)
    }

    /// Whether the current turn has an unacknowledged cancel.
    pub const fn is_pending(&self) -> bool {
        self.turn_cancels > 0
    }

    /// Whether frames are still owed by earlier turns or cancels.
    pub fn is_draining(&self) -> bool {
        !self.abandoned.is_empty() || self.stray_echoes > 0
    }

    /// Decide whether an inbound event belongs to the current session.
    ///
    /// Returns `false` for frames of an abandoned turn and for late
    /// `cancelled` echoes; those never reach the interpreter.
    pub fn screen(&mut self, event: &StreamEvent) -> bool {
        if !self.abandoned.is_empty() {
            if event.is_terminal() {
                let cancels = self.abandoned.pop_front().unwrap_or_default();
                self.stray_echoes += owed_echoes(cancels, event);
                debug!("Abandoned turn closed by {}", event.kind());
            } else {
                debug!("Dropping {} from an abandoned turn", event.kind());
            }
            return false;
        }

        if self.stray_echoes == 0 {
            return true;
        }

        if *event == StreamEvent::Cancelled {
            self.stray_echoes -= 1;
            debug!("Swallowed late cancel acknowledgement");
            return false;
        }

        // Echoes always precede the next turn's frames; none are coming.
        debug!(
            "Server left {} cancels unacknowledged",
            self.stray_echoes
        );
        self.stray_echoes = 0;
        true
    }

    /// Reconcile the current turn's terminal event with its cancels.
    pub fn settle(&mut self, terminal: &StreamEvent) {
        let cancels = std::mem::take(&mut self.turn_cancels);
        let Some(since) = self.pending_since.take() else {
            return;
        };

        self.stray_echoes += owed_echoes(cancels, terminal);
        match terminal {
            StreamEvent::Cancelled => {
                info!("Cancel acknowledged after {:?}", since.elapsed());
            }
            other => {
                info!(
                    "Turn ended with {} before the cancel was acknowledged",
                    other.kind()
                );
            }
        }
    }

    /// The current turn was reset locally while still in flight.
    ///
    /// Its remaining frames will be absorbed by [`screen`](Self::screen).
    pub fn abandon_turn(&mut self) {
        self.pending_since = None;
        let cancels = std::mem::take(&mut self.turn_cancels);
        self.abandoned.push_back(cancels);
    }

    /// Forget everything; the server keeps no state across connections.
    pub fn reset_link(&mut self) {
        *self = Self::new();
    }
}

/// Echoes a turn still owes after its terminal: a `cancelled` terminal
/// answers one cancel itself.
fn owed_echoes(cancels: u32, terminal: &StreamEvent) -> u32 {
    match terminal {
        StreamEvent::Cancelled => cancels.saturating_sub(1),
        _ => cancels,
    }
}
