//! Thinking clock: elapsed-time feedback while the backend thinks.
//!
//! The clock owns at most one [`TickerActor`]. Starting the clock bumps its
//! generation; ticks carrying any other generation are stale and dropped.

use crate::actor::{ClientEvent, Tick, TickerActor};
use crossbeam_channel::Sender;
use std::time::Duration;
use tracing::debug;

/// Elapsed-time tracker for the thinking phase.
pub struct ThinkingClock {
    /// Tick interval.
    interval: Duration,
    /// Generation of the most recent start.
    generation: u64,
    /// Whether the clock is running.
    running: bool,
    /// Live ticker, when an event loop is attached.
    ticker: Option<TickerActor>,
}

impl ThinkingClock {
    /// Create a stopped clock.
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            generation: 0,
            running: false,
            ticker: None,
        }
    }

    /// Start or restart the clock.
    ///
    /// Without an event channel the clock still tracks its generation but
    /// spawns no ticker.
    pub fn start(&mut self, events: Option<&Sender<ClientEvent>>) -> u64 {
        self.stop();
        self.generation += 1;
        self.running = true;
        if let Some(events) = events {
            self.ticker = Some(TickerActor::spawn(self.interval, self.generation, events.clone()));
        }
        debug!("Thinking clock started (generation {})", self.generation);
        self.generation
    }

    /// Stop the clock and join its ticker.
    ///
    /// Once this returns no further tick for the stopped generation is
    /// produced.
    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.join();
        }
        if self.running {
            debug!("Thinking clock stopped (generation {})", self.generation);
        }
        self.running = false;
    }

    /// Whether the clock is running.
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Whether a ticker thread is alive.
    pub const fn has_ticker(&self) -> bool {
        self.ticker.is_some()
    }

    /// Generation of the most recent start.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Elapsed whole seconds for a tick from the running clock.
    ///
    /// Stale ticks return `None`.
    pub fn accept(&self, tick: &Tick) -> Option<u64> {
        (self.running && tick.generation == self.generation).then(|| tick.elapsed.as_secs())
    }
}

impl Drop for ThinkingClock {
    fn drop(&mut self) {
        self.stop();
    }
}
