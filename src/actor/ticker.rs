//! Ticker Actor: Dedicated thread driving the thinking clock.
//!
//! The ticker posts a [`Tick`] into the event loop at a fixed interval.
//! Each ticker is stamped with a generation so ticks still queued after the
//! ticker stops can be recognized as stale.

use super::messages::{ClientEvent, Tick};
use crossbeam_channel::{Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Ticker actor that generates regular timing events.
pub struct TickerActor {
    /// Handle to the ticker thread.
    handle: Option<JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
    /// Generation stamped on every tick.
    generation: u64,
}

impl TickerActor {
    /// Spawn a new ticker actor with the given interval.
    ///
    /// # Arguments
    ///
    /// * `interval` - Time between ticks (1 second for the thinking clock).
    /// * `generation` - Stamp carried by every tick.
    /// * `events` - Event loop channel.
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to spawn the ticker thread.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn(interval: Duration, generation: u64, events: Sender<ClientEvent>) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::Builder::new()
            .name("chatwheel-ticker".to_string())
            .spawn(move || {
                Self::run_loop(&events, &shutdown_clone, interval, generation);
            })
            .expect("Failed to spawn ticker thread");

        Self {
            handle: Some(handle),
            shutdown,
            generation,
        }
    }

    /// Generation stamped on this ticker's ticks.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Signal the ticker to shutdown.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Stop the ticker and wait for its thread to finish.
    ///
    /// No tick is sent after this returns.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Main ticker loop.
    fn run_loop(events: &Sender<ClientEvent>, shutdown: &AtomicBool, interval: Duration, generation: u64) {
        let start = Instant::now();
        let mut count = 0u64;
        let mut next_tick = start + interval;

        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            let now = Instant::now();
            if now >= next_tick {
                let tick = Tick {
                    generation,
                    count,
                    elapsed: now - start,
                };

                // Skip the tick if the loop is backed up; the next one
                // carries the up-to-date elapsed time anyway.
                if let Err(TrySendError::Disconnected(_)) = events.try_send(ClientEvent::Tick(tick)) {
                    break;
                }

                count += 1;
                next_tick += interval;

                // Handle case where we're behind (catch up without queuing)
                if next_tick < now {
                    next_tick = now + interval;
                }
            } else {
                // Sleep in short slices so shutdown stays responsive
                let sleep_duration = next_tick - now;
                thread::sleep(sleep_duration.min(Duration::from_millis(5)));
            }
        }
    }
}

impl Drop for TickerActor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
