//! Client: wires the actors to the session controller.
//!
//! The client owns the event channel. The connection, input and ticker
//! actors post into it; the loop hands each event to the controller on the
//! calling thread.

use super::connection::ConnectionActor;
use super::input::InputActor;
use super::messages::ClientEvent;
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::render::RenderSink;
use crate::session::SessionController;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::io::BufRead;
use std::time::Duration;
use tracing::{debug, info};

/// Capacity of the event channel.
const EVENT_QUEUE_CAPACITY: usize = 256;

/// How long the loop waits for an event before checking its state again.
const IDLE_WAIT: Duration = Duration::from_millis(100);

/// A running chat client.
pub struct ChatClient<S: RenderSink> {
    /// Session controller, owning the connection actor.
    controller: SessionController<ConnectionActor, S>,
    /// Sender cloned into every actor.
    events: Sender<ClientEvent>,
    /// Receiving end of the event loop.
    receiver: Receiver<ClientEvent>,
    /// Input actor, once attached.
    input: Option<InputActor>,
}

impl<S: RenderSink> ChatClient<S> {
    /// Validate the configuration and start connecting.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &ClientConfig, sink: S) -> ClientResult<Self> {
        config.validate()?;
        let url = config.ws_url()?;

        let (events, receiver) = bounded::<ClientEvent>(EVENT_QUEUE_CAPACITY);
        info!("Connecting to {}", url);
        let connection = ConnectionActor::spawn(
            url,
            config.reconnect.clone(),
            config.read_poll_interval(),
            config.connect_timeout(),
            events.clone(),
        );
        let controller =
            SessionController::new(config, connection, sink).with_event_sender(events.clone());

        Ok(Self {
            controller,
            events,
            receiver,
            input: None,
        })
    }

    /// The session controller.
    pub const fn controller(&self) -> &SessionController<ConnectionActor, S> {
        &self.controller
    }

    /// The session controller, mutably.
    pub fn controller_mut(&mut self) -> &mut SessionController<ConnectionActor, S> {
        &mut self.controller
    }

    /// A sender for injecting events into the loop.
    pub fn events(&self) -> Sender<ClientEvent> {
        self.events.clone()
    }

    /// Read commands from standard input.
    pub fn attach_stdin(&mut self) {
        self.input = Some(InputActor::spawn_stdin(self.events.clone()));
    }

    /// Read commands from any line source.
    pub fn attach_input<R: BufRead + Send + 'static>(&mut self, reader: R) {
        self.input = Some(InputActor::spawn(reader, self.events.clone()));
    }

    /// Handle at most one event, waiting up to `timeout` for it.
    ///
    /// Returns `false` once the controller has stopped.
    pub fn step(&mut self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => self.controller.handle(event),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                debug!("Event channel closed");
                self.controller.shutdown();
            }
        }
        self.controller.is_running()
    }

    /// Run until the user quits or input ends, then shut down.
    ///
    /// Returns the sink.
    pub fn run(mut self) -> S {
        while self.step(IDLE_WAIT) {}
        self.finish()
    }

    /// Stop every actor and return the sink.
    pub fn finish(self) -> S {
        let Self {
            controller,
            events,
            receiver,
            input,
        } = self;

        let (connection, sink) = controller.into_parts();
        // Unblock actors waiting on a full queue before joining them.
        drop(receiver);
        drop(events);
        connection.join();

        // Standard input cannot be interrupted; only reap a finished reader.
        if let Some(input) = input.filter(InputActor::is_finished) {
            input.join();
        }

        info!("Client stopped");
        sink
    }
}
