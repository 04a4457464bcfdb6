//! Session Controller: single dispatch point for every client event.
//!
//! The controller owns the session state, the transport handle, the render
//! sink, the model selection, the thinking clock and the cancel
//! coordinator. It runs on one thread and handles each [`ClientEvent`] to
//! completion before the next one, so nothing else ever mutates the session.

use super::cancel::CancelCoordinator;
use super::interpreter::{dispatch, ClockDirective, Transition};
use super::message::{Message, Role};
use super::state::SessionState;
use super::timing::ThinkingClock;
use crate::actor::{ClientEvent, ConnectionStatus, Tick, Transport, UserCommand, COMMAND_HELP};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::protocol::{ChatRequest, ModelCatalog, ModelInfo, OutboundFrame, StreamEvent};
use crate::render::RenderSink;
use crossbeam_channel::Sender;
use std::fmt::Write as _;
use std::iter;
use tracing::{debug, info, warn};

/// Notice text closing a turn orphaned by a lost connection.
pub const ABANDONED_NOTICE: &str = "Connection lost; the response was abandoned.";

/// Drives one chat session.
pub struct SessionController<T: Transport, S: RenderSink> {
    /// Conversation state.
    state: SessionState,
    /// Outbound link to the server.
    transport: T,
    /// Presentation layer.
    sink: S,
    /// Models offered by the server.
    catalog: ModelCatalog,
    /// Model used for the next request.
    current_model: Option<ModelInfo>,
    /// Thinking-elapsed clock.
    clock: ThinkingClock,
    /// Outstanding cancel request.
    cancel: CancelCoordinator,
    /// Event loop channel handed to the ticker.
    events: Option<Sender<ClientEvent>>,
    /// Close the turn locally when the connection drops.
    abandon_on_disconnect: bool,
    /// Set once the first connection was lost.
    link_dropped: bool,
    /// Cleared by quit or shutdown.
    running: bool,
}

impl<T: Transport, S: RenderSink> SessionController<T, S> {
    /// Create a controller with no catalog and no ticker channel.
    pub fn new(config: &ClientConfig, transport: T, sink: S) -> Self {
        Self {
            state: SessionState::new(config.system_prompt.trim()),
            transport,
            sink,
            catalog: ModelCatalog::default(),
            current_model: None,
            clock: ThinkingClock::new(config.thinking_tick_interval()),
            cancel: CancelCoordinator::new(),
            events: None,
            abandon_on_disconnect: config.abandon_on_disconnect,
            link_dropped: false,
            running: true,
        }
    }

    /// Attach the event loop channel so the thinking clock can tick.
    #[must_use]
    pub fn with_event_sender(mut self, events: Sender<ClientEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// The session state.
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// The render sink.
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// The render sink, mutably.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// The transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// The transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The selected model.
    pub const fn current_model(&self) -> Option<&ModelInfo> {
        self.current_model.as_ref()
    }

    /// The model catalog.
    pub const fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// The thinking clock.
    pub const fn clock(&self) -> &ThinkingClock {
        &self.clock
    }

    /// Whether a cancel is waiting for its terminal event.
    pub const fn cancel_pending(&self) -> bool {
        self.cancel.is_pending()
    }

    /// Whether the controller still accepts events.
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Install the model catalog and preselect a model.
    ///
    /// A `preferred` id found in the catalog wins; otherwise the catalog's
    /// default is used.
    pub fn load_catalog(&mut self, catalog: ModelCatalog, preferred: Option<&str>) {
        self.catalog = catalog;

        if self.catalog.is_empty() {
            warn!("Model catalog is empty");
            self.sink.show_system_notice("The server offers no models.");
            return;
        }

        let preferred_model = preferred.and_then(|id| {
            let found = self.catalog.find(id).cloned();
            if found.is_none() {
                warn!("Preferred model {} is not in the catalog", id);
                self.sink
                    .show_system_notice(&format!("Model {id} is not available; using the default."));
            }
            found
        });

        match preferred_model.or_else(|| self.catalog.default_model().cloned()) {
            Some(model) => {
                info!("Selected model {}", model.id);
                self.sink.model_selected(&model);
                self.current_model = Some(model);
            }
            None => {
                warn!(
                    "Default model {:?} is not in the catalog",
                    self.catalog.default_id()
                );
            }
        }
    }

    /// Report that the catalog could not be loaded.
    pub fn catalog_unavailable(&mut self, err: &ClientError) {
        warn!("Failed to load models: {}", err);
        self.sink
            .show_system_notice(&format!("Could not load the model list: {err}"));
    }

    /// Select the model for the next request.
    pub fn select_model(&mut self, id: &str) -> ClientResult<&ModelInfo> {
        let model = self
            .catalog
            .find(id)
            .cloned()
            .ok_or_else(|| ClientError::UnknownModel(id.to_string()))?;

        info!("Selected model {}", model.id);
        self.sink.model_selected(&model);
        Ok(&*self.current_model.insert(model))
    }

    /// Replace the system prompt used by later requests.
    pub fn set_system_prompt(&mut self, prompt: &str) {
        self.state.set_system_prompt(prompt);
        debug!("System prompt set ({} bytes)", self.state.system_prompt().len());
    }

    /// Send a user message and open a turn.
    ///
    /// Preconditions are checked before anything is sent. Missing model and
    /// missing connection are reported to the sink; blank input and a turn
    /// in progress are rejected silently. The session only changes once the
    /// request is on its way.
    pub fn submit(&mut self, input: &str) -> ClientResult<()> {
        let text = input.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyInput);
        }
        if self.state.is_streaming() {
            return Err(ClientError::TurnInProgress);
        }
        let Some(model) = self.current_model.as_ref() else {
            self.sink.show_system_notice("Please select a model first.");
            return Err(ClientError::NoModelSelected);
        };
        if !self.transport.is_connected() {
            self.sink
                .show_system_notice("Not connected to the server. Please wait...");
            return Err(ClientError::NotConnected);
        }

        let message = Message::new(Role::User, text);
        let request = ChatRequest::from_history(
            &model.id,
            self.state.messages().iter().chain(iter::once(&message)),
            self.state.system_prompt(),
        );

        if let Err(e) = self.transport.send(OutboundFrame::Chat(request)) {
            warn!("Failed to send chat request: {}", e);
            self.sink
                .show_system_notice(&format!("Failed to send the message: {e}"));
            return Err(e);
        }

        let message = self.state.begin_turn(message);
        debug!("Turn opened with {}", message.id);
        self.sink
            .display_message(&message.id, message.role, &message.content);
        self.sink.streaming_changed(true);
        Ok(())
    }

    /// Ask the server to stop the current turn.
    ///
    /// Returns `Ok(false)` when no turn is in flight.
    pub fn request_cancel(&mut self) -> ClientResult<bool> {
        self.cancel.request(&self.state, &mut self.transport)
    }

    /// Forget the conversation and start over.
    ///
    /// A turn still in flight is cancelled and abandoned: its remaining
    /// frames and the cancel echo are absorbed until its terminal arrives,
    /// so they never reach a later turn.
    pub fn new_chat(&mut self) {
        if self.state.is_streaming() {
            if let Err(e) = self.cancel.request(&self.state, &mut self.transport) {
                debug!("Cancel on new chat not sent: {}", e);
            }
            self.cancel.abandon_turn();
        }

        self.clock.stop();
        self.state.reset();

        self.sink.hide_working_indicator();
        self.sink.hide_thinking_panel();
        self.sink.clear();
        self.sink.streaming_changed(false);
        info!("Started a new chat");
    }

    /// Handle one event from the loop.
    pub fn handle(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Stream(event) => self.apply_stream(&event),
            ClientEvent::Malformed { raw, reason } => {
                warn!("Dropping malformed frame ({}): {}", reason, raw);
            }
            ClientEvent::Connection(status) => self.on_connection(status),
            ClientEvent::Tick(tick) => self.on_tick(&tick),
            ClientEvent::Command(command) => self.on_command(command),
            ClientEvent::Shutdown => {
                debug!("Shutdown requested");
                self.shutdown();
            }
        }
    }

    /// Stop the clock and refuse further events.
    pub fn shutdown(&mut self) {
        self.clock.stop();
        self.running = false;
    }

    /// Stop the clock and hand back the transport and the sink.
    pub fn into_parts(mut self) -> (T, S) {
        self.shutdown();
        (self.transport, self.sink)
    }

    /// Run a stream event through the interpreter and apply its directive.
    fn apply_stream(&mut self, event: &StreamEvent) {
        if !self.cancel.screen(event) {
            return;
        }

        let transition = dispatch(&mut self.state, event, &mut self.sink);
        if transition == Transition::Ignored {
            return;
        }

        match transition.clock() {
            ClockDirective::Start => {
                self.clock.start(self.events.as_ref());
                self.sink.update_thinking_elapsed(0);
            }
            ClockDirective::Stop => self.clock.stop(),
            ClockDirective::Keep => {}
        }

        if event.is_terminal() {
            self.cancel.settle(event);
        }
    }

    fn on_tick(&mut self, tick: &Tick) {
        let Some(secs) = self.clock.accept(tick) else {
            debug!("Dropping stale tick (generation {})", tick.generation);
            return;
        };
        if self.state.is_streaming() {
            self.state.set_thinking_elapsed(secs);
            self.sink.update_thinking_elapsed(secs);
        }
    }

    fn on_connection(&mut self, status: ConnectionStatus) {
        match status {
            ConnectionStatus::Connected => {
                info!("Connection established");
                if self.link_dropped {
                    self.sink.show_system_notice("Reconnected to the server.");
                }
            }
            ConnectionStatus::Lost { reason } => {
                self.link_dropped = true;
                self.cancel.reset_link();
                self.sink
                    .show_system_notice(&format!("Connection to the server lost: {reason}"));
                if self.state.is_streaming() && self.abandon_on_disconnect {
                    warn!("Abandoning the turn in flight");
                    self.apply_stream(&StreamEvent::Error(ABANDONED_NOTICE.to_string()));
                }
            }
            ConnectionStatus::Reconnecting { attempt, delay } => {
                debug!("Reconnect attempt {} in {:?}", attempt, delay);
            }
            ConnectionStatus::GaveUp { attempts } => {
                self.sink.show_system_notice(&format!(
                    "Could not reach the server after {attempts} attempts. Restart to try again."
                ));
            }
        }
    }

    fn on_command(&mut self, command: UserCommand) {
        match command {
            UserCommand::Submit(text) => match self.submit(&text) {
                Ok(()) => {}
                Err(ClientError::TurnInProgress) => {
                    self.sink
                        .show_system_notice("A response is in progress. Use /stop to end it.");
                }
                Err(e) => debug!("Submit rejected: {}", e),
            },
            UserCommand::Cancel => match self.request_cancel() {
                Ok(true) => {}
                Ok(false) => self.sink.show_system_notice("Nothing to stop."),
                Err(e) => self
                    .sink
                    .show_system_notice(&format!("Could not stop the response: {e}")),
            },
            UserCommand::NewChat => self.new_chat(),
            UserCommand::ListModels => {
                let listing = self.model_listing();
                self.sink.show_system_notice(&listing);
            }
            UserCommand::SelectModel(id) => {
                if let Err(e) = self.select_model(&id) {
                    self.sink.show_system_notice(&e.to_string());
                }
            }
            UserCommand::ShowSystemPrompt => {
                let notice = match self.state.system_prompt() {
                    "" => "No system prompt is set.".to_string(),
                    prompt => format!("System prompt: {prompt}"),
                };
                self.sink.show_system_notice(&notice);
            }
            UserCommand::SetSystemPrompt(prompt) => {
                self.set_system_prompt(&prompt);
                let notice = if self.state.system_prompt().is_empty() {
                    "System prompt cleared."
                } else {
                    "System prompt updated."
                };
                self.sink.show_system_notice(notice);
            }
            UserCommand::Help => self.sink.show_system_notice(COMMAND_HELP),
            UserCommand::Unknown(name) => {
                self.sink
                    .show_system_notice(&format!("Unknown command /{name}. Type /help for a list."));
            }
            UserCommand::Quit => {
                info!("Quit requested");
                self.shutdown();
            }
        }
    }

    /// One line per model, the selected one marked.
    fn model_listing(&self) -> String {
        if self.catalog.is_empty() {
            return "No models available.".to_string();
        }

        let selected = self.current_model.as_ref().map(|model| model.id.as_str());
        let mut listing = String::from("Models:");
        for model in &self.catalog.models {
            let marker = if Some(model.id.as_str()) == selected { '*' } else { ' ' };
            let _ = write!(listing, "\n{marker} {} ({})", model.id, model.name);
        }
        listing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RecordingSink, RenderCall};
    use crossbeam_channel::unbounded;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeTransport {
        connected: bool,
        fail_sends: bool,
        sent: Vec<OutboundFrame>,
    }

    impl FakeTransport {
        fn connected() -> Self {
            Self {
                connected: true,
                ..Self::default()
            }
        }

        fn requests(&self) -> Vec<&ChatRequest> {
            self.sent
                .iter()
                .filter_map(|frame| match frame {
                    OutboundFrame::Chat(request) => Some(request),
                    OutboundFrame::Cancel => None,
                })
                .collect()
        }

        fn cancels(&self) -> usize {
            self.sent
                .iter()
                .filter(|frame| **frame == OutboundFrame::Cancel)
                .count()
        }
    }

    impl Transport for FakeTransport {
        fn is_connected(&self) -> bool {
            self.connected
        }

        fn send(&mut self, frame: OutboundFrame) -> ClientResult<()> {
            if !self.connected {
                return Err(ClientError::NotConnected);
            }
            if self.fail_sends {
                return Err(ClientError::Transport("socket closed".to_string()));
            }
            self.sent.push(frame);
            Ok(())
        }
    }

    type TestController = SessionController<FakeTransport, RecordingSink>;

    fn catalog() -> ModelCatalog {
        ModelCatalog::from_json(
            r#"{"models":[{"id":"llama3","name":"Llama 3"},{"id":"qwen","name":"Qwen"}],"default":"qwen"}"#,
        )
        .unwrap()
    }

    fn controller() -> TestController {
        let mut controller = SessionController::new(
            &ClientConfig::default(),
            FakeTransport::connected(),
            RecordingSink::new(),
        );
        controller.load_catalog(catalog(), None);
        controller
    }

    fn stream(controller: &mut TestController, events: Vec<StreamEvent>) {
        for event in events {
            controller.handle(ClientEvent::Stream(event));
        }
    }

    fn chunk(text: &str) -> StreamEvent {
        StreamEvent::Chunk(text.to_string())
    }

    fn thinking_chunk(text: &str) -> StreamEvent {
        StreamEvent::ThinkingChunk(text.to_string())
    }

    #[test]
    fn test_thinking_then_answer() {
        let mut controller = controller();
        controller.submit("Hello").unwrap();
        stream(
            &mut controller,
            vec![
                StreamEvent::Thinking,
                thinking_chunk("Let me "),
                thinking_chunk("think."),
                chunk("Hi"),
                chunk(" there"),
                StreamEvent::Done,
            ],
        );

        let state = controller.state();
        assert_eq!(state.thinking_buffer(), "Let me think.");
        assert_eq!(state.messages().len(), 2);
        assert_eq!(state.messages()[1].content, "Hi there");
        assert!(!state.is_streaming());
        assert!(!controller.clock().is_running());
    }

    #[test]
    fn test_submit_without_model() {
        let mut controller = SessionController::new(
            &ClientConfig::default(),
            FakeTransport::connected(),
            RecordingSink::new(),
        );

        let result = controller.submit("Hello");
        assert!(matches!(result, Err(ClientError::NoModelSelected)));
        assert!(controller.transport().sent.is_empty());
        assert_eq!(controller.sink().notices().len(), 1);
        assert!(!controller.state().is_streaming());
        assert!(controller.state().messages().is_empty());
    }

    #[test]
    fn test_cancel_keeps_delivered_chunks() {
        let mut controller = controller();
        controller.submit("Write a poem").unwrap();
        stream(&mut controller, vec![chunk("A")]);

        assert!(controller.request_cancel().unwrap());
        assert!(controller.state().is_streaming());
        stream(&mut controller, vec![chunk("B"), StreamEvent::Cancelled]);

        assert_eq!(controller.state().messages()[1].content, "AB");
        assert!(!controller.state().is_streaming());
        assert!(!controller.cancel_pending());
        assert_eq!(controller.transport().cancels(), 1);
    }

    #[test]
    fn test_new_chat_mid_stream_stops_ticks() {
        let (tx, rx) = unbounded();
        let config = ClientConfig {
            thinking_tick_ms: 5,
            ..ClientConfig::default()
        };
        let mut controller =
            SessionController::new(&config, FakeTransport::connected(), RecordingSink::new())
                .with_event_sender(tx);
        controller.load_catalog(catalog(), None);

        controller.submit("Hello").unwrap();
        stream(&mut controller, vec![StreamEvent::Thinking, chunk("partial")]);
        assert!(controller.clock().has_ticker());

        match rx.recv_timeout(Duration::from_secs(2)) {
            Ok(event @ ClientEvent::Tick(_)) => controller.handle(event),
            other => panic!("expected tick, got {other:?}"),
        }

        controller.new_chat();
        assert!(controller.state().messages().is_empty());
        assert!(!controller.state().is_streaming());
        assert!(!controller.clock().has_ticker());
        assert_eq!(controller.transport().cancels(), 1);

        // Ticks queued before the reset are stale; none arrive after it.
        let queued: Vec<_> = rx.try_iter().collect();
        controller.sink_mut().take();
        for event in queued {
            controller.handle(event);
        }
        std::thread::sleep(Duration::from_millis(30));
        assert!(rx.try_recv().is_err());
        assert!(controller.sink().calls().is_empty());
        assert!(controller.state().thinking_elapsed_secs().is_none());
    }

    fn contents(controller: &TestController) -> Vec<&str> {
        controller
            .state()
            .messages()
            .iter()
            .map(|message| message.content.as_str())
            .collect()
    }

    #[test]
    fn test_new_chat_absorbs_abandoned_turn() {
        let mut controller = controller();
        controller.submit("old question").unwrap();
        stream(&mut controller, vec![chunk("old ")]);

        controller.new_chat();
        controller.submit("new question").unwrap();
        stream(
            &mut controller,
            vec![
                chunk("tail"),
                StreamEvent::Done,
                StreamEvent::Cancelled,
                StreamEvent::Thinking,
                chunk("new answer"),
                StreamEvent::Done,
            ],
        );

        assert_eq!(contents(&controller), vec!["new question", "new answer"]);
        assert!(!controller.state().is_streaming());
        assert_eq!(controller.transport().cancels(), 1);
    }

    #[test]
    fn test_overtaken_cancel_echo_is_swallowed() {
        let mut controller = controller();
        controller.submit("q1").unwrap();
        stream(&mut controller, vec![chunk("a1")]);
        assert!(controller.request_cancel().unwrap());
        stream(&mut controller, vec![StreamEvent::Done]);
        assert!(!controller.cancel_pending());

        controller.submit("q2").unwrap();
        stream(
            &mut controller,
            vec![
                StreamEvent::Cancelled,
                StreamEvent::Thinking,
                chunk("a2"),
                StreamEvent::Done,
            ],
        );

        assert_eq!(contents(&controller), vec!["q1", "a1", "q2", "a2"]);
        assert!(!controller.state().is_streaming());
    }

    #[test]
    fn test_disconnect_forgets_abandoned_turn() {
        let mut controller = controller();
        controller.submit("old").unwrap();
        controller.new_chat();
        controller.handle(ClientEvent::Connection(ConnectionStatus::Lost {
            reason: "reset".to_string(),
        }));
        controller.handle(ClientEvent::Connection(ConnectionStatus::Connected));

        controller.submit("fresh").unwrap();
        stream(&mut controller, vec![chunk("reply"), StreamEvent::Done]);
        assert_eq!(contents(&controller), vec!["fresh", "reply"]);
    }

    #[test]
    fn test_streaming_flag_lifecycle() {
        let mut controller = controller();
        assert!(!controller.state().is_streaming());

        controller.submit("one").unwrap();
        assert!(controller.state().is_streaming());
        assert!(matches!(
            controller.submit("two"),
            Err(ClientError::TurnInProgress)
        ));
        assert_eq!(controller.transport().requests().len(), 1);

        stream(&mut controller, vec![chunk("ok"), StreamEvent::Done]);
        assert!(!controller.state().is_streaming());
        assert!(controller.state().active_message_id().is_none());

        let streaming: Vec<_> = controller
            .sink()
            .calls()
            .iter()
            .filter(|call| matches!(call, RenderCall::Streaming(_)))
            .cloned()
            .collect();
        assert_eq!(
            streaming,
            vec![RenderCall::Streaming(true), RenderCall::Streaming(false)]
        );
    }

    #[test]
    fn test_empty_input_is_silent() {
        let mut controller = controller();
        controller.sink_mut().take();
        assert!(matches!(controller.submit("  \n "), Err(ClientError::EmptyInput)));
        assert!(controller.sink().calls().is_empty());
        assert!(controller.transport().sent.is_empty());
    }

    #[test]
    fn test_not_connected_rejected_before_send() {
        let mut controller = controller();
        controller.transport_mut().connected = false;

        assert!(matches!(controller.submit("Hello"), Err(ClientError::NotConnected)));
        assert!(controller.state().messages().is_empty());
        assert_eq!(controller.sink().notices().len(), 1);
    }

    #[test]
    fn test_failed_send_leaves_state_untouched() {
        let mut controller = controller();
        controller.transport_mut().fail_sends = true;

        assert!(matches!(controller.submit("Hello"), Err(ClientError::Transport(_))));
        assert!(controller.state().messages().is_empty());
        assert!(!controller.state().is_streaming());
    }

    #[test]
    fn test_request_carries_history_and_prompt() {
        let mut controller = controller();
        controller.set_system_prompt("  Be brief. ");
        controller.submit("first").unwrap();
        stream(&mut controller, vec![chunk("reply"), StreamEvent::Done]);
        controller.submit("second").unwrap();

        let requests = controller.transport().requests();
        assert_eq!(requests.len(), 2);
        let last = requests[1];
        assert_eq!(last.model, "qwen");
        assert_eq!(last.system_prompt, "Be brief.");
        let contents: Vec<_> = last.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "reply", "second"]);
        assert_eq!(last.messages[1].role, Role::Assistant);
    }

    #[test]
    fn test_disconnect_abandons_turn() {
        let mut controller = controller();
        controller.submit("Hello").unwrap();
        stream(&mut controller, vec![StreamEvent::Thinking, chunk("par")]);

        controller.handle(ClientEvent::Connection(ConnectionStatus::Lost {
            reason: "reset by peer".to_string(),
        }));

        assert!(!controller.state().is_streaming());
        assert_eq!(controller.state().messages()[1].content, "par");
        assert!(!controller.clock().is_running());
        assert!(controller.sink().notices().contains(&ABANDONED_NOTICE));

        // A late frame from the old connection changes nothing.
        stream(&mut controller, vec![chunk("tial")]);
        assert_eq!(controller.state().messages()[1].content, "par");
    }

    #[test]
    fn test_disconnect_can_leave_turn_open() {
        let config = ClientConfig {
            abandon_on_disconnect: false,
            ..ClientConfig::default()
        };
        let mut controller =
            SessionController::new(&config, FakeTransport::connected(), RecordingSink::new());
        controller.load_catalog(catalog(), None);
        controller.submit("Hello").unwrap();

        controller.handle(ClientEvent::Connection(ConnectionStatus::Lost {
            reason: "reset".to_string(),
        }));
        assert!(controller.state().is_streaming());
    }

    #[test]
    fn test_catalog_default_and_preference() {
        let controller = controller();
        assert_eq!(controller.current_model().unwrap().id, "qwen");
        assert_eq!(
            controller.sink().calls(),
            &[RenderCall::ModelSelected("qwen".to_string())]
        );

        let mut preferred =
            SessionController::new(&ClientConfig::default(), FakeTransport::connected(), RecordingSink::new());
        preferred.load_catalog(catalog(), Some("llama3"));
        assert_eq!(preferred.current_model().unwrap().id, "llama3");

        let mut missing =
            SessionController::new(&ClientConfig::default(), FakeTransport::connected(), RecordingSink::new());
        missing.load_catalog(catalog(), Some("gpt"));
        assert_eq!(missing.current_model().unwrap().id, "qwen");
        assert_eq!(missing.sink().notices().len(), 1);
    }

    #[test]
    fn test_unlisted_default_selects_nothing() {
        let mut controller =
            SessionController::new(&ClientConfig::default(), FakeTransport::connected(), RecordingSink::new());
        controller.load_catalog(
            ModelCatalog::from_json(r#"{"models":[{"id":"a","name":"A"}],"default":"z"}"#).unwrap(),
            None,
        );
        assert!(controller.current_model().is_none());
    }

    #[test]
    fn test_select_model() {
        let mut controller = controller();
        assert_eq!(controller.select_model("llama3").unwrap().name, "Llama 3");
        assert!(matches!(
            controller.select_model("nope"),
            Err(ClientError::UnknownModel(_))
        ));
        assert_eq!(controller.current_model().unwrap().id, "llama3");

        controller.handle(ClientEvent::Command(UserCommand::ListModels));
        let notices = controller.sink().notices();
        let listing = notices.last().unwrap();
        assert!(listing.contains("* llama3 (Llama 3)"));
        assert!(listing.contains("  qwen (Qwen)"));
    }

    #[test]
    fn test_stale_tick_ignored() {
        let mut controller = controller();
        controller.submit("Hello").unwrap();
        stream(&mut controller, vec![StreamEvent::Thinking]);
        let generation = controller.clock().generation();

        controller.handle(ClientEvent::Tick(Tick {
            generation,
            count: 3,
            elapsed: Duration::from_secs(3),
        }));
        assert_eq!(controller.state().thinking_elapsed_secs(), Some(3));

        controller.handle(ClientEvent::Tick(Tick {
            generation: generation - 1,
            count: 9,
            elapsed: Duration::from_secs(9),
        }));
        assert_eq!(controller.state().thinking_elapsed_secs(), Some(3));

        stream(&mut controller, vec![StreamEvent::Done]);
        controller.handle(ClientEvent::Tick(Tick {
            generation,
            count: 4,
            elapsed: Duration::from_secs(4),
        }));
        assert!(controller.state().thinking_elapsed_secs().is_none());
    }

    #[test]
    fn test_quit_and_shutdown_stop_running() {
        let mut controller = controller();
        controller.handle(ClientEvent::Command(UserCommand::Quit));
        assert!(!controller.is_running());

        let mut controller = self::controller();
        controller.handle(ClientEvent::Shutdown);
        assert!(!controller.is_running());
    }

    #[test]
    fn test_system_prompt_commands() {
        let mut controller = controller();
        controller.handle(ClientEvent::Command(UserCommand::SetSystemPrompt(
            "Answer in French.".to_string(),
        )));
        assert_eq!(controller.state().system_prompt(), "Answer in French.");

        controller.handle(ClientEvent::Command(UserCommand::ShowSystemPrompt));
        assert_eq!(
            controller.sink().notices().last(),
            Some(&"System prompt: Answer in French.")
        );

        controller.handle(ClientEvent::Command(UserCommand::SetSystemPrompt(String::new())));
        assert!(controller.state().system_prompt().is_empty());
    }

    #[test]
    fn test_malformed_frame_changes_nothing() {
        let mut controller = controller();
        controller.submit("Hello").unwrap();
        controller.sink_mut().take();

        controller.handle(ClientEvent::Malformed {
            raw: "{".to_string(),
            reason: "EOF".to_string(),
        });
        assert!(controller.sink().calls().is_empty());
        assert!(controller.state().is_streaming());
    }
}
