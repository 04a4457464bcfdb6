//! Connection Actor: owns the WebSocket to the chat server.
//!
//! One thread both reads and writes the socket. A short read timeout lets
//! the loop alternate between draining the outbound queue and waiting for
//! inbound frames. Inbound frames are parsed here so the event loop only
//! ever sees typed events.
//!
//! The TCP connect and the handshake are both bounded by the connect
//! timeout, so an unresponsive server never pins the thread. Only plain
//! `ws://` endpoints are supported.
//!
//! On transport loss the actor reconnects according to its
//! [`ReconnectPolicy`]. Nothing in flight survives a reconnect: the server
//! keeps no per-turn state across connections.

use super::messages::{ClientEvent, ConnectionStatus};
use super::reconnect::{LinkState, ReconnectPolicy};
use crate::error::{ClientError, ClientResult};
use crate::protocol::{OutboundFrame, StreamEvent};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::io::ErrorKind;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tungstenite::client::IntoClientRequest;
use tungstenite::{Message, WebSocket};

type Socket = WebSocket<TcpStream>;

/// Outbound half of the connection manager.
///
/// The session controller only needs to know whether it can send and to
/// send a frame; everything else about the link is reported as events.
pub trait Transport {
    /// Whether frames can currently be sent.
    fn is_connected(&self) -> bool;

    /// Send one frame.
    ///
    /// Fails with [`ClientError::NotConnected`] while the link is down.
    fn send(&mut self, frame: OutboundFrame) -> ClientResult<()>;
}

/// Connection actor that keeps one WebSocket alive.
pub struct ConnectionActor {
    /// Handle to the connection thread.
    handle: Option<JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
    /// Set while the socket is open.
    connected: Arc<AtomicBool>,
    /// Serialized frames waiting to be written.
    outbound: Sender<String>,
}

/// Settings the connection thread needs.
struct LinkSettings {
    url: String,
    policy: ReconnectPolicy,
    read_timeout: Duration,
    connect_timeout: Duration,
}

impl ConnectionActor {
    /// Spawn the connection actor thread.
    ///
    /// # Arguments
    ///
    /// * `url` - WebSocket URL of the chat endpoint.
    /// * `policy` - Reconnect policy.
    /// * `read_timeout` - How long a read waits before the queue is drained.
    /// * `connect_timeout` - Bound on the TCP connect and on the handshake.
    /// * `events` - Event loop channel.
    pub fn spawn(
        url: impl Into<String>,
        policy: ReconnectPolicy,
        read_timeout: Duration,
        connect_timeout: Duration,
        events: Sender<ClientEvent>,
    ) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let connected = Arc::new(AtomicBool::new(false));
        let (outbound, outbound_rx) = unbounded::<String>();

        let settings = LinkSettings {
            url: url.into(),
            policy,
            read_timeout,
            connect_timeout,
        };
        let shutdown_clone = shutdown.clone();
        let connected_clone = connected.clone();

        let handle = thread::Builder::new()
            .name("chatwheel-connection".to_string())
            .spawn(move || {
                Self::run_loop(&settings, &events, &outbound_rx, &shutdown_clone, &connected_clone);
            })
            .expect("Failed to spawn connection thread");

        Self {
            handle: Some(handle),
            shutdown,
            connected,
            outbound,
        }
    }

    /// Signal the connection thread to shutdown.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Wait for the connection thread to finish.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Connect, run, and reconnect until shutdown or the policy gives up.
    fn run_loop(
        settings: &LinkSettings,
        events: &Sender<ClientEvent>,
        outbound: &Receiver<String>,
        shutdown: &AtomicBool,
        connected: &AtomicBool,
    ) {
        let mut link = LinkState::new();

        while !shutdown.load(Ordering::Relaxed) {
            link = link.connecting();
            debug!("Connecting to {} ({:?})", settings.url, link);

            match Self::open(&settings.url, settings.connect_timeout) {
                Ok(mut socket) => {
                    link = link.connected();
                    if let Err(e) = socket.get_ref().set_read_timeout(Some(settings.read_timeout)) {
                        warn!("Failed to set socket read timeout: {}", e);
                    }

                    let stale = outbound.try_iter().count();
                    if stale > 0 {
                        warn!("Discarded {} frames queued for a previous connection", stale);
                    }

                    connected.store(true, Ordering::Release);
                    info!("Connected to {}", settings.url);
                    if !Self::report(events, ClientEvent::Connection(ConnectionStatus::Connected)) {
                        break;
                    }

                    let reason = Self::run_session(&mut socket, events, outbound, shutdown);
                    connected.store(false, Ordering::Release);

                    if shutdown.load(Ordering::Relaxed) {
                        break;
                    }

                    link = link.failed();
                    warn!("Connection lost: {}", reason);
                    if !Self::report(events, ClientEvent::Connection(ConnectionStatus::Lost { reason })) {
                        break;
                    }
                }
                Err(e) => {
                    link = link.failed();
                    warn!("Connect to {} failed: {}", settings.url, e);
                }
            }

            let attempt = link.failures();
            let Some(delay) = settings.policy.delay_for(attempt) else {
                error!("Giving up on {} after {} attempts", settings.url, attempt);
                Self::report(
                    events,
                    ClientEvent::Connection(ConnectionStatus::GaveUp { attempts: attempt }),
                );
                break;
            };

            info!("Reconnecting in {:?}...", delay);
            if !Self::report(
                events,
                ClientEvent::Connection(ConnectionStatus::Reconnecting { attempt, delay }),
            ) {
                break;
            }
            if !Self::wait(delay, shutdown) {
                break;
            }
        }

        debug!("Connection actor stopped");
    }

    /// Pump one open socket until it fails. Returns the reason it ended.
    fn run_session(
        socket: &mut Socket,
        events: &Sender<ClientEvent>,
        outbound: &Receiver<String>,
        shutdown: &AtomicBool,
    ) -> String {
        loop {
            if shutdown.load(Ordering::Relaxed) {
                let _ = socket.close(None);
                let _ = socket.flush();
                return "client shutdown".to_string();
            }

            while let Ok(text) = outbound.try_recv() {
                if let Err(e) = socket.send(Message::Text(text)) {
                    return format!("send failed: {e}");
                }
            }

            let event = match socket.read() {
                Ok(Message::Text(text)) => match StreamEvent::parse(&text) {
                    Ok(event) => ClientEvent::Stream(event),
                    Err(e) => ClientEvent::Malformed {
                        raw: text,
                        reason: e.to_string(),
                    },
                },
                Ok(Message::Binary(bytes)) => ClientEvent::Malformed {
                    raw: format!("<{} binary bytes>", bytes.len()),
                    reason: "binary frames are not part of the protocol".to_string(),
                },
                Ok(Message::Close(_)) => return "closed by server".to_string(),
                Ok(_) => continue,
                Err(tungstenite::Error::Io(e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    continue;
                }
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    return "connection closed".to_string();
                }
                Err(e) => return ClientError::from(e).to_string(),
            };

            if !Self::report(events, event) {
                return "event loop closed".to_string();
            }
        }
    }

    /// Connect and complete the handshake, each step bounded by `timeout`.
    fn open(url: &str, timeout: Duration) -> ClientResult<Socket> {
        let request = url.into_client_request()?;
        let uri = request.uri();
        if uri.scheme_str() != Some("ws") {
            return Err(ClientError::Transport(format!(
                "unsupported scheme in {url}: only ws:// is available"
            )));
        }
        let host = uri
            .host()
            .map(|host| host.trim_start_matches('[').trim_end_matches(']'))
            .ok_or_else(|| ClientError::Transport(format!("no host in {url}")))?;
        let port = uri.port_u16().unwrap_or(80);

        let mut last_error = None;
        let mut stream = None;
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(connected) => {
                    stream = Some(connected);
                    break;
                }
                Err(e) => last_error = Some(e),
            }
        }
        let stream = match (stream, last_error) {
            (Some(stream), _) => stream,
            (None, Some(e)) => return Err(e.into()),
            (None, None) => {
                return Err(ClientError::Transport(format!("{host} did not resolve")));
            }
        };

        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        let (socket, _response) = tungstenite::client(request, stream)
            .map_err(|e| ClientError::Transport(format!("handshake failed: {e}")))?;
        Ok(socket)
    }

    /// Forward an event to the loop. Returns `false` if the loop is gone.
    fn report(events: &Sender<ClientEvent>, event: ClientEvent) -> bool {
        events.send(event).is_ok()
    }

    /// Sleep for `delay`, waking early on shutdown. Returns `false` on shutdown.
    fn wait(delay: Duration, shutdown: &AtomicBool) -> bool {
        let deadline = Instant::now() + delay;
        loop {
            if shutdown.load(Ordering::Relaxed) {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(Duration::from_millis(50)));
        }
    }
}

impl Transport for ConnectionActor {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn send(&mut self, frame: OutboundFrame) -> ClientResult<()> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }
        let text = frame.to_json()?;
        self.outbound
            .send(text)
            .map_err(|_| ClientError::Transport("connection actor stopped".to_string()))
    }
}

impl Drop for ConnectionActor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
