//! Actor Model: Message-passing concurrency for the chat client.
//!
//! Each source of events runs on its own thread and posts into one
//! crossbeam channel:
//! - **Connection Actor**: owns the WebSocket, parses inbound frames, reconnects
//! - **Input Actor**: reads lines from the user
//! - **Ticker Actor**: drives the thinking clock while a turn thinks
//! - **Event Loop**: hands every event to the session controller, in order
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  Stream / Connection  ┌──────────────┐
//! │  Connection  │ ────────────────────▶ │              │
//! │    Thread    │ ◀──────────────────── │              │
//! └──────────────┘     OutboundFrame     │  Event Loop  │
//!                                        │      +       │
//! ┌──────────────┐       Command         │  Controller  │
//! │ Input Thread │ ────────────────────▶ │              │
//! └──────────────┘                       │              │
//!                                        │              │
//! ┌──────────────┐        Tick           │              │
//! │Ticker Thread │ ────────────────────▶ │              │
//! └──────────────┘                       └──────────────┘
//! ```

mod client;
mod connection;
mod input;
mod messages;
mod reconnect;
mod ticker;

pub use client::ChatClient;
pub use connection::{ConnectionActor, Transport};
pub use input::{parse_command, InputActor, COMMAND_HELP};
pub use messages::{ClientEvent, ConnectionStatus, Tick, UserCommand};
pub use reconnect::{LinkState, ReconnectPolicy};
pub use ticker::TickerActor;
