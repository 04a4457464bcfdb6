//! Session: the conversation model and the streaming state machine.
//!
//! - [`SessionState`] holds the messages and the turn bookkeeping.
//! - [`dispatch`] applies one inbound [`StreamEvent`](crate::protocol::StreamEvent).
//! - [`SessionController`] owns everything and routes every
//!   [`ClientEvent`](crate::actor::ClientEvent).

mod cancel;
mod controller;
mod interpreter;
mod message;
mod state;
mod timing;

pub use cancel::CancelCoordinator;
pub use controller::{SessionController, ABANDONED_NOTICE};
pub use interpreter::{dispatch, ClockDirective, Transition, STOPPED_PLACEHOLDER};
pub use message::{Message, MessageId, Role};
pub use state::SessionState;
pub use timing::ThinkingClock;
