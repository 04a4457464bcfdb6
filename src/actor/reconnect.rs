//! Reconnect policy and link state for the connection actor.

use crate::error::{ClientError, ClientResult};
use serde::Deserialize;
use std::time::Duration;

/// How the connection actor retries after a failure.
///
/// The delay starts at `initial_delay_ms` and is multiplied by `multiplier`
/// after each consecutive failure, capped at `max_delay_ms`. A multiplier of
/// `1.0` gives a fixed delay.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Delay before the first retry.
    pub initial_delay_ms: u64,
    /// Growth factor per consecutive failure.
    pub multiplier: f64,
    /// Upper bound on the delay.
    pub max_delay_ms: u64,
    /// Consecutive failures after which the actor gives up.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 3000,
            multiplier: 2.0,
            max_delay_ms: 30_000,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// A fixed delay with no attempt cap.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn fixed(delay: Duration) -> Self {
        let ms = delay.as_millis() as u64;
        Self {
            initial_delay_ms: ms,
            multiplier: 1.0,
            max_delay_ms: ms,
            max_attempts: None,
        }
    }

    /// Check the policy is well formed.
    pub fn validate(&self) -> ClientResult<()> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ClientError::Config(format!(
                "reconnect multiplier must be >= 1.0, got {}",
                self.multiplier
            )));
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(ClientError::Config(
                "reconnect max_delay_ms is below initial_delay_ms".to_string(),
            ));
        }
        if self.max_attempts == Some(0) {
            return Err(ClientError::Config(
                "reconnect max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Delay before retrying after `attempt` consecutive failures (1-based).
    ///
    /// Returns `None` once the attempt cap is exceeded.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap
    )]
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if self.max_attempts.is_some_and(|max| attempt > max) {
            return None;
        }
        let exponent = attempt.saturating_sub(1).min(64) as i32;
        let scaled = self.initial_delay_ms as f64 * self.multiplier.powi(exponent);
        let capped = scaled.min(self.max_delay_ms as f64);
        Some(Duration::from_millis(capped as u64))
    }
}

/// Lifecycle of the transport link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No connection and none in progress.
    Disconnected {
        /// Consecutive failed attempts.
        failures: u32,
    },
    /// A connect attempt is running.
    Connecting {
        /// Attempt number (1-based).
        attempt: u32,
    },
    /// The WebSocket is open.
    Connected,
}

impl LinkState {
    /// Initial state.
    pub const fn new() -> Self {
        Self::Disconnected { failures: 0 }
    }

    /// A connect attempt began.
    #[must_use]
    pub const fn connecting(self) -> Self {
        let attempt = match self {
            Self::Disconnected { failures } => failures + 1,
            Self::Connecting { attempt } => attempt + 1,
            Self::Connected => 1,
        };
        Self::Connecting { attempt }
    }

    /// The handshake completed; the failure count resets.
    #[must_use]
    pub const fn connected(self) -> Self {
        Self::Connected
    }

    /// An attempt failed or an open link dropped.
    #[must_use]
    pub const fn failed(self) -> Self {
        let failures = match self {
            Self::Connecting { attempt } => attempt,
            Self::Disconnected { failures } => failures + 1,
            Self::Connected => 1,
        };
        Self::Disconnected { failures }
    }

    /// Consecutive failures recorded.
    pub const fn failures(self) -> u32 {
        match self {
            Self::Disconnected { failures } => failures,
            Self::Connecting { attempt } => attempt.saturating_sub(1),
            Self::Connected => 0,
        }
    }

    /// Whether the link is open.
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl Default for LinkState {
    fn default() -> Self {
        Self::new()
    }
}
