//! Client configuration.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then environment variables, then command-line flags (applied by the
//! binary).

use crate::actor::ReconnectPolicy;
use crate::error::{ClientError, ClientResult};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding [`ClientConfig::server_url`].
pub const ENV_SERVER_URL: &str = "CHATWHEEL_SERVER_URL";

/// Environment variable overriding [`ClientConfig::system_prompt`].
pub const ENV_SYSTEM_PROMPT: &str = "CHATWHEEL_SYSTEM_PROMPT";

/// Configuration for the chat client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the chat server (`http://` or `https://`).
    pub server_url: String,
    /// Path of the streaming chat endpoint.
    pub chat_path: String,
    /// Path of the model catalog endpoint.
    pub models_path: String,
    /// Preferred model id, overriding the catalog default.
    pub model: Option<String>,
    /// System prompt sent with every request.
    pub system_prompt: String,
    /// Interval of the thinking-elapsed ticker in milliseconds.
    pub thinking_tick_ms: u64,
    /// Socket read timeout used to interleave reads and writes.
    pub read_poll_ms: u64,
    /// Timeout for the TCP connect and the WebSocket handshake in seconds.
    pub connect_timeout_secs: u64,
    /// Timeout for the model catalog request in seconds.
    pub catalog_timeout_secs: u64,
    /// Close a streaming turn locally when the connection drops.
    pub abandon_on_disconnect: bool,
    /// Reconnect behavior after transport loss.
    pub reconnect: ReconnectPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".to_string(),
            chat_path: "/ws/chat".to_string(),
            models_path: "/api/models".to_string(),
            model: None,
            system_prompt: String::new(),
            thinking_tick_ms: 1000,
            read_poll_ms: 50,
            connect_timeout_secs: 10,
            catalog_timeout_secs: 10,
            abandon_on_disconnect: true,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> ClientResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(ENV_SERVER_URL) {
            self.server_url = url;
        }
        if let Ok(prompt) = std::env::var(ENV_SYSTEM_PROMPT) {
            self.system_prompt = prompt.trim().to_string();
        }
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> ClientResult<()> {
        self.ws_url()?;
        if self.thinking_tick_ms == 0 {
            return Err(ClientError::Config(
                "thinking_tick_ms must be greater than zero".to_string(),
            ));
        }
        if self.read_poll_ms == 0 {
            return Err(ClientError::Config(
                "read_poll_ms must be greater than zero".to_string(),
            ));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ClientError::Config(
                "connect_timeout_secs must be greater than zero".to_string(),
            ));
        }
        self.reconnect.validate()
    }

    /// WebSocket URL of the chat endpoint.
    ///
    /// `http` maps to `ws` and `https` to `wss`.
    pub fn ws_url(&self) -> ClientResult<String> {
        let base = self.server_url.trim_end_matches('/');
        let (scheme, rest) = base.split_once("://").ok_or_else(|| {
            ClientError::Config(format!("server_url has no scheme: {}", self.server_url))
        })?;
        let ws_scheme = match scheme {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(ClientError::Config(format!(
                    "unsupported server_url scheme: {other}"
                )))
            }
        };
        Ok(format!("{ws_scheme}://{rest}{}", self.chat_path))
    }

    /// HTTP URL of the model catalog.
    pub fn models_url(&self) -> String {
        let base = self.server_url.trim_end_matches('/');
        let base = base
            .strip_prefix("ws://")
            .map(|rest| format!("http://{rest}"))
            .or_else(|| base.strip_prefix("wss://").map(|rest| format!("https://{rest}")))
            .unwrap_or_else(|| base.to_string());
        format!("{base}{}", self.models_path)
    }

    /// Interval of the thinking-elapsed ticker.
    pub const fn thinking_tick_interval(&self) -> Duration {
        Duration::from_millis(self.thinking_tick_ms)
    }

    /// Socket read timeout.
    pub const fn read_poll_interval(&self) -> Duration {
        Duration::from_millis(self.read_poll_ms)
    }

    /// Connect and handshake timeout.
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Model catalog request timeout.
    pub const fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs)
    }
}
