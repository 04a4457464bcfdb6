//! Model catalog served by the chat backend.

use crate::error::{ClientError, ClientResult};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// One selectable model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelInfo {
    /// Identifier sent in requests.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// The list of models offered by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ModelCatalog {
    /// Available models in display order.
    pub models: Vec<ModelInfo>,
    /// Id of the default model, if the server names one.
    #[serde(default)]
    pub default: Option<String>,
}

impl ModelCatalog {
    /// Parse a catalog from its JSON form.
    pub fn from_json(text: &str) -> ClientResult<Self> {
        serde_json::from_str(text).map_err(|e| ClientError::Catalog(e.to_string()))
    }

    /// Fetch the catalog over HTTP.
    ///
    /// This blocks; it runs once at startup before the event loop exists.
    pub fn fetch(url: &str, timeout: Duration) -> ClientResult<Self> {
        debug!("Fetching model catalog from {}", url);
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        let response = client.get(url).send()?;
        if !response.status().is_success() {
            return Err(ClientError::Catalog(format!(
                "server returned {}",
                response.status()
            )));
        }
        let catalog: Self = response.json()?;
        info!("Loaded {} models", catalog.models.len());
        Ok(catalog)
    }

    /// Id the catalog designates as default.
    ///
    /// Falls back to the first listed model when the server names none.
    pub fn default_id(&self) -> Option<&str> {
        self.default
            .as_deref()
            .or_else(|| self.models.first().map(|model| model.id.as_str()))
    }

    /// The model preselected at startup.
    ///
    /// `None` when the default id matches no listed model.
    pub fn default_model(&self) -> Option<&ModelInfo> {
        self.default_id().and_then(|id| self.find(id))
    }

    /// Look up a model by id.
    pub fn find(&self, id: &str) -> Option<&ModelInfo> {
        self.models.iter().find(|model| model.id == id)
    }

    /// Whether the catalog lists no models.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
