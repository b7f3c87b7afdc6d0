use std::future::Future;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::constants;

/// Body of `POST /v1/ask-viridium-ai`. Untagged so each variant serializes
/// to exactly the fields the endpoint expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AskRequest {
    Structured {
        material_name: String,
        manufacturer_name: String,
        work_content: String,
    },
    FreeText {
        message: String,
    },
}

impl AskRequest {
    pub fn structured(
        material_name: impl Into<String>,
        manufacturer_name: impl Into<String>,
        work_content: impl Into<String>,
    ) -> Self {
        AskRequest::Structured {
            material_name: material_name.into(),
            manufacturer_name: manufacturer_name.into(),
            work_content: work_content.into(),
        }
    }

    pub fn free_text(message: impl Into<String>) -> Self {
        AskRequest::FreeText {
            message: message.into(),
        }
    }
}

/// Successful reply. `status` and `message` belong to the service's response
/// envelope; they are only logged, so any JSON shape is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskResponse {
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<serde_json::Value>,
}

impl AskResponse {
    pub fn new(result: impl Into<String>) -> Self {
        Self {
            result: result.into(),
            status: None,
            message: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum AskError {
    #[error("Failed to reach the ask endpoint: {0}")]
    Network(#[source] reqwest::Error),
    #[error("Ask endpoint returned status {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("Failed to parse ask response: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Http,
    Parse,
}

impl AskError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AskError::Network(_) => ErrorKind::Network,
            AskError::Http { .. } => ErrorKind::Http,
            AskError::Parse(_) => ErrorKind::Parse,
        }
    }
}

/// Anything that can answer an [`AskRequest`]. The widget only talks to this.
pub trait AskBackend {
    fn ask(&self, request: &AskRequest) -> impl Future<Output = Result<AskResponse, AskError>> + Send;
}

#[derive(Debug, Clone)]
pub struct AskClient {
    client: Client,
    base_url: String,
}

impl AskClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns true when `/v1/health` answers with a 2xx status.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}{}", self.base_url, constants::HEALTH_ENDPOINT);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Health check failed");
                false
            }
        }
    }
}

impl AskBackend for AskClient {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, AskError> {
        let url = format!("{}{}", self.base_url, constants::ASK_ENDPOINT);

        // reqwest's `.json()` sets Content-Type: application/json
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(AskError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(%status, %body, "Ask endpoint request failed");
            return Err(AskError::Http { status, body });
        }

        // Read as bytes first so a malformed body is a Parse error, not a Network one.
        let bytes = response.bytes().await.map_err(AskError::Network)?;
        let parsed: AskResponse = serde_json::from_slice(&bytes)?;

        debug!(result = %parsed.result, envelope_message = ?parsed.message, "Received ask response");
        Ok(parsed)
    }
}
