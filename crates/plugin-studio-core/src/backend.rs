use async_trait::async_trait;
use serde::Serialize;

use crate::wire::{ChatRequest, ConnectionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorKind {
    /// The request never produced a response.
    Network,
    /// The backend answered with a non-2xx status.
    Http,
    /// The response body did not match the expected shape.
    Decode,
    /// The request could not be built from its inputs.
    InvalidRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl BackendError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Network,
            status: None,
            message: message.into(),
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Http,
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Decode,
            status: None,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::InvalidRequest,
            status: None,
            message: message.into(),
        }
    }

    /// Text shown to the user in place of a reply or a list.
    #[must_use]
    pub fn display_text(&self) -> String {
        match (self.kind, self.status) {
            (BackendErrorKind::Http, Some(status)) => format!("HTTP {status}: {}", self.message),
            (BackendErrorKind::Network, _) => format!("Network error: {}", self.message),
            (BackendErrorKind::Decode, _) => format!("Unexpected response: {}", self.message),
            _ => self.message.clone(),
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_text())
    }
}

impl std::error::Error for BackendError {}

/// Remote surface the client consumes. Futures are not `Send` so the browser
/// shell can implement this over `fetch`.
#[async_trait(?Send)]
pub trait StudioBackend {
    async fn list_projects(&self) -> Result<Vec<String>, BackendError>;

    /// Returns the assistant reply text (markup).
    async fn chat(&self, request: &ChatRequest) -> Result<String, BackendError>;

    async fn list_azdo_targets(&self) -> Result<Vec<String>, BackendError>;

    async fn connection_status(&self) -> Result<ConnectionStatus, BackendError>;

    async fn list_plugin_files(&self, workspace: &str) -> Result<Vec<String>, BackendError>;

    /// Missing content is returned as an empty string.
    async fn read_plugin_file(&self, workspace: &str, filename: &str)
    -> Result<String, BackendError>;

    async fn write_plugin_file(
        &self,
        workspace: &str,
        filename: &str,
        content: &str,
    ) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_text_distinguishes_kinds() {
        assert_eq!(
            BackendError::http(500, "❌ Server error: boom").to_string(),
            "HTTP 500: ❌ Server error: boom"
        );
        assert_eq!(
            BackendError::network("connection refused").to_string(),
            "Network error: connection refused"
        );
        assert_eq!(
            BackendError::decode("missing field `files`").to_string(),
            "Unexpected response: missing field `files`"
        );
        assert_eq!(
            BackendError::invalid_request("bad path").to_string(),
            "bad path"
        );
    }
}
