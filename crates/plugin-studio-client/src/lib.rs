#![cfg_attr(test, allow(clippy::expect_used))]

use std::time::Duration;

use async_trait::async_trait;
use plugin_studio_core::wire::{
    AZDO_PROJECTS_PATH, AzdoProjectsResponse, CHAT_PATH, CONNECTED_PATH, ChatResponse,
    PLUGIN_FILE_PREFIX, PLUGIN_FILES_PREFIX, PROJECTS_PATH, PluginFileResponse,
    PluginFileWriteRequest, PluginFilesResponse, ProjectsResponse, error_message_from_body,
};
use plugin_studio_core::{BackendError, ChatRequest, ConnectionStatus, StudioBackend};
use reqwest::{StatusCode, Url};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub mod config;

pub use config::{ClientConfig, ConfigError};

const EMPTY_BODY: &str = "<empty>";

#[derive(Debug, Clone)]
pub struct PluginStudioClient {
    base_url: Url,
    timeout: Duration,
    request_attempts: usize,
    http: reqwest::Client,
}

#[derive(Debug, Error)]
pub enum PluginStudioClientError {
    #[error("plugin_studio_base_url_missing")]
    BaseUrlMissing,
    #[error("plugin_studio_invalid_base_url:{message}")]
    InvalidBaseUrl { message: String },
    #[error("plugin_studio_invalid_path")]
    InvalidPath,
    #[error("plugin_studio_request_failed:{message}")]
    Request { message: String },
    #[error("plugin_studio_read_failed:{message}")]
    Read { message: String },
    #[error("plugin_studio_http_{status}:{body}")]
    Http { status: StatusCode, body: String },
    #[error("plugin_studio_json_decode_failed:{message}")]
    Decode { message: String },
}

impl From<PluginStudioClientError> for BackendError {
    fn from(error: PluginStudioClientError) -> Self {
        match error {
            PluginStudioClientError::Request { message }
            | PluginStudioClientError::Read { message } => Self::network(message),
            PluginStudioClientError::Http { status, body } => {
                let message = error_message_from_body(&body)
                    .filter(|message| message != EMPTY_BODY)
                    .unwrap_or_else(|| {
                        status
                            .canonical_reason()
                            .unwrap_or("request failed")
                            .to_string()
                    });
                Self::http(status.as_u16(), message)
            }
            PluginStudioClientError::Decode { message } => Self::decode(message),
            other => Self::invalid_request(other.to_string()),
        }
    }
}

impl PluginStudioClient {
    pub fn new(config: ClientConfig) -> Result<Self, PluginStudioClientError> {
        let base_url = normalize_base_url(&config.base_url)?;
        Ok(Self {
            base_url,
            timeout: Duration::from_millis(config.timeout_ms.max(config::MIN_TIMEOUT_MS)),
            request_attempts: config.request_attempts.max(1),
            http: reqwest::Client::new(),
        })
    }

    /// Builds the URL for a fixed route plus percent-encoded dynamic
    /// segments, keeping any path prefix of the base URL.
    pub fn endpoint(
        &self,
        route: &str,
        segments: &[&str],
    ) -> Result<Url, PluginStudioClientError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| PluginStudioClientError::InvalidPath)?;
            path.pop_if_empty();
            path.extend(route.split('/').filter(|segment| !segment.is_empty()));
            path.extend(segments);
        }
        Ok(url)
    }

    pub async fn get_json<T>(&self, url: Url) -> Result<T, PluginStudioClientError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let response = self.send_get(url).await?;
        decode_json_response(response).await
    }

    /// Sends once; a POST may have side effects on the backend.
    pub async fn post_json<Req, Res>(
        &self,
        url: Url,
        payload: &Req,
    ) -> Result<Res, PluginStudioClientError>
    where
        Req: Serialize + ?Sized,
        Res: for<'de> serde::Deserialize<'de>,
    {
        let response = self.send_post(url, payload).await?;
        decode_json_response(response).await
    }

    /// POST whose body is irrelevant once the status is a success.
    pub async fn post_ack<Req>(
        &self,
        url: Url,
        payload: &Req,
    ) -> Result<(), PluginStudioClientError>
    where
        Req: Serialize + ?Sized,
    {
        let response = self.send_post(url, payload).await?;
        read_success_body(response).await.map(|_| ())
    }

    async fn send_post<Req>(
        &self,
        url: Url,
        payload: &Req,
    ) -> Result<reqwest::Response, PluginStudioClientError>
    where
        Req: Serialize + ?Sized,
    {
        tracing::debug!(method = "POST", url = %url, "sending request");
        self.http
            .post(url)
            .header("x-request-id", request_id())
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .map_err(|error| PluginStudioClientError::Request {
                message: error.to_string(),
            })
    }

    async fn send_get(&self, url: Url) -> Result<reqwest::Response, PluginStudioClientError> {
        let mut last_error: Option<String> = None;

        for attempt in 0..self.request_attempts {
            tracing::debug!(method = "GET", url = %url, attempt, "sending request");
            let request = self
                .http
                .get(url.clone())
                .header("x-request-id", request_id())
                .timeout(self.timeout);

            match request.send().await {
                Ok(response) => return Ok(response),
                Err(error) => {
                    tracing::warn!(url = %url, attempt, error = %error, "request failed");
                    last_error = Some(error.to_string());
                    if attempt + 1 >= self.request_attempts {
                        break;
                    }
                }
            }
        }

        Err(PluginStudioClientError::Request {
            message: last_error.unwrap_or_else(|| "unknown".to_string()),
        })
    }
}

#[async_trait(?Send)]
impl StudioBackend for PluginStudioClient {
    async fn list_projects(&self) -> Result<Vec<String>, BackendError> {
        let url = self.endpoint(PROJECTS_PATH, &[])?;
        let response: ProjectsResponse = self.get_json(url).await?;
        Ok(response.projects)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String, BackendError> {
        let url = self.endpoint(CHAT_PATH, &[])?;
        let response: ChatResponse = self.post_json(url, request).await?;
        Ok(response.reply.unwrap_or_default())
    }

    async fn list_azdo_targets(&self) -> Result<Vec<String>, BackendError> {
        let url = self.endpoint(AZDO_PROJECTS_PATH, &[])?;
        let response: AzdoProjectsResponse = self.get_json(url).await?;
        Ok(response.target_names())
    }

    async fn connection_status(&self) -> Result<ConnectionStatus, BackendError> {
        let url = self.endpoint(CONNECTED_PATH, &[])?;
        Ok(self.get_json(url).await?)
    }

    async fn list_plugin_files(&self, workspace: &str) -> Result<Vec<String>, BackendError> {
        let url = self.endpoint(PLUGIN_FILES_PREFIX, &[workspace])?;
        let response: PluginFilesResponse = self.get_json(url).await?;
        Ok(response.files)
    }

    async fn read_plugin_file(
        &self,
        workspace: &str,
        filename: &str,
    ) -> Result<String, BackendError> {
        let url = self.endpoint(PLUGIN_FILE_PREFIX, &[workspace, filename])?;
        let response: PluginFileResponse = self.get_json(url).await?;
        Ok(response.content.unwrap_or_default())
    }

    async fn write_plugin_file(
        &self,
        workspace: &str,
        filename: &str,
        content: &str,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(PLUGIN_FILE_PREFIX, &[workspace, filename])?;
        self.post_ack(url, &PluginFileWriteRequest { content }).await?;
        Ok(())
    }
}

pub fn format_http_error(status: StatusCode, body: &[u8]) -> PluginStudioClientError {
    let body = non_empty_string(String::from_utf8_lossy(body).to_string())
        .unwrap_or_else(|| EMPTY_BODY.to_string());
    PluginStudioClientError::Http { status, body }
}

fn normalize_base_url(base_url: &str) -> Result<Url, PluginStudioClientError> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(PluginStudioClientError::BaseUrlMissing);
    }
    let validated = config::validate_base_url(trimmed).map_err(|error| {
        PluginStudioClientError::InvalidBaseUrl {
            message: error.to_string(),
        }
    })?;
    Url::parse(&validated).map_err(|error| PluginStudioClientError::InvalidBaseUrl {
        message: error.to_string(),
    })
}

fn request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

async fn read_success_body(
    response: reqwest::Response,
) -> Result<Vec<u8>, PluginStudioClientError> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|error| PluginStudioClientError::Read {
            message: error.to_string(),
        })?;

    if !status.is_success() {
        return Err(format_http_error(status, &bytes));
    }
    Ok(bytes.to_vec())
}

async fn decode_json_response<T>(response: reqwest::Response) -> Result<T, PluginStudioClientError>
where
    T: for<'de> serde::Deserialize<'de>,
{
    let bytes = read_success_body(response).await?;
    serde_json::from_slice::<T>(&bytes).map_err(|error| PluginStudioClientError::Decode {
        message: error.to_string(),
    })
}

fn non_empty_string(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
