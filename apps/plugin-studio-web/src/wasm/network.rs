use async_trait::async_trait;
use gloo_net::http::{Request, Response};
use plugin_studio_core::wire::{
    AZDO_PROJECTS_PATH, AzdoProjectsResponse, CHAT_PATH, CONNECTED_PATH, ChatResponse,
    PROJECTS_PATH, PluginFileResponse, PluginFileWriteRequest, PluginFilesResponse,
    ProjectsResponse, plugin_file_path, plugin_files_path,
};
use plugin_studio_core::{BackendError, ChatRequest, ConnectionStatus, StudioBackend};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::response::{check_status, decode_json_body};

/// Fetch transport against the page's own origin.
pub(crate) struct FetchBackend {
    base_url: String,
}

impl FetchBackend {
    pub(crate) fn same_origin() -> Self {
        Self {
            base_url: String::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = Request::get(&self.url(path))
            .send()
            .await
            .map_err(map_network_error)?;
        let (status, raw) = read_response(response).await?;
        decode_json_body(status, &raw)
    }

    async fn post(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<(u16, String), BackendError> {
        let body = serde_json::to_string(body).map_err(|error| {
            BackendError::invalid_request(format!("failed to serialize request body: {error}"))
        })?;
        let request = Request::post(&self.url(path))
            .header("content-type", "application/json")
            .body(body)
            .map_err(|error| {
                BackendError::invalid_request(format!("failed to build request body: {error}"))
            })?;
        let response = request.send().await.map_err(map_network_error)?;
        read_response(response).await
    }
}

async fn read_response(response: Response) -> Result<(u16, String), BackendError> {
    let status = response.status();
    let raw = response
        .text()
        .await
        .map_err(|error| BackendError::network(format!("failed to read response: {error}")))?;
    Ok((status, raw))
}

fn map_network_error(error: gloo_net::Error) -> BackendError {
    BackendError::network(error.to_string())
}

fn encode_segment(raw: &str) -> String {
    js_sys::encode_uri_component(raw)
        .as_string()
        .unwrap_or_else(|| raw.to_string())
}

#[async_trait(?Send)]
impl StudioBackend for FetchBackend {
    async fn list_projects(&self) -> Result<Vec<String>, BackendError> {
        let response: ProjectsResponse = self.get_json(PROJECTS_PATH).await?;
        Ok(response.projects)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String, BackendError> {
        let (status, raw) = self.post(CHAT_PATH, request).await?;
        let response: ChatResponse = decode_json_body(status, &raw)?;
        Ok(response.reply.unwrap_or_default())
    }

    async fn list_azdo_targets(&self) -> Result<Vec<String>, BackendError> {
        let response: AzdoProjectsResponse = self.get_json(AZDO_PROJECTS_PATH).await?;
        Ok(response.target_names())
    }

    async fn connection_status(&self) -> Result<ConnectionStatus, BackendError> {
        self.get_json(CONNECTED_PATH).await
    }

    async fn list_plugin_files(&self, workspace: &str) -> Result<Vec<String>, BackendError> {
        let path = plugin_files_path(workspace, encode_segment);
        let response: PluginFilesResponse = self.get_json(&path).await?;
        Ok(response.files)
    }

    async fn read_plugin_file(
        &self,
        workspace: &str,
        filename: &str,
    ) -> Result<String, BackendError> {
        let path = plugin_file_path(workspace, filename, encode_segment);
        let response: PluginFileResponse = self.get_json(&path).await?;
        Ok(response.content.unwrap_or_default())
    }

    async fn write_plugin_file(
        &self,
        workspace: &str,
        filename: &str,
        content: &str,
    ) -> Result<(), BackendError> {
        let path = plugin_file_path(workspace, filename, encode_segment);
        let (status, raw) = self.post(&path, &PluginFileWriteRequest { content }).await?;
        check_status(status, &raw)
    }
}
