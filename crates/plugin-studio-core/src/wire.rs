use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PROJECTS_PATH: &str = "/projects";
pub const CHAT_PATH: &str = "/chat";
pub const AZDO_PROJECTS_PATH: &str = "/azdo_projects";
pub const CONNECTED_PATH: &str = "/api/connected";
pub const PLUGIN_FILES_PREFIX: &str = "/api/plugin_files";
pub const PLUGIN_FILE_PREFIX: &str = "/api/plugin_file";

pub const PUSH_TO_AZDO_MESSAGE: &str = "Push this project to Azure DevOps";

/// Builds `/api/plugin_files/{workspace}` with `encode` applied to the
/// workspace segment.
#[must_use]
pub fn plugin_files_path(workspace: &str, encode: impl Fn(&str) -> String) -> String {
    format!("{PLUGIN_FILES_PREFIX}/{}", encode(workspace))
}

/// Builds `/api/plugin_file/{workspace}/{filename}`.
#[must_use]
pub fn plugin_file_path(
    workspace: &str,
    filename: &str,
    encode: impl Fn(&str) -> String,
) -> String {
    format!(
        "{PLUGIN_FILE_PREFIX}/{}/{}",
        encode(workspace),
        encode(filename)
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<ChatTurn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azdo_project: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub reply: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectsResponse {
    #[serde(default)]
    pub projects: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AzdoProjectsResponse {
    #[serde(default)]
    pub azdo_projects: Map<String, Value>,
}

impl AzdoProjectsResponse {
    /// Target names in the order the backend listed them.
    #[must_use]
    pub fn target_names(&self) -> Vec<String> {
        self.azdo_projects.keys().cloned().collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PluginFilesResponse {
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PluginFileResponse {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PluginFileWriteRequest<'a> {
    pub content: &'a str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    #[serde(default)]
    pub azdo: bool,
}

/// Shape of a non-2xx body. The backend reports failures through `reply`;
/// `error` and `message` cover proxies and framework defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    #[must_use]
    pub fn message(&self) -> Option<String> {
        [&self.reply, &self.error, &self.message]
            .into_iter()
            .flatten()
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
            .map(ToString::to_string)
    }
}

/// Extracts a readable message from a raw error body, falling back to the
/// trimmed text when it is not JSON.
#[must_use]
pub fn error_message_from_body(raw: &str) -> Option<String> {
    if let Ok(body) = serde_json::from_str::<ErrorBody>(raw) {
        if let Some(message) = body.message() {
            return Some(message);
        }
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
