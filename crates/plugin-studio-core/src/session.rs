use serde::Serialize;

use crate::backend::BackendError;
use crate::conversation::{ConversationState, HistoryMode, WORKSPACE_GREETING};
use crate::input::{
    InputError, normalize_azdo_target, normalize_filename, normalize_workspace_name,
};
use crate::requests::{RequestSlot, RequestToken};
use crate::tabs::{
    EditorSurface, OpenOutcome, OpenStart, OpenTicket, SaveOutcome, SaveTicket, TabManager,
};
use crate::view::StudioView;
use crate::wire::{ChatRequest, ConnectionStatus, PUSH_TO_AZDO_MESSAGE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Screen {
    Picker,
    Workspace { name: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Failed(BackendError),
}

impl<T> LoadState<T> {
    #[must_use]
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&BackendError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    fn settle(result: Result<T, BackendError>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(error) => Self::Failed(error),
        }
    }
}

/// The three chat boxes. They share the chat endpoint and differ in history
/// and scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatPanel {
    /// Picker-screen chat used to create workspaces.
    Creation,
    /// Main assistant conversation for the selected workspace.
    Workspace,
    /// Chat box beside the editor.
    Editor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTicket {
    pub panel: ChatPanel,
    pub token: RequestToken,
    pub request: ChatRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatCompletion {
    pub applied: bool,
    /// The exchange may have created a workspace.
    pub refresh_workspaces: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesTicket {
    pub workspace: String,
    pub token: RequestToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOpenTicket {
    pub workspace: String,
    pub open: OpenTicket,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOpenStart {
    Activated,
    AlreadyLoading,
    Fetch(FileOpenTicket),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub workspace: String,
    pub save: SaveTicket,
}

/// All client state. Every mutation is synchronous; remote calls happen
/// between a `begin_*` that returns a ticket and a `finish_*` that applies
/// the result only if the ticket is still current.
#[derive(Debug)]
pub struct StudioSession<S> {
    screen: Screen,
    workspaces: Vec<String>,
    workspaces_error: Option<BackendError>,
    workspaces_slot: RequestSlot,
    creation_chat: ConversationState,
    conversation: ConversationState,
    editor_chat: ConversationState,
    files: LoadState<Vec<String>>,
    files_slot: RequestSlot,
    tabs: TabManager<S>,
    azdo_targets: LoadState<Vec<String>>,
    azdo_slot: RequestSlot,
    connection: LoadState<ConnectionStatus>,
    connection_slot: RequestSlot,
}

impl<S: EditorSurface> StudioSession<S> {
    pub fn new(surface: S) -> Self {
        Self {
            screen: Screen::Picker,
            workspaces: Vec::new(),
            workspaces_error: None,
            workspaces_slot: RequestSlot::default(),
            creation_chat: ConversationState::new(HistoryMode::Empty),
            conversation: ConversationState::new(HistoryMode::Full),
            editor_chat: ConversationState::new(HistoryMode::Empty),
            files: LoadState::Idle,
            files_slot: RequestSlot::default(),
            tabs: TabManager::new(surface),
            azdo_targets: LoadState::Idle,
            azdo_slot: RequestSlot::default(),
            connection: LoadState::Idle,
            connection_slot: RequestSlot::default(),
        }
    }

    #[must_use]
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    #[must_use]
    pub fn active_workspace(&self) -> Option<&str> {
        match &self.screen {
            Screen::Workspace { name } => Some(name),
            Screen::Picker => None,
        }
    }

    pub fn begin_refresh_workspaces(&mut self) -> RequestToken {
        self.workspaces_slot.issue()
    }

    /// On failure the previous list stays and the error is kept beside it.
    pub fn finish_refresh_workspaces(
        &mut self,
        token: RequestToken,
        result: Result<Vec<String>, BackendError>,
    ) -> bool {
        if !self.workspaces_slot.complete(token) {
            tracing::debug!("discarding stale workspace list");
            return false;
        }
        match result {
            Ok(names) => {
                self.workspaces = names;
                self.workspaces_error = None;
            }
            Err(error) => {
                tracing::warn!(error = %error, "failed to list workspaces");
                self.workspaces_error = Some(error);
            }
        }
        true
    }

    /// Switches to `name`. The conversation restarts at the greeting and the
    /// editor loses every tab, saved or not.
    pub fn select_workspace(&mut self, name: &str) -> Result<FilesTicket, InputError> {
        let name = normalize_workspace_name(name)?;
        tracing::info!(workspace = %name, "selecting workspace");

        self.screen = Screen::Workspace { name: name.clone() };
        self.conversation.reset(Some(WORKSPACE_GREETING));
        self.editor_chat.reset(None);
        self.tabs.reset();
        self.files = LoadState::Loading;
        let token = self.files_slot.issue();
        Ok(FilesTicket {
            workspace: name,
            token,
        })
    }

    pub fn return_to_picker(&mut self) {
        if let Some(name) = self.active_workspace() {
            tracing::info!(workspace = %name, "leaving workspace");
        }
        self.screen = Screen::Picker;
        self.conversation.reset(None);
        self.editor_chat.reset(None);
        self.tabs.reset();
        self.files = LoadState::Idle;
        self.files_slot.invalidate();
    }

    pub fn finish_load_files(
        &mut self,
        ticket: &FilesTicket,
        result: Result<Vec<String>, BackendError>,
    ) -> bool {
        if self.active_workspace() != Some(ticket.workspace.as_str())
            || !self.files_slot.complete(ticket.token)
        {
            tracing::debug!(workspace = %ticket.workspace, "discarding stale file list");
            return false;
        }
        if let Err(error) = &result {
            tracing::warn!(workspace = %ticket.workspace, error = %error, "failed to list files");
        }
        self.files = LoadState::settle(result);
        true
    }

    pub fn begin_send_message(&mut self, raw: &str) -> Result<ChatTicket, InputError> {
        let workspace = self.require_workspace()?;
        let pending = self.conversation.begin_send(raw)?;
        Ok(ChatTicket {
            panel: ChatPanel::Workspace,
            token: pending.token,
            request: ChatRequest {
                message: pending.message,
                history: pending.history,
                project: Some(workspace),
                azdo_project: None,
            },
        })
    }

    pub fn begin_creation_message(&mut self, raw: &str) -> Result<ChatTicket, InputError> {
        let pending = self.creation_chat.begin_send(raw)?;
        Ok(ChatTicket {
            panel: ChatPanel::Creation,
            token: pending.token,
            request: ChatRequest {
                message: pending.message,
                history: pending.history,
                project: None,
                azdo_project: None,
            },
        })
    }

    pub fn begin_editor_message(&mut self, raw: &str) -> Result<ChatTicket, InputError> {
        let workspace = self.require_workspace()?;
        let pending = self.editor_chat.begin_send(raw)?;
        Ok(ChatTicket {
            panel: ChatPanel::Editor,
            token: pending.token,
            request: ChatRequest {
                message: pending.message,
                history: pending.history,
                project: Some(workspace),
                azdo_project: None,
            },
        })
    }

    /// Asks the assistant to push the workspace to `target`. The reply lands
    /// in the main conversation.
    pub fn begin_push_to_azdo(&mut self, target: &str) -> Result<ChatTicket, InputError> {
        let workspace = self.require_workspace()?;
        let target = normalize_azdo_target(target)?;
        let token = self.conversation.begin_background();
        Ok(ChatTicket {
            panel: ChatPanel::Workspace,
            token,
            request: ChatRequest {
                message: PUSH_TO_AZDO_MESSAGE.to_string(),
                history: Vec::new(),
                project: Some(workspace),
                azdo_project: Some(target),
            },
        })
    }

    pub fn finish_chat(
        &mut self,
        ticket: &ChatTicket,
        result: Result<String, BackendError>,
    ) -> ChatCompletion {
        let conversation = match ticket.panel {
            ChatPanel::Creation => &mut self.creation_chat,
            ChatPanel::Workspace => &mut self.conversation,
            ChatPanel::Editor => &mut self.editor_chat,
        };
        ChatCompletion {
            applied: conversation.finish(ticket.token, result),
            refresh_workspaces: ticket.panel == ChatPanel::Creation,
        }
    }

    pub fn begin_open_file(&mut self, filename: &str) -> Result<FileOpenStart, InputError> {
        let workspace = self.require_workspace()?;
        let filename = normalize_filename(filename)?;
        Ok(match self.tabs.begin_open(&filename) {
            OpenStart::Activated => FileOpenStart::Activated,
            OpenStart::AlreadyLoading => FileOpenStart::AlreadyLoading,
            OpenStart::Fetch(open) => FileOpenStart::Fetch(FileOpenTicket { workspace, open }),
        })
    }

    pub fn finish_open_file(
        &mut self,
        ticket: &FileOpenTicket,
        result: Result<String, BackendError>,
    ) -> OpenOutcome {
        if self.active_workspace() != Some(ticket.workspace.as_str()) {
            tracing::debug!(workspace = %ticket.workspace, "discarding file from another workspace");
            return OpenOutcome::Stale;
        }
        self.tabs.finish_open(&ticket.open, result)
    }

    pub fn activate_tab(&mut self, filename: &str) -> bool {
        self.tabs.activate(filename)
    }

    pub fn close_tab(&mut self, filename: &str) -> bool {
        self.tabs.close(filename)
    }

    pub fn edit_active_buffer(&mut self, text: impl Into<String>) -> bool {
        self.tabs.edit_active(text)
    }

    /// Returns `None` when no workspace is selected or no tab is active.
    pub fn begin_save(&mut self) -> Option<SaveRequest> {
        let workspace = self.active_workspace()?.to_string();
        let save = self.tabs.begin_save()?;
        Some(SaveRequest { workspace, save })
    }

    /// Applies a save result and acknowledges it in the editor chat.
    pub fn finish_save(
        &mut self,
        request: &SaveRequest,
        result: Result<(), BackendError>,
    ) -> SaveOutcome {
        if self.active_workspace() != Some(request.workspace.as_str()) {
            return SaveOutcome::Stale;
        }
        let outcome = self.tabs.finish_save(&request.save, result);
        match &outcome {
            SaveOutcome::Saved { filename } => {
                self.editor_chat.append_notice(format!("💾 Saved {filename}"));
            }
            SaveOutcome::Failed { filename, error } => {
                self.editor_chat.append_error(format!(
                    "Error saving {filename}: {}",
                    error.display_text()
                ));
            }
            SaveOutcome::Stale => {}
        }
        outcome
    }

    pub fn begin_load_azdo_targets(&mut self) -> RequestToken {
        self.azdo_targets = LoadState::Loading;
        self.azdo_slot.issue()
    }

    pub fn finish_load_azdo_targets(
        &mut self,
        token: RequestToken,
        result: Result<Vec<String>, BackendError>,
    ) -> bool {
        if !self.azdo_slot.complete(token) {
            return false;
        }
        if let Err(error) = &result {
            tracing::warn!(error = %error, "failed to list azure devops targets");
        }
        self.azdo_targets = LoadState::settle(result);
        true
    }

    pub fn begin_connection_status(&mut self) -> RequestToken {
        self.connection = LoadState::Loading;
        self.connection_slot.issue()
    }

    pub fn finish_connection_status(
        &mut self,
        token: RequestToken,
        result: Result<ConnectionStatus, BackendError>,
    ) -> bool {
        if !self.connection_slot.complete(token) {
            return false;
        }
        if let Err(error) = &result {
            tracing::warn!(error = %error, "failed to read connection status");
        }
        self.connection = LoadState::settle(result);
        true
    }

    #[must_use]
    pub fn workspaces(&self) -> &[String] {
        &self.workspaces
    }

    #[must_use]
    pub fn workspaces_error(&self) -> Option<&BackendError> {
        self.workspaces_error.as_ref()
    }

    #[must_use]
    pub fn workspaces_loading(&self) -> bool {
        self.workspaces_slot.in_flight()
    }

    #[must_use]
    pub fn creation_chat(&self) -> &ConversationState {
        &self.creation_chat
    }

    #[must_use]
    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    #[must_use]
    pub fn editor_chat(&self) -> &ConversationState {
        &self.editor_chat
    }

    #[must_use]
    pub fn files(&self) -> &LoadState<Vec<String>> {
        &self.files
    }

    #[must_use]
    pub fn tabs(&self) -> &TabManager<S> {
        &self.tabs
    }

    #[must_use]
    pub fn azdo_targets(&self) -> &LoadState<Vec<String>> {
        &self.azdo_targets
    }

    #[must_use]
    pub fn connection(&self) -> &LoadState<ConnectionStatus> {
        &self.connection
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        self.tabs.surface()
    }

    #[must_use]
    pub fn view(&self) -> StudioView {
        StudioView::from_session(self)
    }

    fn require_workspace(&self) -> Result<String, InputError> {
        self.active_workspace()
            .map(ToString::to_string)
            .ok_or(InputError::NoActiveWorkspace)
    }
}
