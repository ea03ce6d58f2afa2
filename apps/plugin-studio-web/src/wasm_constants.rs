pub(crate) const STUDIO_ROOT_ID: &str = "plugin-studio-root";

pub(crate) const PICKER_SCREEN_ID: &str = "plugin-studio-picker";
pub(crate) const WORKSPACE_LIST_ID: &str = "plugin-studio-workspaces";
pub(crate) const CREATION_MESSAGES_ID: &str = "plugin-studio-creation-messages";
pub(crate) const CREATION_INPUT_ID: &str = "plugin-studio-creation-input";

pub(crate) const WORKSPACE_SCREEN_ID: &str = "plugin-studio-workspace";
pub(crate) const WORKSPACE_TITLE_ID: &str = "plugin-studio-workspace-title";
pub(crate) const CONVERSATION_MESSAGES_ID: &str = "plugin-studio-conversation-messages";
pub(crate) const CONVERSATION_INPUT_ID: &str = "plugin-studio-conversation-input";
pub(crate) const FILE_LIST_ID: &str = "plugin-studio-files";
pub(crate) const TAB_STRIP_ID: &str = "plugin-studio-tabs";
pub(crate) const EDITOR_ID: &str = "plugin-studio-editor";
pub(crate) const SAVE_BUTTON_ID: &str = "plugin-studio-save";
pub(crate) const EDITOR_CHAT_MESSAGES_ID: &str = "plugin-studio-editor-chat-messages";
pub(crate) const EDITOR_CHAT_INPUT_ID: &str = "plugin-studio-editor-chat-input";
pub(crate) const AZDO_STATUS_ID: &str = "plugin-studio-azdo-status";
pub(crate) const AZDO_TARGET_SELECT_ID: &str = "plugin-studio-azdo-target";
pub(crate) const AZDO_PUSH_BUTTON_ID: &str = "plugin-studio-azdo-push";

pub(crate) const ACTION_ATTR: &str = "data-action";
pub(crate) const NAME_ATTR: &str = "data-name";
