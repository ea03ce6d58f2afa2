//! Markup for each painted region of the shell, plus the click/keyboard
//! action vocabulary carried in `data-action` attributes.
//!
//! Bubble html arrives already escaped or sanitized from the core view; every
//! other string is escaped here.

use std::fmt::Write as _;

use plugin_studio_core::markup::escape_text;
use plugin_studio_core::view::{AzdoView, BubbleView, FilesView, PickerView, TabView};
use plugin_studio_core::{ChatRole, MessageTone, Screen};

use crate::wasm_constants::{
    ACTION_ATTR, AZDO_PUSH_BUTTON_ID, AZDO_STATUS_ID, AZDO_TARGET_SELECT_ID,
    CONVERSATION_INPUT_ID, CONVERSATION_MESSAGES_ID, CREATION_INPUT_ID, CREATION_MESSAGES_ID,
    EDITOR_CHAT_INPUT_ID, EDITOR_CHAT_MESSAGES_ID, EDITOR_ID, FILE_LIST_ID, NAME_ATTR,
    PICKER_SCREEN_ID, SAVE_BUTTON_ID, TAB_STRIP_ID, WORKSPACE_LIST_ID, WORKSPACE_SCREEN_ID,
    WORKSPACE_TITLE_ID,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UiAction {
    RefreshWorkspaces,
    SelectWorkspace(String),
    ReturnToPicker,
    SendCreationMessage,
    SendMessage,
    SendEditorMessage,
    OpenFile(String),
    ActivateTab(String),
    CloseTab(String),
    Save,
    LoadAzdoTargets,
    PushToAzdo,
}

impl UiAction {
    /// Decodes a `data-action` value and its optional `data-name`.
    pub(crate) fn parse(action: &str, name: Option<String>) -> Option<Self> {
        let named = |build: fn(String) -> Self| name.clone().map(build);
        match action {
            "refresh-workspaces" => Some(Self::RefreshWorkspaces),
            "select-workspace" => named(Self::SelectWorkspace),
            "return-to-picker" => Some(Self::ReturnToPicker),
            "send-creation" => Some(Self::SendCreationMessage),
            "send-message" => Some(Self::SendMessage),
            "send-editor" => Some(Self::SendEditorMessage),
            "open-file" => named(Self::OpenFile),
            "activate-tab" => named(Self::ActivateTab),
            "close-tab" => named(Self::CloseTab),
            "save" => Some(Self::Save),
            "load-azdo-targets" => Some(Self::LoadAzdoTargets),
            "push-azdo" => Some(Self::PushToAzdo),
            _ => None,
        }
    }

    /// The send action an Enter keypress in `input_id` triggers.
    pub(crate) fn for_submit(input_id: &str) -> Option<Self> {
        match input_id {
            CREATION_INPUT_ID => Some(Self::SendCreationMessage),
            CONVERSATION_INPUT_ID => Some(Self::SendMessage),
            EDITOR_CHAT_INPUT_ID => Some(Self::SendEditorMessage),
            _ => None,
        }
    }
}

fn action_button(out: &mut String, class: &str, action: &str, name: &str, label: &str) {
    let _ = write!(
        out,
        "<button type=\"button\" class=\"{class}\" {ACTION_ATTR}=\"{action}\" \
         {NAME_ATTR}=\"{}\">{}</button>",
        escape_text(name),
        escape_text(label)
    );
}

/// Static skeleton. Regions listed here are repainted by id.
pub(crate) fn shell_layout_html() -> String {
    format!(
        "<section id=\"{PICKER_SCREEN_ID}\" class=\"screen picker\">\
           <header><h1>Plugin Studio</h1>\
             <button type=\"button\" {ACTION_ATTR}=\"refresh-workspaces\">Refresh</button>\
           </header>\
           <div id=\"{WORKSPACE_LIST_ID}\" class=\"workspace-list\"></div>\
           <div id=\"{CREATION_MESSAGES_ID}\" class=\"messages\"></div>\
           <div class=\"composer\">\
             <input id=\"{CREATION_INPUT_ID}\" type=\"text\" \
               placeholder=\"Describe a new plugin project\">\
             <button type=\"button\" {ACTION_ATTR}=\"send-creation\">Send</button>\
           </div>\
         </section>\
         <section id=\"{WORKSPACE_SCREEN_ID}\" class=\"screen workspace\">\
           <header>\
             <button type=\"button\" {ACTION_ATTR}=\"return-to-picker\">Workspaces</button>\
             <h1 id=\"{WORKSPACE_TITLE_ID}\"></h1>\
             <span id=\"{AZDO_STATUS_ID}\" class=\"azdo-status\"></span>\
             <button type=\"button\" {ACTION_ATTR}=\"load-azdo-targets\">Targets</button>\
             <select id=\"{AZDO_TARGET_SELECT_ID}\"></select>\
             <button type=\"button\" id=\"{AZDO_PUSH_BUTTON_ID}\" \
               {ACTION_ATTR}=\"push-azdo\">Push to Azure DevOps</button>\
           </header>\
           <div id=\"{CONVERSATION_MESSAGES_ID}\" class=\"messages\"></div>\
           <div class=\"composer\">\
             <input id=\"{CONVERSATION_INPUT_ID}\" type=\"text\" placeholder=\"Message\">\
             <button type=\"button\" {ACTION_ATTR}=\"send-message\">Send</button>\
           </div>\
           <aside id=\"{FILE_LIST_ID}\" class=\"files\"></aside>\
           <div class=\"editor-panel\">\
             <nav id=\"{TAB_STRIP_ID}\" class=\"tabs\"></nav>\
             <textarea id=\"{EDITOR_ID}\" spellcheck=\"false\" disabled></textarea>\
             <button type=\"button\" id=\"{SAVE_BUTTON_ID}\" \
               {ACTION_ATTR}=\"save\" disabled>Save</button>\
             <div id=\"{EDITOR_CHAT_MESSAGES_ID}\" class=\"messages\"></div>\
             <div class=\"composer\">\
               <input id=\"{EDITOR_CHAT_INPUT_ID}\" type=\"text\" \
                 placeholder=\"Ask about this file\">\
               <button type=\"button\" {ACTION_ATTR}=\"send-editor\">Send</button>\
             </div>\
           </div>\
         </section>"
    )
}

pub(crate) fn workspace_title(screen: &Screen) -> &str {
    match screen {
        Screen::Picker => "",
        Screen::Workspace { name } => name,
    }
}

pub(crate) fn workspace_list_html(picker: &PickerView) -> String {
    let mut out = String::new();
    if let Some(error) = &picker.error {
        let _ = write!(out, "<p class=\"error\">{}</p>", escape_text(error));
    }
    if picker.loading {
        out.push_str("<p class=\"loading\">Loading workspaces…</p>");
    } else if picker.workspaces.is_empty() && picker.error.is_none() {
        out.push_str("<p class=\"empty\">No workspaces yet.</p>");
    }
    for name in &picker.workspaces {
        action_button(&mut out, "workspace", "select-workspace", name, name);
    }
    out
}

pub(crate) fn bubbles_html(bubbles: &[BubbleView]) -> String {
    let mut out = String::new();
    for bubble in bubbles {
        let side = match bubble.side {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        };
        let tone = match bubble.tone {
            MessageTone::Reply => "reply",
            MessageTone::Pending => "pending",
            MessageTone::Error => "error",
            MessageTone::Notice => "notice",
        };
        let _ = write!(
            out,
            "<div class=\"bubble {side} {tone}\">{}</div>",
            bubble.html
        );
    }
    out
}

pub(crate) fn file_list_html(files: &FilesView) -> String {
    if files.loading {
        return "<p class=\"loading\">Loading files…</p>".to_string();
    }
    if let Some(error) = &files.error {
        return format!("<p class=\"error\">{}</p>", escape_text(error));
    }
    if files.entries.is_empty() {
        return "<p class=\"empty\">No files.</p>".to_string();
    }

    let mut out = String::from("<ul>");
    for entry in &files.entries {
        let mut classes = vec!["file"];
        if entry.open {
            classes.push("open");
        }
        if entry.active {
            classes.push("active");
        }
        if entry.loading {
            classes.push("loading");
        }
        if entry.error.is_some() {
            classes.push("failed");
        }
        out.push_str("<li>");
        action_button(&mut out, &classes.join(" "), "open-file", &entry.name, &entry.name);
        if let Some(error) = &entry.error {
            let _ = write!(out, "<span class=\"error\">{}</span>", escape_text(error));
        }
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    out
}

pub(crate) fn tab_strip_html(tabs: &[TabView]) -> String {
    let mut out = String::new();
    for tab in tabs {
        let class = if tab.active { "tab active" } else { "tab" };
        let label = if tab.dirty {
            format!("{} •", tab.filename)
        } else {
            tab.filename.clone()
        };
        let _ = write!(out, "<span class=\"{class}\">");
        action_button(&mut out, "tab-label", "activate-tab", &tab.filename, &label);
        action_button(&mut out, "tab-close", "close-tab", &tab.filename, "×");
        out.push_str("</span>");
    }
    out
}

pub(crate) fn azdo_status_text(azdo: &AzdoView) -> &'static str {
    match azdo.connected {
        None => "Azure DevOps: checking…",
        Some(true) => "Azure DevOps: connected",
        Some(false) => "Azure DevOps: not connected",
    }
}

pub(crate) fn azdo_options_html(azdo: &AzdoView) -> String {
    if azdo.targets_loading {
        return "<option value=\"\">Loading targets…</option>".to_string();
    }
    if let Some(error) = &azdo.targets_error {
        return format!("<option value=\"\">{}</option>", escape_text(error));
    }
    let mut out = String::new();
    for target in &azdo.targets {
        let escaped = escape_text(target);
        let _ = write!(out, "<option value=\"{escaped}\">{escaped}</option>");
    }
    out
}

/// Push needs a confirmed connection and at least one target.
pub(crate) fn can_push(azdo: &AzdoView) -> bool {
    azdo.connected == Some(true) && !azdo.targets.is_empty()
}
