//! Render-ready snapshot of a session. Every string that ends up as markup
//! has already been escaped or sanitized here, so painters can assign
//! `html` fields directly.

use serde::Serialize;

use crate::conversation::{ChatMessage, ConversationState, MessageTone};
use crate::markup::{escape_text, sanitize_assistant_markup};
use crate::session::{Screen, StudioSession};
use crate::tabs::EditorSurface;
use crate::wire::ChatRole;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudioView {
    pub screen: Screen,
    pub picker: PickerView,
    pub creation_chat: Vec<BubbleView>,
    pub conversation: Vec<BubbleView>,
    pub editor_chat: Vec<BubbleView>,
    pub files: FilesView,
    pub tabs: Vec<TabView>,
    pub active_tab: Option<String>,
    pub can_save: bool,
    pub saving: bool,
    pub azdo: AzdoView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickerView {
    pub workspaces: Vec<String>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BubbleView {
    pub side: ChatRole,
    pub tone: MessageTone,
    pub html: String,
}

impl BubbleView {
    fn from_message(message: &ChatMessage) -> Self {
        let html = match (message.role, message.tone) {
            (ChatRole::Assistant, MessageTone::Reply) => {
                sanitize_assistant_markup(&message.content)
            }
            _ => escape_text(&message.content),
        };
        Self {
            side: message.role,
            tone: message.tone,
            html,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilesView {
    pub loading: bool,
    pub error: Option<String>,
    pub entries: Vec<FileEntryView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntryView {
    pub name: String,
    pub open: bool,
    pub active: bool,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabView {
    pub filename: String,
    pub active: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AzdoView {
    /// `None` until the status check has answered.
    pub connected: Option<bool>,
    pub targets: Vec<String>,
    pub targets_loading: bool,
    pub targets_error: Option<String>,
}

fn bubbles(conversation: &ConversationState) -> Vec<BubbleView> {
    conversation
        .messages()
        .iter()
        .map(BubbleView::from_message)
        .collect()
}

impl StudioView {
    pub fn from_session<S: EditorSurface>(session: &StudioSession<S>) -> Self {
        let tabs = session.tabs();
        let active = tabs.active_filename();

        let entries = session
            .files()
            .ready()
            .map(|names| {
                names
                    .iter()
                    .map(|name| FileEntryView {
                        name: name.clone(),
                        open: tabs.tabs().iter().any(|tab| tab.filename() == name),
                        active: active == Some(name.as_str()),
                        loading: tabs.is_loading(name),
                        error: tabs.open_error(name).map(|error| error.display_text()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            screen: session.screen().clone(),
            picker: PickerView {
                workspaces: session.workspaces().to_vec(),
                loading: session.workspaces_loading(),
                error: session.workspaces_error().map(|error| error.display_text()),
            },
            creation_chat: bubbles(session.creation_chat()),
            conversation: bubbles(session.conversation()),
            editor_chat: bubbles(session.editor_chat()),
            files: FilesView {
                loading: session.files().is_loading(),
                error: session.files().error().map(|error| error.display_text()),
                entries,
            },
            tabs: tabs
                .tabs()
                .iter()
                .map(|tab| TabView {
                    filename: tab.filename().to_string(),
                    active: active == Some(tab.filename()),
                    dirty: tab.is_dirty(),
                })
                .collect(),
            active_tab: active.map(ToString::to_string),
            can_save: active.is_some(),
            saving: tabs.is_saving(),
            azdo: AzdoView {
                connected: session.connection().ready().map(|status| status.azdo),
                targets: session.azdo_targets().ready().cloned().unwrap_or_default(),
                targets_loading: session.azdo_targets().is_loading(),
                targets_error: session
                    .azdo_targets()
                    .error()
                    .map(|error| error.display_text()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::session::FileOpenStart;
    use crate::tabs::DetachedSurface;

    fn alpha() -> StudioSession<DetachedSurface> {
        let mut session = StudioSession::new(DetachedSurface::default());
        let ticket = session.select_workspace("Alpha").expect("select");
        session.finish_load_files(
            &ticket,
            Ok(vec!["A.cs".to_string(), "B.cs".to_string(), "C.cs".to_string()]),
        );
        session
    }

    fn open(
        session: &mut StudioSession<DetachedSurface>,
        name: &str,
        result: Result<String, BackendError>,
    ) {
        let FileOpenStart::Fetch(ticket) = session.begin_open_file(name).expect("open") else {
            panic!("expected fetch");
        };
        session.finish_open_file(&ticket, result);
    }

    #[test]
    fn user_text_is_escaped_and_replies_sanitized() {
        let mut session = alpha();
        let ticket = session
            .begin_send_message("<b>not bold</b>")
            .expect("send");
        session.finish_chat(
            &ticket,
            Ok("<b>Built</b><script>alert(1)</script>".to_string()),
        );

        let view = session.view();
        assert_eq!(view.conversation[1].side, ChatRole::User);
        assert_eq!(view.conversation[1].html, "&lt;b&gt;not bold&lt;/b&gt;");
        assert_eq!(view.conversation[2].html, "<b>Built</b>");
    }

    #[test]
    fn error_bubbles_are_escaped() {
        let mut session = alpha();
        let ticket = session.begin_send_message("go").expect("send");
        session.finish_chat(&ticket, Err(BackendError::http(500, "<i>boom</i>")));

        let last = session.view().conversation.pop().expect("bubble");
        assert_eq!(last.tone, MessageTone::Error);
        assert_eq!(last.html, "Error: HTTP 500: &lt;i&gt;boom&lt;/i&gt;");
    }

    #[test]
    fn file_entries_reflect_tab_state() {
        let mut session = alpha();
        open(&mut session, "A.cs", Ok("a".to_string()));
        open(&mut session, "B.cs", Err(BackendError::http(404, "missing")));
        session.edit_active_buffer("a2");

        let view = session.view();
        let a = &view.files.entries[0];
        assert!(a.open && a.active && a.error.is_none());
        let b = &view.files.entries[1];
        assert!(!b.open);
        assert_eq!(b.error.as_deref(), Some("HTTP 404: missing"));

        assert_eq!(
            view.tabs,
            vec![TabView {
                filename: "A.cs".to_string(),
                active: true,
                dirty: true,
            }]
        );
        assert!(view.can_save);
    }

    #[test]
    fn picker_view_serializes_screen_mode() {
        let session = StudioSession::new(DetachedSurface::default());
        let json = serde_json::to_value(session.view()).expect("serialize");
        assert_eq!(json["screen"]["mode"], "picker");
        assert_eq!(json["can_save"], false);
        assert!(json["azdo"]["connected"].is_null());
    }
}
