use serde::Serialize;

use crate::backend::BackendError;
use crate::input::{InputError, normalize_message_text};
use crate::requests::{RequestCounter, RequestToken};
use crate::wire::{ChatRole, ChatTurn};

pub const WORKSPACE_GREETING: &str =
    "👋 Hi! Ask me to create, build, deploy, or manage your plugin projects!";
pub const PENDING_PLACEHOLDER: &str = "…";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageTone {
    /// A user message or an assistant reply. Only these travel as history.
    Reply,
    /// Stand-in shown while a reply is outstanding.
    Pending,
    Error,
    /// Client-side acknowledgement such as a save confirmation.
    Notice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub tone: MessageTone,
    #[serde(skip)]
    pending: Option<RequestToken>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content, MessageTone::Reply)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content, MessageTone::Reply)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content, MessageTone::Error)
    }

    pub fn notice(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content, MessageTone::Notice)
    }

    fn placeholder(token: RequestToken) -> Self {
        Self {
            pending: Some(token),
            ..Self::new(ChatRole::Assistant, PENDING_PLACEHOLDER, MessageTone::Pending)
        }
    }

    fn new(role: ChatRole, content: impl Into<String>, tone: MessageTone) -> Self {
        Self {
            role,
            content: content.into(),
            tone,
            pending: None,
        }
    }

    fn as_turn(&self) -> Option<ChatTurn> {
        (self.tone == MessageTone::Reply).then(|| ChatTurn {
            role: self.role,
            content: self.content.clone(),
        })
    }
}

/// Whether a conversation sends its prior turns with each message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    Full,
    Empty,
}

/// Everything needed to issue one chat call for a sent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    pub token: RequestToken,
    pub message: String,
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone)]
pub struct ConversationState {
    mode: HistoryMode,
    messages: Vec<ChatMessage>,
    counter: RequestCounter,
}

impl ConversationState {
    #[must_use]
    pub fn new(mode: HistoryMode) -> Self {
        Self {
            mode,
            messages: Vec::new(),
            counter: RequestCounter::default(),
        }
    }

    /// Drops every message, outstanding placeholders included, and optionally
    /// seeds a greeting. Replies still in flight no longer find their
    /// placeholder and are discarded on arrival.
    pub fn reset(&mut self, greeting: Option<&str>) {
        self.messages.clear();
        if let Some(greeting) = greeting {
            self.messages.push(ChatMessage::assistant(greeting));
        }
    }

    /// Appends the user message and a placeholder, and returns what to send.
    pub fn begin_send(&mut self, raw: &str) -> Result<PendingReply, InputError> {
        let message = normalize_message_text(raw)?;
        self.messages.push(ChatMessage::user(message.clone()));

        let history = match self.mode {
            HistoryMode::Full => self.messages.iter().filter_map(ChatMessage::as_turn).collect(),
            HistoryMode::Empty => Vec::new(),
        };
        let token = self.begin_background();
        Ok(PendingReply {
            token,
            message,
            history,
        })
    }

    /// Adds a placeholder for a reply the user did not type a message for.
    pub fn begin_background(&mut self) -> RequestToken {
        let token = self.counter.next_token();
        self.messages.push(ChatMessage::placeholder(token));
        token
    }

    /// Replaces the placeholder for `token` with the outcome. Returns false
    /// when the placeholder is gone.
    pub fn finish(&mut self, token: RequestToken, result: Result<String, BackendError>) -> bool {
        let Some(slot) = self
            .messages
            .iter_mut()
            .find(|message| message.pending == Some(token))
        else {
            tracing::debug!(
                generation = token.generation(),
                "discarding stale chat reply"
            );
            return false;
        };

        *slot = match result {
            Ok(reply) => ChatMessage::assistant(reply),
            Err(error) => {
                tracing::warn!(error = %error, "chat request failed");
                ChatMessage::error(format!("Error: {}", error.display_text()))
            }
        };
        true
    }

    pub fn append_notice(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::notice(text));
    }

    pub fn append_error(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::error(text));
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.messages.iter().any(|message| message.pending.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greeted() -> ConversationState {
        let mut conversation = ConversationState::new(HistoryMode::Full);
        conversation.reset(Some(WORKSPACE_GREETING));
        conversation
    }

    #[test]
    fn send_appends_user_message_and_placeholder() {
        let mut conversation = greeted();
        let pending = conversation.begin_send("  build it ").expect("send");

        assert_eq!(pending.message, "build it");
        let tones: Vec<_> = conversation.messages().iter().map(|m| m.tone).collect();
        assert_eq!(
            tones,
            vec![MessageTone::Reply, MessageTone::Reply, MessageTone::Pending]
        );
        assert_eq!(conversation.messages()[2].content, PENDING_PLACEHOLDER);
        assert!(conversation.is_waiting());
    }

    #[test]
    fn full_history_includes_greeting_and_new_message_only() {
        let mut conversation = greeted();
        let first = conversation.begin_send("one").expect("send");
        conversation.finish(first.token, Err(BackendError::http(500, "boom")));
        conversation.append_notice("💾 Saved A.cs");

        let second = conversation.begin_send("two").expect("send");
        let contents: Vec<_> = second.history.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec![WORKSPACE_GREETING, "one", "two"]);
    }

    #[test]
    fn empty_mode_sends_no_history() {
        let mut conversation = ConversationState::new(HistoryMode::Empty);
        let pending = conversation.begin_send("make a plugin").expect("send");
        assert!(pending.history.is_empty());
    }

    #[test]
    fn blank_message_changes_nothing() {
        let mut conversation = greeted();
        assert_eq!(
            conversation.begin_send("   "),
            Err(InputError::EmptyMessage)
        );
        assert_eq!(conversation.messages().len(), 1);
    }

    #[test]
    fn finish_replaces_placeholder_in_place() {
        let mut conversation = greeted();
        let first = conversation.begin_send("a").expect("send");
        let second = conversation.begin_send("b").expect("send");

        assert!(conversation.finish(second.token, Ok("reply b".to_string())));
        assert!(conversation.finish(first.token, Ok("reply a".to_string())));

        let contents: Vec<_> = conversation
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(
            contents,
            vec![WORKSPACE_GREETING, "a", "reply a", "b", "reply b"]
        );
        assert!(!conversation.is_waiting());
    }

    #[test]
    fn failure_becomes_error_message() {
        let mut conversation = greeted();
        let pending = conversation.begin_send("push").expect("send");
        conversation.finish(pending.token, Err(BackendError::network("offline")));

        let last = conversation.messages().last().expect("message");
        assert_eq!(last.tone, MessageTone::Error);
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.content, "Error: Network error: offline");
    }

    #[test]
    fn reply_after_reset_is_discarded() {
        let mut conversation = greeted();
        let pending = conversation.begin_send("slow").expect("send");
        conversation.reset(Some(WORKSPACE_GREETING));

        assert!(!conversation.finish(pending.token, Ok("late".to_string())));
        assert_eq!(conversation.messages().len(), 1);
    }
}
