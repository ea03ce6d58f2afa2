//! Client-side session state for Plugin Studio.
//!
//! Nothing in this crate performs I/O. Remote calls go through
//! [`StudioBackend`], which the native HTTP client and the browser shell each
//! implement, and the editor widget is reached through [`EditorSurface`].

#![cfg_attr(test, allow(clippy::expect_used, clippy::panic))]

pub mod backend;
pub mod buffer;
pub mod controller;
pub mod conversation;
pub mod input;
pub mod markup;
pub mod requests;
pub mod session;
pub mod tabs;
pub mod view;
pub mod wire;

pub use backend::{BackendError, BackendErrorKind, StudioBackend};
pub use buffer::TextBuffer;
pub use controller::StudioController;
pub use conversation::{
    ChatMessage, ConversationState, HistoryMode, MessageTone, PENDING_PLACEHOLDER,
    PendingReply, WORKSPACE_GREETING,
};
pub use input::InputError;
pub use requests::{RequestCounter, RequestSlot, RequestToken};
pub use session::{
    ChatCompletion, ChatPanel, ChatTicket, FileOpenStart, FileOpenTicket, FilesTicket, LoadState,
    SaveRequest, Screen, StudioSession,
};
pub use tabs::{
    DetachedSurface, EditorSurface, EditorTab, OpenOutcome, OpenStart, OpenTicket, SaveOutcome,
    SaveTicket, TabManager,
};
pub use view::StudioView;
pub use wire::{ChatRequest, ChatRole, ChatTurn, ConnectionStatus};
