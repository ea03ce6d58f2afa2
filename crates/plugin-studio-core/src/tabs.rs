//! Open file tabs over a single shared editor surface.
//!
//! The manager owns every tab and the active pointer. The surface is only
//! ever shown the active tab's buffer; edits come back through
//! [`TabManager::edit_active`]. Opens and saves are two-phase: `begin_*`
//! hands out a ticket for the remote call and `finish_*` applies the result
//! only while the ticket is still current.

use std::collections::BTreeMap;

use crate::backend::BackendError;
use crate::buffer::TextBuffer;
use crate::requests::{RequestCounter, RequestToken};

/// The one editor widget tabs are displayed in.
pub trait EditorSurface {
    /// Binds the surface to `filename` and displays `buffer`.
    fn show(&mut self, filename: &str, buffer: &TextBuffer);

    /// Unbinds the surface and blanks it.
    fn clear(&mut self);
}

/// Surface with no widget behind it. Records what it was last shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetachedSurface {
    bound: Option<(String, String)>,
    binds: usize,
}

impl DetachedSurface {
    #[must_use]
    pub fn bound_filename(&self) -> Option<&str> {
        self.bound.as_ref().map(|(filename, _)| filename.as_str())
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.bound.as_ref().map(|(_, text)| text.as_str())
    }

    #[must_use]
    pub fn bind_count(&self) -> usize {
        self.binds
    }
}

impl EditorSurface for DetachedSurface {
    fn show(&mut self, filename: &str, buffer: &TextBuffer) {
        self.bound = Some((filename.to_string(), buffer.text().to_string()));
        self.binds += 1;
    }

    fn clear(&mut self) {
        self.bound = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorTab {
    filename: String,
    buffer: TextBuffer,
}

impl EditorTab {
    fn new(filename: String, content: String) -> Self {
        Self {
            filename,
            buffer: TextBuffer::new(content),
        }
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.buffer.is_dirty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenStart {
    /// The file already had a tab; it is now active.
    Activated,
    /// A fetch for the file is in flight; it will take focus when it lands.
    AlreadyLoading,
    /// Fetch the content, then pass the result to [`TabManager::finish_open`].
    Fetch(OpenTicket),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTicket {
    pub filename: String,
    pub token: RequestToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened { activated: bool },
    Failed,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTicket {
    pub filename: String,
    pub content: String,
    pub token: RequestToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { filename: String },
    Failed { filename: String, error: BackendError },
    Stale,
}

#[derive(Debug)]
pub struct TabManager<S> {
    tabs: Vec<EditorTab>,
    active: Option<usize>,
    pending_opens: BTreeMap<String, RequestToken>,
    // The open that should take focus when it lands. Cleared whenever the
    // user activates a tab directly.
    focus: Option<RequestToken>,
    open_errors: BTreeMap<String, BackendError>,
    // Latest save per file. Older completions for the same file are stale.
    pending_saves: BTreeMap<String, RequestToken>,
    counter: RequestCounter,
    surface: S,
}

impl<S: EditorSurface> TabManager<S> {
    pub fn new(surface: S) -> Self {
        Self {
            tabs: Vec::new(),
            active: None,
            pending_opens: BTreeMap::new(),
            focus: None,
            open_errors: BTreeMap::new(),
            pending_saves: BTreeMap::new(),
            counter: RequestCounter::default(),
            surface,
        }
    }

    /// Opens `filename`, or activates it when a tab for it already exists.
    pub fn begin_open(&mut self, filename: &str) -> OpenStart {
        self.open_errors.remove(filename);

        if let Some(index) = self.position(filename) {
            self.focus = None;
            self.activate_index(index);
            return OpenStart::Activated;
        }
        if let Some(token) = self.pending_opens.get(filename) {
            self.focus = Some(*token);
            return OpenStart::AlreadyLoading;
        }

        let token = self.counter.next_token();
        self.pending_opens.insert(filename.to_string(), token);
        self.focus = Some(token);
        tracing::debug!(filename, generation = token.generation(), "fetching file");
        OpenStart::Fetch(OpenTicket {
            filename: filename.to_string(),
            token,
        })
    }

    pub fn finish_open(
        &mut self,
        ticket: &OpenTicket,
        result: Result<String, BackendError>,
    ) -> OpenOutcome {
        if self.pending_opens.get(&ticket.filename) != Some(&ticket.token) {
            tracing::debug!(filename = %ticket.filename, "discarding stale file content");
            return OpenOutcome::Stale;
        }
        self.pending_opens.remove(&ticket.filename);

        let focused = self.focus == Some(ticket.token);
        if focused {
            self.focus = None;
        }

        match result {
            Err(error) => {
                tracing::warn!(filename = %ticket.filename, error = %error, "failed to open file");
                self.open_errors.insert(ticket.filename.clone(), error);
                OpenOutcome::Failed
            }
            Ok(_) if self.position(&ticket.filename).is_some() => OpenOutcome::Stale,
            Ok(content) => {
                self.tabs
                    .push(EditorTab::new(ticket.filename.clone(), content));
                let activated = focused || self.active.is_none();
                if activated {
                    self.activate_index(self.tabs.len() - 1);
                }
                OpenOutcome::Opened { activated }
            }
        }
    }

    /// Makes an existing tab active. Returns false when no such tab is open.
    pub fn activate(&mut self, filename: &str) -> bool {
        let Some(index) = self.position(filename) else {
            return false;
        };
        self.focus = None;
        self.activate_index(index);
        true
    }

    /// Closes a tab. When it was active, focus moves to the tab that shifts
    /// into its place, else the one before it, else nothing.
    pub fn close(&mut self, filename: &str) -> bool {
        let Some(index) = self.position(filename) else {
            return false;
        };
        let removed = self.tabs.remove(index);
        if removed.is_dirty() {
            tracing::warn!(filename, "closed tab with unsaved edits");
        }

        match self.active {
            Some(active) if active == index => {
                if self.tabs.is_empty() {
                    self.active = None;
                    self.surface.clear();
                } else {
                    self.activate_index(index.min(self.tabs.len() - 1));
                }
            }
            Some(active) if active > index => self.active = Some(active - 1),
            _ => {}
        }
        true
    }

    /// Applies an edit from the surface to the active buffer.
    pub fn edit_active(&mut self, text: impl Into<String>) -> bool {
        let Some(index) = self.active else {
            return false;
        };
        self.tabs
            .get_mut(index)
            .is_some_and(|tab| tab.buffer.set_text(text))
    }

    /// Snapshots the active buffer for saving.
    pub fn begin_save(&mut self) -> Option<SaveTicket> {
        let tab = self.active_tab()?;
        let filename = tab.filename.clone();
        let content = tab.buffer.text().to_string();
        let token = self.counter.next_token();
        self.pending_saves.insert(filename.clone(), token);
        Some(SaveTicket {
            filename,
            content,
            token,
        })
    }

    pub fn finish_save(
        &mut self,
        ticket: &SaveTicket,
        result: Result<(), BackendError>,
    ) -> SaveOutcome {
        if self.pending_saves.get(&ticket.filename) != Some(&ticket.token) {
            tracing::debug!(filename = %ticket.filename, "discarding stale save result");
            return SaveOutcome::Stale;
        }
        self.pending_saves.remove(&ticket.filename);
        match result {
            Ok(()) => {
                if let Some(tab) = self
                    .tabs
                    .iter_mut()
                    .find(|tab| tab.filename == ticket.filename)
                {
                    tab.buffer.mark_saved(&ticket.content);
                }
                SaveOutcome::Saved {
                    filename: ticket.filename.clone(),
                }
            }
            Err(error) => {
                tracing::warn!(filename = %ticket.filename, error = %error, "failed to save file");
                SaveOutcome::Failed {
                    filename: ticket.filename.clone(),
                    error,
                }
            }
        }
    }

    /// Discards every tab and outstanding request and blanks the surface.
    pub fn reset(&mut self) {
        let dirty: Vec<&str> = self
            .tabs
            .iter()
            .filter(|tab| tab.is_dirty())
            .map(EditorTab::filename)
            .collect();
        if !dirty.is_empty() {
            tracing::warn!(files = ?dirty, "discarding unsaved edits");
        }

        self.tabs.clear();
        self.active = None;
        self.pending_opens.clear();
        self.focus = None;
        self.open_errors.clear();
        self.pending_saves.clear();
        self.surface.clear();
    }

    #[must_use]
    pub fn tabs(&self) -> &[EditorTab] {
        &self.tabs
    }

    #[must_use]
    pub fn active_tab(&self) -> Option<&EditorTab> {
        self.active.and_then(|index| self.tabs.get(index))
    }

    #[must_use]
    pub fn active_filename(&self) -> Option<&str> {
        self.active_tab().map(EditorTab::filename)
    }

    #[must_use]
    pub fn open_error(&self, filename: &str) -> Option<&BackendError> {
        self.open_errors.get(filename)
    }

    #[must_use]
    pub fn is_loading(&self, filename: &str) -> bool {
        self.pending_opens.contains_key(filename)
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        !self.pending_saves.is_empty()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn position(&self, filename: &str) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.filename == filename)
    }

    fn activate_index(&mut self, index: usize) {
        if let Some(tab) = self.tabs.get(index) {
            self.active = Some(index);
            self.surface.show(&tab.filename, &tab.buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> TabManager<DetachedSurface> {
        TabManager::new(DetachedSurface::default())
    }

    fn open(tabs: &mut TabManager<DetachedSurface>, filename: &str, content: &str) {
        let OpenStart::Fetch(ticket) = tabs.begin_open(filename) else {
            panic!("expected a fetch for {filename}");
        };
        assert_eq!(
            tabs.finish_open(&ticket, Ok(content.to_string())),
            OpenOutcome::Opened { activated: true }
        );
    }

    fn names(tabs: &TabManager<DetachedSurface>) -> Vec<&str> {
        tabs.tabs().iter().map(EditorTab::filename).collect()
    }

    #[test]
    fn reopening_a_file_activates_without_fetching() {
        let mut tabs = manager();
        open(&mut tabs, "A.cs", "class A {}");
        open(&mut tabs, "B.cs", "class B {}");

        assert_eq!(tabs.begin_open("A.cs"), OpenStart::Activated);
        assert_eq!(names(&tabs), vec!["A.cs", "B.cs"]);
        assert_eq!(tabs.active_filename(), Some("A.cs"));
        assert_eq!(tabs.surface().text(), Some("class A {}"));
    }

    #[test]
    fn open_in_flight_is_not_fetched_twice() {
        let mut tabs = manager();
        let OpenStart::Fetch(ticket) = tabs.begin_open("A.cs") else {
            panic!("expected fetch");
        };
        assert_eq!(tabs.begin_open("A.cs"), OpenStart::AlreadyLoading);
        assert!(tabs.is_loading("A.cs"));

        tabs.finish_open(&ticket, Ok(String::new()));
        assert_eq!(names(&tabs), vec!["A.cs"]);
    }

    #[test]
    fn alpha_walkthrough_ends_with_cleared_surface() {
        let mut tabs = manager();
        open(&mut tabs, "A.cs", "a");
        assert_eq!(tabs.active_filename(), Some("A.cs"));

        open(&mut tabs, "B.cs", "b");
        assert_eq!(names(&tabs), vec!["A.cs", "B.cs"]);
        assert_eq!(tabs.active_filename(), Some("B.cs"));

        assert!(tabs.close("A.cs"));
        assert_eq!(names(&tabs), vec!["B.cs"]);
        assert_eq!(tabs.active_filename(), Some("B.cs"));

        assert!(tabs.close("B.cs"));
        assert!(tabs.tabs().is_empty());
        assert_eq!(tabs.active_filename(), None);
        assert_eq!(tabs.surface().bound_filename(), None);
    }

    #[test]
    fn closing_active_prefers_next_then_previous() {
        let mut tabs = manager();
        for name in ["A.cs", "B.cs", "C.cs"] {
            open(&mut tabs, name, name);
        }

        tabs.activate("B.cs");
        tabs.close("B.cs");
        assert_eq!(tabs.active_filename(), Some("C.cs"));
        assert_eq!(tabs.surface().bound_filename(), Some("C.cs"));

        tabs.close("C.cs");
        assert_eq!(tabs.active_filename(), Some("A.cs"));
    }

    #[test]
    fn closing_inactive_tab_keeps_active() {
        let mut tabs = manager();
        for name in ["A.cs", "B.cs", "C.cs"] {
            open(&mut tabs, name, name);
        }
        let binds = tabs.surface().bind_count();

        tabs.close("A.cs");
        assert_eq!(tabs.active_filename(), Some("C.cs"));
        assert_eq!(tabs.surface().bind_count(), binds);
        assert!(!tabs.close("missing.cs"));
    }

    #[test]
    fn edits_survive_switching_tabs() {
        let mut tabs = manager();
        open(&mut tabs, "A.cs", "original");
        assert!(tabs.edit_active("edited"));
        open(&mut tabs, "B.cs", "b");

        tabs.activate("A.cs");
        assert_eq!(tabs.surface().text(), Some("edited"));
        assert!(tabs.active_tab().is_some_and(EditorTab::is_dirty));
    }

    #[test]
    fn latest_requested_open_wins_focus() {
        let mut tabs = manager();
        let OpenStart::Fetch(first) = tabs.begin_open("A.cs") else {
            panic!("expected fetch");
        };
        let OpenStart::Fetch(second) = tabs.begin_open("B.cs") else {
            panic!("expected fetch");
        };

        assert_eq!(
            tabs.finish_open(&second, Ok("b".to_string())),
            OpenOutcome::Opened { activated: true }
        );
        assert_eq!(
            tabs.finish_open(&first, Ok("a".to_string())),
            OpenOutcome::Opened { activated: false }
        );
        assert_eq!(names(&tabs), vec!["B.cs", "A.cs"]);
        assert_eq!(tabs.active_filename(), Some("B.cs"));
    }

    #[test]
    fn failed_open_records_error_until_retry() {
        let mut tabs = manager();
        let OpenStart::Fetch(ticket) = tabs.begin_open("A.cs") else {
            panic!("expected fetch");
        };
        assert_eq!(
            tabs.finish_open(&ticket, Err(BackendError::http(404, "missing"))),
            OpenOutcome::Failed
        );
        assert!(tabs.tabs().is_empty());
        assert!(tabs.open_error("A.cs").is_some());

        let OpenStart::Fetch(_) = tabs.begin_open("A.cs") else {
            panic!("expected a fresh fetch");
        };
        assert!(tabs.open_error("A.cs").is_none());
    }

    #[test]
    fn reset_discards_tabs_and_late_results() {
        let mut tabs = manager();
        open(&mut tabs, "A.cs", "a");
        tabs.edit_active("dirty");
        let save = tabs.begin_save().expect("active tab");
        let OpenStart::Fetch(pending) = tabs.begin_open("B.cs") else {
            panic!("expected fetch");
        };

        tabs.reset();
        assert!(tabs.tabs().is_empty());
        assert_eq!(tabs.surface().bound_filename(), None);
        assert_eq!(
            tabs.finish_open(&pending, Ok("b".to_string())),
            OpenOutcome::Stale
        );
        assert_eq!(tabs.finish_save(&save, Ok(())), SaveOutcome::Stale);
        assert!(tabs.tabs().is_empty());
    }

    #[test]
    fn save_marks_snapshot_clean_and_keeps_focus() {
        let mut tabs = manager();
        open(&mut tabs, "A.cs", "a");
        open(&mut tabs, "B.cs", "b");
        tabs.edit_active("b2");

        let ticket = tabs.begin_save().expect("active tab");
        assert_eq!(ticket.filename, "B.cs");
        assert_eq!(ticket.content, "b2");

        assert_eq!(
            tabs.finish_save(&ticket, Ok(())),
            SaveOutcome::Saved {
                filename: "B.cs".to_string()
            }
        );
        assert_eq!(names(&tabs), vec!["A.cs", "B.cs"]);
        assert_eq!(tabs.active_filename(), Some("B.cs"));
        assert!(!tabs.active_tab().is_some_and(EditorTab::is_dirty));
    }

    #[test]
    fn older_save_completing_late_is_stale() {
        let mut tabs = manager();
        open(&mut tabs, "A.cs", "a");
        tabs.edit_active("v1");
        let first = tabs.begin_save().expect("active tab");
        tabs.edit_active("v2");
        let second = tabs.begin_save().expect("active tab");

        assert_eq!(
            tabs.finish_save(&second, Ok(())),
            SaveOutcome::Saved {
                filename: "A.cs".to_string()
            }
        );
        assert_eq!(tabs.finish_save(&first, Ok(())), SaveOutcome::Stale);
        assert!(!tabs.active_tab().is_some_and(EditorTab::is_dirty));
        assert!(!tabs.is_saving());
    }

    #[test]
    fn saves_of_different_files_complete_independently() {
        let mut tabs = manager();
        open(&mut tabs, "A.cs", "a");
        tabs.edit_active("a2");
        let save_a = tabs.begin_save().expect("active tab");
        open(&mut tabs, "B.cs", "b");
        tabs.edit_active("b2");
        let save_b = tabs.begin_save().expect("active tab");

        assert!(matches!(
            tabs.finish_save(&save_a, Ok(())),
            SaveOutcome::Saved { .. }
        ));
        assert!(tabs.is_saving());
        assert!(matches!(
            tabs.finish_save(&save_b, Ok(())),
            SaveOutcome::Saved { .. }
        ));
        assert!(tabs.tabs().iter().all(|tab| !tab.is_dirty()));
    }

    #[test]
    fn failed_save_leaves_buffer_dirty() {
        let mut tabs = manager();
        open(&mut tabs, "A.cs", "a");
        tabs.edit_active("a2");
        let ticket = tabs.begin_save().expect("active tab");

        let outcome = tabs.finish_save(&ticket, Err(BackendError::network("offline")));
        assert!(matches!(outcome, SaveOutcome::Failed { .. }));
        assert!(tabs.active_tab().is_some_and(EditorTab::is_dirty));
    }
}
