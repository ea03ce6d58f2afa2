/// Editable text backing one tab.
///
/// `saved` is the content last loaded from or written to the backend; the
/// buffer is dirty whenever the two differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
    saved: String,
    revision: u64,
}

impl TextBuffer {
    pub fn new(content: impl Into<String>) -> Self {
        let text = content.into();
        Self {
            saved: text.clone(),
            text,
            revision: 0,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.text != self.saved
    }

    /// Replaces the content. Returns false when nothing changed.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if text == self.text {
            return false;
        }
        self.text = text;
        self.revision = self.revision.saturating_add(1);
        true
    }

    /// Records `snapshot` as persisted. Edits made after the snapshot was
    /// taken keep the buffer dirty.
    pub fn mark_saved(&mut self, snapshot: &str) {
        snapshot.clone_into(&mut self.saved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_make_buffer_dirty_until_saved() {
        let mut buffer = TextBuffer::new("class A {}");
        assert!(!buffer.is_dirty());

        assert!(buffer.set_text("class A { int x; }"));
        assert!(buffer.is_dirty());
        assert_eq!(buffer.revision(), 1);

        buffer.mark_saved("class A { int x; }");
        assert!(!buffer.is_dirty());
    }

    #[test]
    fn identical_text_is_not_an_edit() {
        let mut buffer = TextBuffer::new("same");
        assert!(!buffer.set_text("same"));
        assert_eq!(buffer.revision(), 0);
    }

    #[test]
    fn save_of_older_snapshot_keeps_later_edits_dirty() {
        let mut buffer = TextBuffer::new("v0");
        buffer.set_text("v1");
        let snapshot = buffer.text().to_string();
        buffer.set_text("v2");

        buffer.mark_saved(&snapshot);
        assert!(buffer.is_dirty());
    }
}
