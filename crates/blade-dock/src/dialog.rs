#![forbid(unsafe_code)]

//! Unsaved-changes confirmation.

/// Confirmation gate shown before discarding a dirty edit blade.
///
/// Holds the id of the blade waiting to be closed. The dialog is open exactly
/// while an id is pending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnsavedChangesDialog {
    pending: Option<String>,
}

impl UnsavedChangesDialog {
    pub const TITLE: &'static str = "Unsaved Changes";
    pub const MESSAGE: &'static str = "Are you sure you want to leave? There are unsaved changes. \
         If you leave, your changes will be lost.";
    pub const CONFIRM_LABEL: &'static str = "Discard Changes";
    pub const CANCEL_LABEL: &'static str = "Stay Here";
    /// Backdrop layer; above every blade and the dock.
    pub const OVERLAY_Z_INDEX: i32 = 10_030;
    pub const CONTENT_Z_INDEX: i32 = 10_031;

    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.pending.is_some()
    }

    /// The edit blade awaiting confirmation.
    #[must_use]
    pub fn pending_id(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Ask for confirmation before closing `id`. Replaces any earlier request.
    pub(crate) fn request(&mut self, id: impl Into<String>) {
        self.pending = Some(id.into());
    }

    /// Close the dialog and hand back the pending id.
    pub(crate) fn take(&mut self) -> Option<String> {
        self.pending.take()
    }
}
