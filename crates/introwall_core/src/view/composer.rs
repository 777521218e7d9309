//! Comment composer state.
//!
//! The submit control is disabled while a post is in flight or when the
//! body is blank. A failed post keeps the input so the user can retry.

use crate::model::comment::CommentDraft;
use crate::store::{AddOutcome, CommentStore, StoreResult};

/// Top-level comment composer of one card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composer {
    pub nick: String,
    pub text: String,
    posting: bool,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_posting(&self) -> bool {
        self.posting
    }

    pub fn can_submit(&self) -> bool {
        !self.posting && !self.text.trim().is_empty()
    }

    /// Marks a post as in flight and returns the draft to send.
    ///
    /// Returns `None` when the submit control is disabled.
    pub fn begin_submit(&mut self) -> Option<CommentDraft> {
        if !self.can_submit() {
            return None;
        }
        self.posting = true;
        Some(CommentDraft::new(self.nick.clone(), self.text.clone()))
    }

    /// Re-enables the control; clears the body only after a success.
    pub fn finish_submit(&mut self, result: &StoreResult<AddOutcome>) {
        self.posting = false;
        if result.is_ok() {
            self.text.clear();
        }
    }

    /// Posts the current input through `store`.
    pub fn submit(&mut self, store: &mut dyn CommentStore) -> StoreResult<AddOutcome> {
        let Some(draft) = self.begin_submit() else {
            return Ok(AddOutcome::Ignored);
        };
        let result = store.add(&draft);
        self.finish_submit(&result);
        result
    }
}

/// Inline reply form under one comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyComposer {
    parent_id: String,
    open: bool,
    pub nick: String,
    pub text: String,
}

impl ReplyComposer {
    pub fn new(parent_id: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            open: false,
            nick: String::new(),
            text: String::new(),
        }
    }

    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Opens or collapses the form.
    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    /// Label of the toggle control.
    pub fn toggle_label(&self) -> &'static str {
        if self.open {
            "collapse"
        } else {
            "reply"
        }
    }

    /// Sends the reply. On success both buffers are cleared and the form
    /// closes; a closed form or blank body submits nothing.
    pub fn submit(&mut self, store: &mut dyn CommentStore) -> StoreResult<AddOutcome> {
        if !self.open || self.text.trim().is_empty() {
            return Ok(AddOutcome::Ignored);
        }
        let draft =
            CommentDraft::new(self.nick.clone(), self.text.clone()).reply_to(self.parent_id.clone());
        let outcome = store.add(&draft)?;
        self.nick.clear();
        self.text.clear();
        self.open = false;
        Ok(outcome)
    }
}
