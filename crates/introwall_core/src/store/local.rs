//! Local-storage comment backend.

use super::{AddOutcome, BackendKind, CommentStore, StoreResult, StoreStatus};
use crate::model::comment::{Comment, CommentDraft};
use crate::storage::comments_key;
use crate::storage::local::LocalStorage;
use log::{info, warn};

/// Comments of one person kept under `comments::{person_id}`.
///
/// Newest records come first, matching the prepend-on-add write path.
pub struct LocalCommentStore<'conn> {
    storage: LocalStorage<'conn>,
    person_id: String,
    key: String,
    comments: Vec<Comment>,
}

impl<'conn> LocalCommentStore<'conn> {
    /// Reads the stored list synchronously.
    ///
    /// Unreadable or malformed data degrades to an empty list.
    pub fn open(storage: LocalStorage<'conn>, person_id: &str) -> Self {
        let key = comments_key(person_id);
        let comments = match storage.get_json::<Vec<Comment>>(&key) {
            Ok(Some(comments)) => comments
                .into_iter()
                .filter(|comment| comment.person_id == person_id)
                .collect(),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(
                    "event=comments_load module=store status=degraded backend=local person_id={} error={}",
                    person_id, err
                );
                Vec::new()
            }
        };

        Self {
            storage,
            person_id: person_id.to_string(),
            key,
            comments,
        }
    }

    fn persist(&self) -> StoreResult<()> {
        self.storage.set_json(&self.key, &self.comments)?;
        Ok(())
    }
}

impl CommentStore for LocalCommentStore<'_> {
    fn person_id(&self) -> &str {
        &self.person_id
    }

    fn status(&self) -> StoreStatus {
        StoreStatus {
            loading: false,
            error: None,
            kind: BackendKind::Local,
        }
    }

    fn comments(&self) -> &[Comment] {
        &self.comments
    }

    fn add(&mut self, draft: &CommentDraft) -> StoreResult<AddOutcome> {
        let Ok(valid) = draft.validate() else {
            return Ok(AddOutcome::Ignored);
        };

        let comment = Comment::new_local(self.person_id.as_str(), &valid);
        self.comments.insert(0, comment.clone());
        if let Err(err) = self.persist() {
            self.comments.remove(0);
            return Err(err);
        }

        info!(
            "event=comment_add module=store status=ok backend=local person_id={} comment_id={} reply={}",
            self.person_id,
            comment.id,
            comment.parent_id.is_some()
        );
        Ok(AddOutcome::Stored(comment))
    }

    /// Removes `id` and its direct replies; deeper replies stay (and are
    /// shown as roots afterwards).
    fn remove(&mut self, id: &str) -> StoreResult<()> {
        let before = self.comments.len();
        let previous = self.comments.clone();
        self.comments
            .retain(|comment| comment.id != id && comment.parent_id.as_deref() != Some(id));

        if let Err(err) = self.persist() {
            self.comments = previous;
            return Err(err);
        }

        info!(
            "event=comment_remove module=store status=ok backend=local person_id={} comment_id={} removed={}",
            self.person_id,
            id,
            before - self.comments.len()
        );
        Ok(())
    }
}
