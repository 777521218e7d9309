//! Cloud comment backend over a remote table and its push channel.

use super::{AddOutcome, BackendKind, CommentStore, StoreResult, StoreStatus};
use crate::model::comment::{Comment, CommentDraft};
use crate::remote::{CommentTable, NewCommentRow, PushEvent, Subscription};
use log::{info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Comments of one person mirrored from the remote table.
///
/// `loading` stays true until the initial fetch result has been applied.
/// Dropping the store cancels its subscription and discards any result
/// still in flight.
pub struct CloudCommentStore {
    table: Arc<dyn CommentTable>,
    person_id: String,
    comments: Vec<Comment>,
    known_ids: HashSet<String>,
    loading: bool,
    error: Option<String>,
    subscription: Subscription,
}

impl CloudCommentStore {
    /// Starts the ordered fetch and the insert subscription.
    pub fn open(table: Arc<dyn CommentTable>, person_id: &str, poll_interval: Duration) -> Self {
        let subscription = Subscription::start(Arc::clone(&table), person_id, poll_interval);
        Self {
            table,
            person_id: person_id.to_string(),
            comments: Vec::new(),
            known_ids: HashSet::new(),
            loading: true,
            error: None,
            subscription,
        }
    }

    /// Push channel topic of this store.
    pub fn topic(&self) -> &str {
        self.subscription.topic()
    }

    fn apply(&mut self, event: PushEvent) -> usize {
        match event {
            PushEvent::Snapshot(Ok(rows)) => {
                self.loading = false;
                let mut applied = 0;
                for row in rows {
                    applied += self.push_row(row);
                }
                info!(
                    "event=comments_load module=store status=ok backend=cloud person_id={} rows={}",
                    self.person_id, applied
                );
                applied
            }
            PushEvent::Snapshot(Err(err)) => {
                self.loading = false;
                warn!(
                    "event=comments_load module=store status=error backend=cloud person_id={} error={}",
                    self.person_id, err
                );
                self.error = Some(err.to_string());
                0
            }
            PushEvent::Inserted(row) => self.push_row(row),
        }
    }

    fn push_row(&mut self, row: Comment) -> usize {
        if row.person_id != self.person_id || !self.known_ids.insert(row.id.clone()) {
            return 0;
        }
        self.comments.push(row);
        1
    }
}

impl CommentStore for CloudCommentStore {
    fn person_id(&self) -> &str {
        &self.person_id
    }

    fn status(&self) -> StoreStatus {
        StoreStatus {
            loading: self.loading,
            error: self.error.clone(),
            kind: BackendKind::Cloud,
        }
    }

    fn comments(&self) -> &[Comment] {
        &self.comments
    }

    fn add(&mut self, draft: &CommentDraft) -> StoreResult<AddOutcome> {
        submit(self.table.as_ref(), &self.person_id, draft)
    }

    /// Deletion is an administrative action on the remote; only logged here.
    fn remove(&mut self, id: &str) -> StoreResult<()> {
        skip_remove(&self.person_id, id);
        Ok(())
    }

    fn sync(&mut self) -> usize {
        self.subscription
            .drain()
            .into_iter()
            .map(|event| self.apply(event))
            .sum()
    }

    fn sync_wait(&mut self, timeout: Duration) -> usize {
        match self.subscription.next_timeout(timeout) {
            Some(event) => self.apply(event) + self.sync(),
            None => 0,
        }
    }
}

/// Inserts one comment row for `person_id`.
///
/// Blank drafts are ignored without a remote call. The new row becomes
/// visible through the push channel, not through this call.
pub(crate) fn submit(
    table: &dyn CommentTable,
    person_id: &str,
    draft: &CommentDraft,
) -> StoreResult<AddOutcome> {
    let Ok(valid) = draft.validate() else {
        return Ok(AddOutcome::Ignored);
    };

    let reply = valid.parent_id.is_some();
    let row = NewCommentRow::new(person_id, valid);
    if let Err(err) = table.insert(&row) {
        warn!(
            "event=comment_add module=store status=error backend=cloud person_id={} error={}",
            person_id, err
        );
        return Err(err.into());
    }

    info!(
        "event=comment_add module=store status=ok backend=cloud person_id={} reply={}",
        person_id, reply
    );
    Ok(AddOutcome::Submitted)
}

pub(crate) fn skip_remove(person_id: &str, id: &str) {
    warn!(
        "event=comment_remove module=store status=skipped backend=cloud person_id={} comment_id={} reason=admin_only",
        person_id, id
    );
}
