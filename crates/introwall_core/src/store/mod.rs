//! Comment persistence adapters.
//!
//! # Responsibility
//! - Expose one per-person comment interface ([`CommentStore`]) with a local
//!   and a cloud implementation.
//! - Select the implementation once, at startup, from configuration.
//!
//! # Invariants
//! - Blank comment text is a silent no-op in both backends.
//! - Local deletion cascades to direct replies only.
//! - Cloud deletion is disabled and only logged.

use crate::config::WallConfig;
use crate::model::comment::{Comment, CommentDraft};
use crate::remote::{CommentTable, RemoteError, RestCommentTable};
use crate::storage::local::{LocalStorage, StorageError};
use crate::thread::{build_thread, CommentNode};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub mod cloud;
pub mod local;

pub use cloud::CloudCommentStore;
pub use local::LocalCommentStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by comment store writes.
#[derive(Debug)]
pub enum StoreError {
    Storage(StorageError),
    Remote(RemoteError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::Remote(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Remote(err) => Some(err),
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<RemoteError> for StoreError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

/// Which persistence strategy is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Cloud,
}

impl BackendKind {
    pub fn is_cloud(self) -> bool {
        self == Self::Cloud
    }

    /// Short label used by the storage indicator.
    pub fn label(self) -> &'static str {
        match self {
            Self::Local => "local only",
            Self::Cloud => "cloud",
        }
    }
}

/// Read-side status flags of one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatus {
    pub loading: bool,
    pub error: Option<String>,
    pub kind: BackendKind,
}

impl StoreStatus {
    pub fn is_cloud(&self) -> bool {
        self.kind.is_cloud()
    }
}

/// Result of an `add` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// Blank text; nothing was submitted.
    Ignored,
    /// Written and already visible in `comments()`.
    Stored(Comment),
    /// Accepted by the remote; visible once it arrives on the push channel.
    Submitted,
}

/// Per-person comment collection with add/remove capabilities.
pub trait CommentStore {
    fn person_id(&self) -> &str;
    fn status(&self) -> StoreStatus;
    /// Current records in storage order.
    fn comments(&self) -> &[Comment];
    fn add(&mut self, draft: &CommentDraft) -> StoreResult<AddOutcome>;
    fn remove(&mut self, id: &str) -> StoreResult<()>;

    /// Applies pending pushed rows; returns how many records changed.
    fn sync(&mut self) -> usize {
        0
    }

    /// Like [`CommentStore::sync`], blocking up to `timeout` for the first
    /// pending change.
    fn sync_wait(&mut self, _timeout: Duration) -> usize {
        self.sync()
    }

    /// Syncs until the initial load has finished or `timeout` elapsed.
    ///
    /// Returns whether loading finished.
    fn wait_loaded(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.status().loading {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.sync_wait(deadline - now);
        }
        true
    }

    /// Current records assembled into reply trees.
    fn thread(&self) -> Vec<CommentNode> {
        build_thread(self.comments())
    }
}

/// Backend chosen once at startup; opens per-person stores.
pub enum CommentBackend<'conn> {
    Local(LocalStorage<'conn>),
    Cloud {
        table: Arc<dyn CommentTable>,
        poll_interval: Duration,
    },
}

impl<'conn> CommentBackend<'conn> {
    /// Builds the backend selected by `config`.
    ///
    /// `storage` is only used when the remote is not configured.
    pub fn from_config(config: &WallConfig, storage: LocalStorage<'conn>) -> StoreResult<Self> {
        match &config.remote {
            Some(remote) => Ok(Self::Cloud {
                table: Arc::new(RestCommentTable::new(remote)?),
                poll_interval: config.poll_interval,
            }),
            None => Ok(Self::Local(storage)),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Local(_) => BackendKind::Local,
            Self::Cloud { .. } => BackendKind::Cloud,
        }
    }

    /// Adds a comment for one person without opening its store.
    ///
    /// The cloud backend inserts directly and starts no push channel.
    pub fn submit(&self, person_id: &str, draft: &CommentDraft) -> StoreResult<AddOutcome> {
        match self {
            Self::Local(storage) => LocalCommentStore::open(*storage, person_id).add(draft),
            Self::Cloud { table, .. } => cloud::submit(table.as_ref(), person_id, draft),
        }
    }

    /// Removes a comment and its direct replies; a logged no-op on the
    /// cloud backend.
    pub fn remove(&self, person_id: &str, id: &str) -> StoreResult<()> {
        match self {
            Self::Local(storage) => LocalCommentStore::open(*storage, person_id).remove(id),
            Self::Cloud { .. } => {
                cloud::skip_remove(person_id, id);
                Ok(())
            }
        }
    }

    /// Opens the comment store for one person.
    pub fn open_person(&self, person_id: &str) -> Box<dyn CommentStore + 'conn> {
        match self {
            Self::Local(storage) => Box::new(LocalCommentStore::open(*storage, person_id)),
            Self::Cloud {
                table,
                poll_interval,
            } => Box::new(CloudCommentStore::open(
                Arc::clone(table),
                person_id,
                *poll_interval,
            )),
        }
    }
}
