//! Remote comment table access.
//!
//! # Responsibility
//! - Define the table contract used by the cloud comment backend.
//! - Provide the HTTP implementation and the per-person push channel.
//!
//! # Invariants
//! - Reads are always scoped by `person_id` equality.
//! - Reads return rows in ascending `created_at` order.
//! - Deletion is not part of the contract.

use crate::model::comment::{Comment, ValidComment};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod rest;
pub mod subscription;

pub use rest::RestCommentTable;
pub use subscription::{PushEvent, Subscription};

/// Remote table name holding comment rows.
pub const COMMENTS_TABLE: &str = "comments";

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Remote table failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Request never produced an HTTP response.
    Transport(String),
    /// Backend answered with a non-success status.
    Rejected { status: u16, message: String },
    /// Response body did not match the comment row shape.
    Decode(String),
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "remote request failed: {message}"),
            Self::Rejected { status, message } => {
                write!(f, "remote rejected request ({status}): {message}")
            }
            Self::Decode(message) => write!(f, "invalid remote response: {message}"),
        }
    }
}

impl Error for RemoteError {}

/// Insert payload. The backend assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCommentRow {
    pub person_id: String,
    pub name: String,
    pub text: String,
    pub parent_id: Option<String>,
}

impl NewCommentRow {
    pub fn new(person_id: impl Into<String>, comment: ValidComment) -> Self {
        Self {
            person_id: person_id.into(),
            name: comment.name,
            text: comment.text,
            parent_id: comment.parent_id,
        }
    }
}

/// Table contract for the cloud backend.
///
/// Implementations are shared with the push poller thread.
pub trait CommentTable: Send + Sync {
    /// All rows for one person, ascending by `created_at`.
    fn select_for_person(&self, person_id: &str) -> RemoteResult<Vec<Comment>>;
    /// Rows for one person with `created_at >= since`, ascending.
    fn select_since(&self, person_id: &str, since: DateTime<Utc>) -> RemoteResult<Vec<Comment>>;
    /// Inserts one row.
    fn insert(&self, row: &NewCommentRow) -> RemoteResult<()>;
}
