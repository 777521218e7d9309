//! Comment record and draft normalization.
//!
//! # Invariants
//! - `id` is unique within one person's comment collection.
//! - `text` is stored trimmed; blank drafts never become records.
//! - A blank author name is presented as [`ANONYMOUS_AUTHOR`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Author label used when a comment has no (or a blank) author name.
pub const ANONYMOUS_AUTHOR: &str = "anonymous";

/// Comment identifier. Remote rows may use any string id, so this is not a
/// `Uuid`.
pub type CommentId = String;

/// One comment attached to a person card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: CommentId,
    pub person_id: String,
    /// Author display name as submitted. Remote rows may carry `null`.
    #[serde(default)]
    pub name: Option<String>,
    pub text: String,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub parent_id: Option<CommentId>,
    pub created_at: DateTime<Utc>,
    /// Set on records written by the local backend.
    #[serde(rename = "_local", default, skip_serializing_if = "is_false")]
    pub local: bool,
}

impl Comment {
    /// Builds a locally persisted record from a validated draft.
    ///
    /// Generates a fresh id and stamps the current time.
    pub fn new_local(person_id: impl Into<String>, draft: &ValidComment) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            person_id: person_id.into(),
            name: Some(draft.name.clone()),
            text: draft.text.clone(),
            parent_id: draft.parent_id.clone(),
            created_at: Utc::now(),
            local: true,
        }
    }

    /// Display author, falling back to [`ANONYMOUS_AUTHOR`].
    pub fn author(&self) -> &str {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => ANONYMOUS_AUTHOR,
        }
    }

    /// Parent id with blank values treated as top-level.
    pub fn parent(&self) -> Option<&str> {
        self.parent_id
            .as_deref()
            .filter(|parent| !parent.trim().is_empty())
    }
}

/// Validation failures for comment drafts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentValidationError {
    /// Body is empty after trimming.
    EmptyText,
}

impl Display for CommentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "comment text must not be blank"),
        }
    }
}

impl Error for CommentValidationError {}

/// Raw composer input for a new comment or reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentDraft {
    pub name: String,
    pub text: String,
    pub parent_id: Option<CommentId>,
}

impl CommentDraft {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            parent_id: None,
        }
    }

    /// Turns this draft into a reply to `parent_id`.
    pub fn reply_to(mut self, parent_id: impl Into<CommentId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Returns whether the body is blank and the draft would be ignored.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Trims fields and applies the anonymous-author default.
    ///
    /// # Errors
    /// - [`CommentValidationError::EmptyText`] when the body is blank.
    pub fn validate(&self) -> Result<ValidComment, CommentValidationError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(CommentValidationError::EmptyText);
        }

        let name = match self.name.trim() {
            "" => ANONYMOUS_AUTHOR.to_string(),
            trimmed => trimmed.to_string(),
        };
        let parent_id = self
            .parent_id
            .as_deref()
            .map(str::trim)
            .filter(|parent| !parent.is_empty())
            .map(str::to_string);

        Ok(ValidComment {
            name,
            text: text.to_string(),
            parent_id,
        })
    }
}

/// A normalized draft ready to be persisted by either backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidComment {
    pub name: String,
    pub text: String,
    pub parent_id: Option<CommentId>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Remote tables commonly use integer identity columns.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for CommentId {
    fn from(value: RawId) -> Self {
        match value {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }
    }
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<CommentId, D::Error> {
    RawId::deserialize(deserializer).map(Into::into)
}

fn deserialize_optional_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<CommentId>, D::Error> {
    Ok(Option::<RawId>::deserialize(deserializer)?.map(Into::into))
}
