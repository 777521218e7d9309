//! Person profile record.
//!
//! # Invariants
//! - `id` is unique within one dataset.
//! - A gender value of `-` means "not disclosed" and is never shown.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Label used when a person has a blank name.
pub const ANONYMOUS_MEMBER: &str = "anonymous member";
/// Number of tag chips shown on a card.
pub const VISIBLE_TAG_LIMIT: usize = 8;
const HIDDEN_GENDER: &str = "-";

/// Community member shown as one card on the wall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mbti: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zodiac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
}

impl Person {
    /// Name shown on the card header.
    pub fn display_name(&self) -> &str {
        match self.name.trim() {
            "" => ANONYMOUS_MEMBER,
            name => name,
        }
    }

    /// First character of the name, used as the avatar glyph.
    pub fn initial(&self) -> char {
        self.name.trim().chars().next().unwrap_or('?')
    }

    /// Badge labels in display order: MBTI, zodiac, gender.
    pub fn badges(&self) -> Vec<&str> {
        let gender = self
            .gender
            .as_deref()
            .filter(|gender| gender.trim() != HIDDEN_GENDER);
        [self.mbti.as_deref(), self.zodiac.as_deref(), gender]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|badge| !badge.is_empty())
            .collect()
    }

    /// Tags shown as chips; the rest stay searchable but hidden.
    pub fn visible_tags(&self) -> &[String] {
        let end = self.tags.len().min(VISIBLE_TAG_LIMIT);
        &self.tags[..end]
    }

    /// Lowercased text that search queries are matched against.
    ///
    /// Missing or empty fields are skipped; present fields are joined with
    /// one space in the order name, city, MBTI, zodiac, tags, headline, intro.
    pub fn search_haystack(&self) -> String {
        let tags = self.tags.join(" ");
        [
            Some(self.name.as_str()),
            self.city.as_deref(),
            self.mbti.as_deref(),
            self.zodiac.as_deref(),
            Some(tags.as_str()),
            self.headline.as_deref(),
            self.intro.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
    }
}

/// Validation failures for new people.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonValidationError {
    BlankName,
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "person name must not be blank"),
        }
    }
}

impl Error for PersonValidationError {}

/// Input for the "add person" action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPerson {
    pub name: String,
    pub city: Option<String>,
    pub mbti: Option<String>,
    pub zodiac: Option<String>,
    pub gender: Option<String>,
    pub tags: Vec<String>,
    pub headline: Option<String>,
    pub intro: Option<String>,
}

impl NewPerson {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Normalizes input into a person record with a generated id.
    ///
    /// Optional fields are trimmed and dropped when blank. Tags are trimmed,
    /// blank ones dropped and duplicates removed keeping the first.
    pub fn into_person(self) -> Result<Person, PersonValidationError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(PersonValidationError::BlankName);
        }

        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags {
            let tag = tag.trim();
            if !tag.is_empty() && !tags.iter().any(|existing| existing == tag) {
                tags.push(tag.to_string());
            }
        }

        Ok(Person {
            id: Uuid::new_v4().to_string(),
            name,
            city: non_blank(self.city),
            mbti: non_blank(self.mbti),
            zodiac: non_blank(self.zodiac),
            gender: non_blank(self.gender),
            tags,
            headline: non_blank(self.headline),
            intro: non_blank(self.intro),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
