//! Key-value local storage used by the local comment backend and the
//! people directory.
//!
//! # Responsibility
//! - Provide a string-keyed, string-valued store with browser-storage
//!   semantics on top of SQLite.
//! - Keep SQL details inside the storage boundary.
//!
//! # Invariants
//! - Keys are non-empty.
//! - `set_item` replaces the whole value for a key.

pub mod local;

/// Storage key holding a person's comment list.
pub fn comments_key(person_id: &str) -> String {
    format!("comments::{person_id}")
}

/// Storage key holding the locally extended people dataset.
pub const PEOPLE_KEY: &str = "people::dataset";
