//! Domain model for the introduction wall.
//!
//! # Responsibility
//! - Define the person and comment records shared by storage, remote and
//!   presentation layers.
//! - Own the input normalization rules for new comments and people.
//!
//! # Invariants
//! - Stored comment text is trimmed and non-empty.
//! - A comment's `parent_id` is either `None` or a non-blank id.

pub mod comment;
pub mod person;
