//! Presentation layer: view models, composer state and text rendering.
//!
//! # Responsibility
//! - Project people and comment stores into display-ready view models.
//! - Hold composer UI state (input buffers, open/closed, posting flag).
//! - Render the wall as plain text for terminal front ends.
//!
//! # Invariants
//! - View models never mutate stores; only composers call `add`.
//! - Replies render at any depth; deep chains do not grow the call stack.

pub mod card;
pub mod composer;
pub mod render;

pub use card::{storage_indicator, CommentView, PersonCardView, WallView};
pub use composer::{Composer, ReplyComposer};
pub use render::{render_card, render_wall};
