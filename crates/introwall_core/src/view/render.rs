//! Plain-text rendering of the wall.

use super::card::{CommentView, PersonCardView, WallView};
use crate::people::DatasetCheck;
use crate::store::BackendKind;
use std::fmt::Write;

pub const WALL_TITLE: &str = "IntroWall · community introductions";
const EMPTY_HINT: &str = "No comments yet. Be the first to say hi.";
const RULE_WIDTH: usize = 64;

/// Renders one card, comments included.
pub fn render_card(card: &PersonCardView) -> String {
    let mut out = String::new();

    let mut header = format!("[{}] {}", card.initial, card.name);
    if let Some(location) = &card.location {
        let _ = write!(header, "  @ {location}");
    }
    for badge in &card.badges {
        let _ = write!(header, "  <{badge}>");
    }
    let _ = writeln!(out, "{header}");
    let _ = writeln!(out, "    id: {}", card.person_id);

    if !card.tags.is_empty() {
        let _ = writeln!(out, "    {}", card.tags.join(" "));
    }
    if let Some(headline) = &card.headline {
        let _ = writeln!(out, "    {headline}");
    }
    if let Some(intro) = &card.intro {
        let _ = writeln!(out);
        for line in intro.lines() {
            let _ = writeln!(out, "    {line}");
        }
    }

    let _ = writeln!(out, "  -- {} --", card.storage_line);
    for comment in &card.comments {
        render_comment(&mut out, comment, 1);
    }
    if card.show_empty_hint {
        let _ = writeln!(out, "  {EMPTY_HINT}");
    }
    out
}

fn render_comment(out: &mut String, comment: &CommentView, depth: usize) {
    let mut pending = vec![(comment, depth)];
    while let Some((comment, depth)) = pending.pop() {
        let indent = "  ".repeat(depth);
        let _ = writeln!(
            out,
            "{indent}- {} · {} [{}]",
            comment.author, comment.timestamp, comment.id
        );
        for line in comment.text.lines() {
            let _ = writeln!(out, "{indent}  {line}");
        }
        pending.extend(comment.replies.iter().rev().map(|reply| (reply, depth + 1)));
    }
}

/// Renders the shell: title, search line, cards, footer.
pub fn render_wall(wall: &WallView) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let separator = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "{WALL_TITLE}");
    if wall.query.trim().is_empty() {
        let _ = writeln!(out, "members: {}", wall.total_people);
    } else {
        let _ = writeln!(
            out,
            "search: \"{}\" ({} of {})",
            wall.query.trim(),
            wall.cards.len(),
            wall.total_people
        );
    }
    let _ = writeln!(out, "{rule}");

    for card in &wall.cards {
        out.push_str(&render_card(card));
        let _ = writeln!(out, "{separator}");
    }
    if wall.cards.is_empty() {
        let _ = writeln!(out, "No members match this search.");
        let _ = writeln!(out, "{separator}");
    }

    let dataset = match wall.dataset {
        DatasetCheck::Ok => "dataset: OK",
        DatasetCheck::Empty => "dataset: empty",
    };
    let backend = match wall.backend {
        BackendKind::Cloud => "comments: cloud (remote configured)",
        BackendKind::Local => "comments: local only (remote not configured, using local storage)",
    };
    let _ = writeln!(out, "{dataset} · {backend}");
    out
}
