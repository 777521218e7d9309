//! Card and comment view models.

use crate::model::person::Person;
use crate::people::DatasetCheck;
use crate::store::{BackendKind, CommentStore, StoreStatus};
use crate::thread::CommentNode;
use chrono::{DateTime, Local, Utc};

/// One comment ready for display, with nested replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentView {
    pub id: String,
    pub author: String,
    pub timestamp: String,
    pub text: String,
    pub replies: Vec<CommentView>,
}

impl CommentView {
    /// Converts a reply tree without recursing per nesting level.
    pub fn from_node(node: &CommentNode) -> Self {
        let mut pending = vec![(node, false)];
        let mut built: Vec<CommentView> = Vec::new();
        while let Some((node, expanded)) = pending.pop() {
            if expanded {
                let replies = built.split_off(built.len() - node.replies.len());
                built.push(Self::leaf(node, replies));
            } else {
                pending.push((node, true));
                pending.extend(node.replies.iter().rev().map(|reply| (reply, false)));
            }
        }
        built.pop().unwrap_or_else(|| Self::leaf(node, Vec::new()))
    }

    fn leaf(node: &CommentNode, replies: Vec<CommentView>) -> Self {
        Self {
            id: node.comment.id.clone(),
            author: node.comment.author().to_string(),
            timestamp: format_timestamp(node.comment.created_at),
            text: node.comment.text.clone(),
            replies,
        }
    }
}

impl Drop for CommentView {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut view) = pending.pop() {
            pending.append(&mut view.replies);
        }
    }
}

/// Everything one profile card shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonCardView {
    pub person_id: String,
    pub initial: char,
    pub name: String,
    pub location: Option<String>,
    pub badges: Vec<String>,
    /// First tags only, each prefixed with `#`.
    pub tags: Vec<String>,
    pub headline: Option<String>,
    pub intro: Option<String>,
    pub storage_line: String,
    pub comments: Vec<CommentView>,
    /// Shown when there are no comments and nothing is loading.
    pub show_empty_hint: bool,
}

impl PersonCardView {
    pub fn build(person: &Person, store: &dyn CommentStore) -> Self {
        let status = store.status();
        let comments: Vec<CommentView> = store
            .thread()
            .iter()
            .map(CommentView::from_node)
            .collect();
        let show_empty_hint = comments.is_empty() && !status.loading;

        Self {
            person_id: person.id.clone(),
            initial: person.initial(),
            name: person.display_name().to_string(),
            location: person.city.clone().filter(|city| !city.trim().is_empty()),
            badges: person.badges().into_iter().map(str::to_string).collect(),
            tags: person
                .visible_tags()
                .iter()
                .map(|tag| format!("#{tag}"))
                .collect(),
            headline: person.headline.clone().filter(|text| !text.trim().is_empty()),
            intro: person.intro.clone().filter(|text| !text.trim().is_empty()),
            storage_line: storage_indicator(&status),
            comments,
            show_empty_hint,
        }
    }
}

/// Top-level shell: search query, matching cards and footer facts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallView {
    pub query: String,
    pub total_people: usize,
    pub cards: Vec<PersonCardView>,
    pub dataset: DatasetCheck,
    pub backend: BackendKind,
}

/// Storage indicator line, e.g. `comments: cloud · loading...`.
pub fn storage_indicator(status: &StoreStatus) -> String {
    let mut line = format!("comments: {}", status.kind.label());
    if status.loading {
        line.push_str(" · loading...");
    }
    if let Some(error) = &status.error {
        line.push_str(" · load failed: ");
        line.push_str(error);
    }
    line
}

/// Local wall-clock rendering of a comment timestamp.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::storage_indicator;
    use crate::store::{BackendKind, StoreStatus};

    #[test]
    fn indicator_mentions_loading_and_error() {
        let status = StoreStatus {
            loading: true,
            error: Some("timeout".to_string()),
            kind: BackendKind::Cloud,
        };
        assert_eq!(
            storage_indicator(&status),
            "comments: cloud · loading... · load failed: timeout"
        );
    }
}
