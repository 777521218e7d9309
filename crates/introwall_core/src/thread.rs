//! Comment thread assembly.
//!
//! # Responsibility
//! - Turn a flat, unordered comment list into nested reply trees.
//!
//! # Invariants
//! - Every distinct comment id appears exactly once in the output.
//! - Comments whose parent id does not resolve are roots.
//! - Siblings (roots included) are ordered by `created_at ASC, id ASC`.
//! - Parent cycles, including self-parenting, are broken by promoting the
//!   first cycle member met to a root; assembly always terminates.

use crate::model::comment::Comment;
use std::collections::HashMap;

/// One comment with its direct replies, recursively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode {
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Number of comments in this subtree, this node included.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Always false: a node holds at least its own comment.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Height of this subtree; a node without replies has depth 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(node.replies.iter().map(|reply| (reply, level + 1)));
        }
        deepest
    }

    /// Finds a comment by id in this subtree.
    pub fn find(&self, id: &str) -> Option<&CommentNode> {
        self.iter().find(|node| node.comment.id == id)
    }

    /// Pre-order walk of this subtree: each node before its replies,
    /// replies in display order.
    pub fn iter(&self) -> impl Iterator<Item = &CommentNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.replies.iter().rev());
            Some(node)
        })
    }
}

impl Drop for CommentNode {
    // Unlinks replies one level at a time so deep chains do not recurse.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }
}

/// Total number of comments in a forest.
pub fn count_nodes(nodes: &[CommentNode]) -> usize {
    nodes.iter().map(CommentNode::len).sum()
}

/// Builds the reply forest for `comments`.
///
/// Duplicate ids keep their first occurrence. Input order does not matter.
pub fn build_thread(comments: &[Comment]) -> Vec<CommentNode> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(comments.len());
    let mut unique: Vec<&Comment> = Vec::with_capacity(comments.len());
    for comment in comments {
        if !index.contains_key(comment.id.as_str()) {
            index.insert(comment.id.as_str(), unique.len());
            unique.push(comment);
        }
    }

    let parent_of: Vec<Option<usize>> = unique
        .iter()
        .map(|comment| comment.parent().and_then(|parent| index.get(parent).copied()))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); unique.len()];
    let mut roots = Vec::new();
    for (pos, parent) in parent_of.iter().enumerate() {
        match parent {
            Some(parent) => children[*parent].push(pos),
            None => roots.push(pos),
        }
    }

    let mut placed = vec![false; unique.len()];
    for &root in &roots {
        mark_subtree(root, &children, &mut placed);
    }

    // Whatever is still unplaced hangs off a parent cycle.
    for pos in 0..unique.len() {
        if placed[pos] {
            continue;
        }
        let entry = cycle_entry(pos, &parent_of);
        if let Some(parent) = parent_of[entry] {
            children[parent].retain(|child| *child != entry);
        }
        roots.push(entry);
        mark_subtree(entry, &children, &mut placed);
    }

    let order = |left: &usize, right: &usize| {
        let (left, right) = (unique[*left], unique[*right]);
        left.created_at
            .cmp(&right.created_at)
            .then_with(|| left.id.cmp(&right.id))
    };
    roots.sort_by(order);
    for bucket in &mut children {
        bucket.sort_by(order);
    }

    roots
        .into_iter()
        .map(|root| assemble(root, &unique, &children))
        .collect()
}

fn mark_subtree(start: usize, children: &[Vec<usize>], placed: &mut [bool]) {
    let mut stack = vec![start];
    while let Some(pos) = stack.pop() {
        if placed[pos] {
            continue;
        }
        placed[pos] = true;
        stack.extend(children[pos].iter().copied());
    }
}

/// Walks up from `start` until a node repeats; that node lies on the cycle.
fn cycle_entry(start: usize, parent_of: &[Option<usize>]) -> usize {
    let mut seen = vec![false; parent_of.len()];
    let mut pos = start;
    loop {
        if seen[pos] {
            return pos;
        }
        seen[pos] = true;
        match parent_of[pos] {
            Some(parent) => pos = parent,
            None => return pos,
        }
    }
}

/// Builds the node for `root` bottom-up, children before parents.
fn assemble(root: usize, unique: &[&Comment], children: &[Vec<usize>]) -> CommentNode {
    let mut pending = vec![(root, false)];
    let mut built: Vec<CommentNode> = Vec::new();
    while let Some((pos, expanded)) = pending.pop() {
        if expanded {
            let replies = built.split_off(built.len() - children[pos].len());
            built.push(CommentNode {
                comment: unique[pos].clone(),
                replies,
            });
        } else {
            pending.push((pos, true));
            pending.extend(children[pos].iter().rev().map(|child| (*child, false)));
        }
    }
    built.pop().unwrap_or_else(|| CommentNode {
        comment: unique[root].clone(),
        replies: Vec::new(),
    })
}
