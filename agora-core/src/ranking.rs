//! Vote tallies and comment ordering.

use crate::entities::{Comment, Post};
use crate::enums::CommentSort;
use std::cmp::Reverse;

/// Anything carrying up/down vote counters.
pub trait Votable {
    fn up_votes(&self) -> i64;
    fn down_votes(&self) -> i64;

    /// Net score: up votes minus down votes, clamped to the `i64` range.
    fn score(&self) -> i64 {
        self.up_votes().saturating_sub(self.down_votes())
    }
}

impl Votable for Post {
    fn up_votes(&self) -> i64 {
        self.up_vote
    }

    fn down_votes(&self) -> i64 {
        self.down_vote
    }
}

impl Votable for Comment {
    fn up_votes(&self) -> i64 {
        self.up_vote
    }

    fn down_votes(&self) -> i64 {
        self.down_vote
    }
}

/// Return the comments in display order.
///
/// Both orders are descending and stable: comments that compare equal keep
/// the order the server sent them in. A comment without a timestamp sorts as
/// the oldest.
pub fn sort_comments(comments: &[Comment], order: CommentSort) -> Vec<Comment> {
    let mut sorted = comments.to_vec();
    match order {
        CommentSort::Newest => sorted.sort_by_key(|c| Reverse(c.created_at)),
        CommentSort::Popularity => sorted.sort_by_key(|c| Reverse(c.score())),
    }
    sorted
}
