use serde::Serialize;

use crate::domain::comments::{Comment, Reply};
use crate::types::document_id::DocumentId;
use crate::types::rating::is_valid_rating;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CommentStats {
    pub total_comments: usize,
    pub total_replies: usize,
    pub average_rating: f64,
    pub total_rating_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub document_id: DocumentId,
    pub average_rating: f64,
    pub total_ratings: usize,
    pub total_comments: usize,
}

impl DocumentSummary {
    pub fn from_comments(document_id: DocumentId, comments: &[Comment]) -> Self {
        let stats = compute_stats(comments);
        Self {
            document_id,
            average_rating: stats.average_rating,
            total_ratings: stats.total_rating_count,
            total_comments: stats.total_comments,
        }
    }
}

pub fn compute_stats(comments: &[Comment]) -> CommentStats {
    let total_replies = comments
        .iter()
        .map(|comment| count_replies(&comment.replies))
        .sum();
    let (average_rating, total_rating_count) = average_rating(comments);
    CommentStats {
        total_comments: comments.len(),
        total_replies,
        average_rating,
        total_rating_count,
    }
}

/// Counts every reply at every depth below `replies`.
pub fn count_replies(replies: &[Reply]) -> usize {
    let mut pending: Vec<&Reply> = replies.iter().collect();
    let mut count = 0;
    while let Some(reply) = pending.pop() {
        count += 1;
        pending.extend(reply.replies.iter());
    }
    count
}

/// Mean of the root ratings in range, rounded to one decimal, with the
/// number of ratings it covers. `(0.0, 0)` when nothing is rated.
pub fn average_rating(comments: &[Comment]) -> (f64, usize) {
    let ratings: Vec<u8> = comments
        .iter()
        .filter_map(|comment| comment.rating)
        .filter(|rating| is_valid_rating(*rating))
        .collect();
    if ratings.is_empty() {
        return (0.0, 0);
    }
    let total: u64 = ratings.iter().map(|rating| u64::from(*rating)).sum();
    let mean = total as f64 / ratings.len() as f64;
    ((mean * 10.0).round() / 10.0, ratings.len())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn comment(rating: Option<u8>) -> Comment {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        Comment::new("n".to_string(), "c".to_string(), rating, now)
    }

    fn reply(replies: Vec<Reply>) -> Reply {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut reply = Reply::new("n".to_string(), "c".to_string(), now);
        reply.replies = replies;
        reply
    }

    #[test]
    fn average_skips_unrated_comments() {
        let comments: Vec<_> = [Some(5), Some(3), Some(4), None, Some(2)]
            .into_iter()
            .map(comment)
            .collect();
        let stats = compute_stats(&comments);
        assert_eq!(stats.average_rating, 3.5);
        assert_eq!(stats.total_rating_count, 4);
        assert_eq!(stats.total_comments, 5);
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        let comments: Vec<_> = [Some(5), Some(4), Some(4)].into_iter().map(comment).collect();
        assert_eq!(average_rating(&comments), (4.3, 3));
    }

    #[test]
    fn out_of_range_ratings_are_ignored() {
        let comments: Vec<_> = [Some(0), Some(9), Some(2)].into_iter().map(comment).collect();
        assert_eq!(average_rating(&comments), (2.0, 1));
    }

    #[test]
    fn no_ratings_yields_zero() {
        let stats = compute_stats(&[comment(None)]);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.total_rating_count, 0);
        assert_eq!(compute_stats(&[]), CommentStats::default());
    }

    #[test]
    fn nested_replies_are_counted() {
        let mut root = comment(Some(5));
        root.replies = vec![reply(Vec::new()), reply(vec![reply(Vec::new())])];
        let stats = compute_stats(&[root]);
        assert_eq!(stats.total_replies, 3);
        assert_eq!(stats.total_comments, 1);
    }

    #[test]
    fn summary_mirrors_stats() {
        let id = DocumentId::try_from("org-7").unwrap();
        let summary = DocumentSummary::from_comments(id.clone(), &[comment(Some(4)), comment(None)]);
        assert_eq!(summary.document_id, id);
        assert_eq!(summary.average_rating, 4.0);
        assert_eq!(summary.total_ratings, 1);
        assert_eq!(summary.total_comments, 2);
    }
}
