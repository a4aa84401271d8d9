use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::comments::{Comment, Reply};
use crate::types::path::ReplyPath;

pub const DEFAULT_MAX_REPLY_DEPTH: usize = 5;

/// A node of a comment tree prepared for rendering.
///
/// `depth` is the length of `path`, so a root comment sits at 0 and its
/// direct replies at 1. `can_reply` applies the display depth cap; the tree
/// itself accepts replies at any depth.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: String,
    pub name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub time_ago: String,
    pub rating: Option<u8>,
    pub like_count: u32,
    pub liked: bool,
    pub reported: bool,
    pub comment_index: usize,
    pub path: ReplyPath,
    pub depth: usize,
    pub can_reply: bool,
    pub replies: Vec<CommentView>,
}

pub fn project_thread(
    comments: &[Comment],
    max_reply_depth: usize,
    now: DateTime<Utc>,
) -> Vec<CommentView> {
    comments
        .iter()
        .enumerate()
        .map(|(comment_index, comment)| {
            let path = ReplyPath::root();
            CommentView {
                id: comment.id.clone(),
                name: comment.name.clone(),
                content: comment.content.clone(),
                created_at: comment.created_at,
                time_ago: format_time_ago(comment.created_at, now),
                rating: comment.rating,
                like_count: comment.engagement.like_count,
                liked: comment.engagement.liked_by_current_actor,
                reported: comment.engagement.reported,
                comment_index,
                replies: project_replies(&comment.replies, comment_index, &path, max_reply_depth, now),
                depth: 0,
                can_reply: true,
                path,
            }
        })
        .collect()
}

fn project_replies(
    replies: &[Reply],
    comment_index: usize,
    parent: &ReplyPath,
    max_reply_depth: usize,
    now: DateTime<Utc>,
) -> Vec<CommentView> {
    replies
        .iter()
        .enumerate()
        .map(|(index, reply)| {
            let path = parent.child(index);
            let depth = path.depth();
            CommentView {
                id: reply.id.clone(),
                name: reply.name.clone(),
                content: reply.content.clone(),
                created_at: reply.created_at,
                time_ago: format_time_ago(reply.created_at, now),
                rating: None,
                like_count: reply.engagement.like_count,
                liked: reply.engagement.liked_by_current_actor,
                reported: reply.engagement.reported,
                comment_index,
                replies: project_replies(&reply.replies, comment_index, &path, max_reply_depth, now),
                depth,
                can_reply: depth <= max_reply_depth,
                path,
            }
        })
        .collect()
}

pub fn format_time_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created_at);
    let seconds = elapsed.num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();
    let weeks = days / 7;
    let months = days / 30;
    let years = days / 365;
    if minutes < 60 {
        plural(minutes, "min")
    } else if hours < 24 {
        plural(hours, "hr")
    } else if days < 7 {
        plural(days, "day")
    } else if weeks < 4 {
        plural(weeks, "week")
    } else if months < 12 {
        plural(months, "month")
    } else {
        plural(years, "year")
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn ago(duration: Duration) -> String {
        format_time_ago(now() - duration, now())
    }

    #[test]
    fn time_ago_buckets() {
        assert_eq!(ago(Duration::seconds(59)), "just now");
        assert_eq!(ago(Duration::minutes(1)), "1 min ago");
        assert_eq!(ago(Duration::minutes(45)), "45 mins ago");
        assert_eq!(ago(Duration::hours(1)), "1 hr ago");
        assert_eq!(ago(Duration::hours(23)), "23 hrs ago");
        assert_eq!(ago(Duration::days(1)), "1 day ago");
        assert_eq!(ago(Duration::days(6)), "6 days ago");
        assert_eq!(ago(Duration::days(7)), "1 week ago");
        assert_eq!(ago(Duration::days(27)), "3 weeks ago");
        assert_eq!(ago(Duration::days(60)), "2 months ago");
        assert_eq!(ago(Duration::days(365)), "1 year ago");
        assert_eq!(ago(Duration::days(800)), "2 years ago");
    }

    #[test]
    fn future_timestamps_are_just_now() {
        assert_eq!(ago(Duration::minutes(-5)), "just now");
    }

    #[test]
    fn projection_carries_paths_and_depth_cap() {
        let created = now() - Duration::hours(2);
        let mut leaf = Reply::new("leaf".to_string(), "c".to_string(), created);
        for _ in 0..2 {
            let mut parent = Reply::new("p".to_string(), "c".to_string(), created);
            parent.replies.push(leaf);
            leaf = parent;
        }
        let mut comment = Comment::new("root".to_string(), "c".to_string(), Some(3), created);
        comment.replies.push(leaf);
        let views = project_thread(&[comment], 2, now());

        let root = &views[0];
        assert_eq!(root.depth, 0);
        assert!(root.can_reply);
        assert_eq!(root.time_ago, "2 hrs ago");
        let first = &root.replies[0];
        assert_eq!(first.path, ReplyPath::from(vec![0]));
        assert!(first.can_reply);
        let second = &first.replies[0];
        assert_eq!(second.depth, 2);
        assert!(second.can_reply);
        let third = &second.replies[0];
        assert_eq!(third.path, ReplyPath::from(vec![0, 0, 0]));
        assert_eq!(third.comment_index, 0);
        assert!(!third.can_reply);
        assert_eq!(third.rating, None);
    }
}
