use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CommentError;
use crate::types::path::ReplyPath;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// Like and report state shared by comments and replies.
///
/// There is no viewer identity: `liked_by_current_actor` records the
/// direction of the last toggle, not whether a particular visitor liked it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    #[serde(rename = "likes", default, deserialize_with = "like_count_from_stored")]
    pub like_count: u32,
    #[serde(rename = "isLiked", default)]
    pub liked_by_current_actor: bool,
    #[serde(rename = "isReported", default)]
    pub reported: bool,
}

/// Older writers could store a negative or null count; both read as zero.
fn like_count_from_stored<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?.unwrap_or(0);
    Ok(u32::try_from(raw.max(0)).unwrap_or(u32::MAX))
}

impl Engagement {
    pub fn toggle_like(&mut self) {
        if self.liked_by_current_actor {
            self.like_count = self.like_count.saturating_sub(1);
        } else {
            self.like_count = self.like_count.saturating_add(1);
        }
        self.liked_by_current_actor = !self.liked_by_current_actor;
    }

    /// Returns whether the flag changed.
    pub fn mark_reported(&mut self) -> bool {
        let changed = !self.reported;
        self.reported = true;
        changed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub content: String,
    #[serde(rename = "updatedTime")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(flatten)]
    pub engagement: Engagement,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub content: String,
    #[serde(rename = "updatedTime")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub engagement: Engagement,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

impl Comment {
    pub fn new(name: String, content: String, rating: Option<u8>, now: DateTime<Utc>) -> Self {
        Self {
            id: generate_id(now),
            name,
            content,
            created_at: now,
            rating,
            engagement: Engagement::default(),
            replies: Vec::new(),
        }
    }
}

impl Reply {
    pub fn new(name: String, content: String, now: DateTime<Utc>) -> Self {
        Self {
            id: generate_id(now),
            name,
            content,
            created_at: now,
            engagement: Engagement::default(),
            replies: Vec::new(),
        }
    }
}

/// `<unix millis>-<9 base36 chars>`
pub fn generate_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| char::from(ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())]))
        .collect();
    format!("{}-{suffix}", now.timestamp_millis())
}

/// Read-only view of whichever node a path resolved to.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Comment(&'a Comment),
    Reply(&'a Reply),
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            NodeRef::Comment(comment) => &comment.id,
            NodeRef::Reply(reply) => &reply.id,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            NodeRef::Comment(comment) => &comment.name,
            NodeRef::Reply(reply) => &reply.name,
        }
    }

    pub fn content(&self) -> &'a str {
        match self {
            NodeRef::Comment(comment) => &comment.content,
            NodeRef::Reply(reply) => &reply.content,
        }
    }

    pub fn engagement(&self) -> &'a Engagement {
        match self {
            NodeRef::Comment(comment) => &comment.engagement,
            NodeRef::Reply(reply) => &reply.engagement,
        }
    }

    pub fn replies(&self) -> &'a [Reply] {
        match self {
            NodeRef::Comment(comment) => &comment.replies,
            NodeRef::Reply(reply) => &reply.replies,
        }
    }
}

pub fn resolve<'a>(
    comments: &'a [Comment],
    comment_index: usize,
    path: &ReplyPath,
) -> Result<NodeRef<'a>, CommentError> {
    let root = comments.get(comment_index).ok_or(CommentError::InvalidPath {
        depth: 0,
        index: comment_index,
        len: comments.len(),
    })?;
    let mut node = NodeRef::Comment(root);
    for (depth, &index) in path.segments().iter().enumerate() {
        let siblings = node.replies();
        let reply = siblings.get(index).ok_or(CommentError::InvalidPath {
            depth: depth + 1,
            index,
            len: siblings.len(),
        })?;
        node = NodeRef::Reply(reply);
    }
    Ok(node)
}

/// Root comments are newest-first.
pub fn insert_comment(comments: &mut Vec<Comment>, comment: Comment) {
    comments.insert(0, comment);
}

/// Replies are oldest-first at every level.
pub fn append_reply(
    comments: &mut [Comment],
    comment_index: usize,
    path: &ReplyPath,
    reply: Reply,
) -> Result<(), CommentError> {
    let root = root_mut(comments, comment_index)?;
    let replies = replies_at_mut(root, path.segments())?;
    replies.push(reply);
    Ok(())
}

pub fn toggle_like(
    comments: &mut [Comment],
    comment_index: usize,
    path: &ReplyPath,
) -> Result<(), CommentError> {
    engagement_at_mut(comments, comment_index, path)?.toggle_like();
    Ok(())
}

/// Returns whether the node was newly reported.
pub fn mark_reported(
    comments: &mut [Comment],
    comment_index: usize,
    path: &ReplyPath,
) -> Result<bool, CommentError> {
    Ok(engagement_at_mut(comments, comment_index, path)?.mark_reported())
}

fn root_mut(comments: &mut [Comment], comment_index: usize) -> Result<&mut Comment, CommentError> {
    let len = comments.len();
    comments.get_mut(comment_index).ok_or(CommentError::InvalidPath {
        depth: 0,
        index: comment_index,
        len,
    })
}

fn replies_at_mut<'a>(
    root: &'a mut Comment,
    segments: &[usize],
) -> Result<&'a mut Vec<Reply>, CommentError> {
    let mut replies = &mut root.replies;
    for (depth, &index) in segments.iter().enumerate() {
        let len = replies.len();
        let reply = replies.get_mut(index).ok_or(CommentError::InvalidPath {
            depth: depth + 1,
            index,
            len,
        })?;
        replies = &mut reply.replies;
    }
    Ok(replies)
}

fn engagement_at_mut<'a>(
    comments: &'a mut [Comment],
    comment_index: usize,
    path: &ReplyPath,
) -> Result<&'a mut Engagement, CommentError> {
    let root = root_mut(comments, comment_index)?;
    let Some((&last, parents)) = path.segments().split_last() else {
        return Ok(&mut root.engagement);
    };
    let siblings = replies_at_mut(root, parents)?;
    let len = siblings.len();
    siblings
        .get_mut(last)
        .map(|reply| &mut reply.engagement)
        .ok_or(CommentError::InvalidPath {
            depth: path.depth(),
            index: last,
            len,
        })
}
