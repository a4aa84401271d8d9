use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Location of a reply below a root comment: one zero-based index per
/// nesting level, read from the root comment's replies downward.
///
/// The empty path addresses the root comment itself (like/report) or the
/// slot directly beneath it (add-reply). Paths are positional, so they are
/// only meaningful against the tree they were computed from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplyPath(Vec<usize>);

impl ReplyPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn segments(&self) -> &[usize] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn child(&self, index: usize) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend_from_slice(&self.0);
        segments.push(index);
        Self(segments)
    }
}

impl From<Vec<usize>> for ReplyPath {
    fn from(value: Vec<usize>) -> Self {
        Self(value)
    }
}

impl From<&[usize]> for ReplyPath {
    fn from(value: &[usize]) -> Self {
        Self(value.to_vec())
    }
}

/// Dotted form, `"2.0"`; the root path is the empty string.
impl FromStr for ReplyPath {
    type Err = CoreError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        trimmed
            .split('.')
            .map(|segment| {
                segment
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| CoreError::InvalidReplyPath(trimmed.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl fmt::Display for ReplyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, index) in self.0.iter().enumerate() {
            if position > 0 {
                f.write_str(".")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ReplyPath;

    #[test]
    fn parse_dotted_path() {
        let path: ReplyPath = "2.0".parse().unwrap();
        assert_eq!(path.segments(), &[2, 0]);
        assert_eq!(path.to_string(), "2.0");
    }

    #[test]
    fn parse_empty_is_root() {
        let path: ReplyPath = "".parse().unwrap();
        assert!(path.is_root());
        assert_eq!(path.to_string(), "");
    }

    #[test]
    fn reject_garbage_segments() {
        assert!("1..2".parse::<ReplyPath>().is_err());
        assert!("a".parse::<ReplyPath>().is_err());
        assert!("-1".parse::<ReplyPath>().is_err());
    }

    #[test]
    fn child_extends_path() {
        let path = ReplyPath::from(vec![1]).child(3);
        assert_eq!(path.segments(), &[1, 3]);
        assert_eq!(path.depth(), 2);
    }

    #[test]
    fn serializes_as_index_array() {
        let path = ReplyPath::from(vec![2, 0]);
        assert_eq!(serde_json::to_string(&path).unwrap(), "[2,0]");
        let back: ReplyPath = serde_json::from_str("[]").unwrap();
        assert!(back.is_root());
    }
}
