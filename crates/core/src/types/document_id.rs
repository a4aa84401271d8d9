use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const MAX_DOCUMENT_ID_LEN: usize = 256;

/// Identifier of the post or organization that owns one comment tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for DocumentId {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidDocumentId("empty document id".to_string()));
        }
        if trimmed.len() > MAX_DOCUMENT_ID_LEN {
            return Err(CoreError::InvalidDocumentId(format!(
                "longer than {MAX_DOCUMENT_ID_LEN} bytes"
            )));
        }
        if trimmed.chars().any(|ch| ch.is_whitespace() || ch == '/' || ch.is_control()) {
            return Err(CoreError::InvalidDocumentId(trimmed.to_string()));
        }
        Ok(DocumentId(trimmed.to_string()))
    }
}

impl TryFrom<String> for DocumentId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DocumentId::try_from(value.as_str())
    }
}

impl From<DocumentId> for String {
    fn from(value: DocumentId) -> Self {
        value.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::DocumentId;

    #[test]
    fn accepts_contentful_style_ids() {
        let id = DocumentId::try_from("  4xQnT2bB7rEXAMPLE ").unwrap();
        assert_eq!(id.as_str(), "4xQnT2bB7rEXAMPLE");
    }

    #[test]
    fn rejects_empty_and_blank() {
        assert!(DocumentId::try_from("").is_err());
        assert!(DocumentId::try_from("   ").is_err());
    }

    #[test]
    fn rejects_inner_whitespace_and_slashes() {
        assert!(DocumentId::try_from("org 12").is_err());
        assert!(DocumentId::try_from("posts/12").is_err());
    }

    #[test]
    fn rejects_overlong_ids() {
        let long = "a".repeat(257);
        assert!(DocumentId::try_from(long.as_str()).is_err());
    }

    #[test]
    fn deserializes_through_validation() {
        let id: DocumentId = serde_json::from_str("\"post1\"").unwrap();
        assert_eq!(id.to_string(), "post1");
        assert!(serde_json::from_str::<DocumentId>("\"\"").is_err());
    }
}
