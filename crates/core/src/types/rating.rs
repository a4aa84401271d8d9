use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

pub fn is_valid_rating(value: u8) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&value)
}

/// Whether root comments in this deployment carry a star rating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingPolicy {
    #[default]
    Required,
    Optional,
    Disabled,
}

impl RatingPolicy {
    pub fn check(self, rating: Option<u8>) -> Result<Option<u8>, CoreError> {
        match (self, rating) {
            (RatingPolicy::Disabled, Some(_)) => Err(CoreError::InvalidRating(
                "ratings are not collected here".to_string(),
            )),
            (RatingPolicy::Disabled, None) | (RatingPolicy::Optional, None) => Ok(None),
            (RatingPolicy::Required, None) => {
                Err(CoreError::InvalidRating("a rating is required".to_string()))
            }
            (_, Some(value)) if is_valid_rating(value) => Ok(Some(value)),
            (_, Some(value)) => Err(CoreError::InvalidRating(format!(
                "{value} is outside {MIN_RATING}..={MAX_RATING}"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RatingPolicy::Required => "required",
            RatingPolicy::Optional => "optional",
            RatingPolicy::Disabled => "disabled",
        }
    }
}

impl FromStr for RatingPolicy {
    type Err = CoreError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "required" => Ok(RatingPolicy::Required),
            "optional" => Ok(RatingPolicy::Optional),
            "disabled" | "none" => Ok(RatingPolicy::Disabled),
            other => Err(CoreError::InvalidRatingPolicy(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RatingPolicy;

    #[test]
    fn required_policy_needs_in_range_rating() {
        assert_eq!(RatingPolicy::Required.check(Some(5)).unwrap(), Some(5));
        assert!(RatingPolicy::Required.check(None).is_err());
        assert!(RatingPolicy::Required.check(Some(0)).is_err());
        assert!(RatingPolicy::Required.check(Some(6)).is_err());
    }

    #[test]
    fn optional_policy_allows_omission() {
        assert_eq!(RatingPolicy::Optional.check(None).unwrap(), None);
        assert_eq!(RatingPolicy::Optional.check(Some(1)).unwrap(), Some(1));
        assert!(RatingPolicy::Optional.check(Some(9)).is_err());
    }

    #[test]
    fn disabled_policy_rejects_ratings() {
        assert_eq!(RatingPolicy::Disabled.check(None).unwrap(), None);
        assert!(RatingPolicy::Disabled.check(Some(3)).is_err());
    }

    #[test]
    fn parse_policy_names() {
        assert_eq!("Optional".parse::<RatingPolicy>().unwrap(), RatingPolicy::Optional);
        assert_eq!("none".parse::<RatingPolicy>().unwrap(), RatingPolicy::Disabled);
        assert!("sometimes".parse::<RatingPolicy>().is_err());
    }
}
