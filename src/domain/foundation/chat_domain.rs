//! The preset subject domains a conversation can be in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Subject domain of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatDomain {
    #[default]
    Technology,
    Healthcare,
}

impl ChatDomain {
    pub const ALL: [ChatDomain; 2] = [ChatDomain::Technology, ChatDomain::Healthcare];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatDomain::Technology => "technology",
            ChatDomain::Healthcare => "healthcare",
        }
    }

    /// The other preset domain.
    pub fn other(&self) -> ChatDomain {
        match self {
            ChatDomain::Technology => ChatDomain::Healthcare,
            ChatDomain::Healthcare => ChatDomain::Technology,
        }
    }
}

impl fmt::Display for ChatDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChatDomain {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "technology" | "tech" => Ok(ChatDomain::Technology),
            "healthcare" | "health" => Ok(ChatDomain::Healthcare),
            other => Err(ValidationError::unknown_variant("domain", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_and_short_forms() {
        assert_eq!("Healthcare".parse::<ChatDomain>().unwrap(), ChatDomain::Healthcare);
        assert_eq!("tech".parse::<ChatDomain>().unwrap(), ChatDomain::Technology);
        assert!("finance".parse::<ChatDomain>().is_err());
    }

    #[test]
    fn other_flips_between_the_two_domains() {
        assert_eq!(ChatDomain::Technology.other(), ChatDomain::Healthcare);
        assert_eq!(ChatDomain::Healthcare.other(), ChatDomain::Technology);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ChatDomain::Healthcare).unwrap(), "\"healthcare\"");
    }
}
