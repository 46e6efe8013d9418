//! Unconfirmed guesses and search candidates.

use serde::{Deserialize, Serialize};

/// Title/author hypothesis produced by the language model.
///
/// Either field may be empty, which means "unknown".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedGuess {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub author: String,
}

impl ExtractedGuess {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
        }
    }

    /// Whether the model could not name either field
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty() && self.author.trim().is_empty()
    }
}

/// First matching entry on a search results page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Absolute URL of the detail page
    pub detail_url: String,

    /// Title as shown in the result listing (may be empty)
    pub display_title: String,
}
