//! External collaborators of the rename pipeline.
//!
//! Two seams are defined here:
//!
//! - [`MetadataExtractor`]: turns extracted document text into an
//!   [`ExtractedGuess`] (implemented by [`OpenAiExtractor`] against any
//!   OpenAI-compatible chat-completions endpoint)
//! - [`BibliographicSearch`]: confirms a guess against a bibliographic
//!   service and returns the scraped [`BibliographicRecord`] (implemented by
//!   [`CiniiSearchClient`] for CiNii Research)
//!
//! Both return [`ResolveError`], the shared failure taxonomy. Mock
//! implementations live in [`mock`] so pipelines can be exercised offline.

mod cinii;
pub mod mock;
mod openai;

pub use cinii::CiniiSearchClient;
pub use mock::{MockExtractor, MockReply, MockSearch};
pub use openai::{OpenAiExtractor, SYSTEM_PROMPT};

use crate::models::{BibliographicRecord, ExtractedGuess};
use async_trait::async_trait;

/// Produces a title/author guess from document text.
#[async_trait]
pub trait MetadataExtractor: Send + Sync + std::fmt::Debug {
    /// Ask for the title and author of the document the text came from.
    ///
    /// A single request is made; upstream failures are not retried.
    async fn extract(&self, document_text: &str) -> Result<ExtractedGuess, ResolveError>;
}

/// Resolves a guess into a confirmed bibliographic record.
#[async_trait]
pub trait BibliographicSearch: Send + Sync + std::fmt::Debug {
    /// Search for the guess and scrape the first hit's detail page.
    ///
    /// Returns [`ResolveError::NotFound`] when the service lists no match.
    async fn resolve(&self, guess: &ExtractedGuess) -> Result<BibliographicRecord, ResolveError>;
}

/// Errors that can occur while resolving a document's citation
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Non-success HTTP status from the model, search or detail endpoint
    #[error("Upstream returned status {status} for {url}")]
    Upstream { status: u16, url: String },

    /// HTTP 429 from the search endpoint, still failing after all retries
    #[error("Rate limited by {url} after {attempts} attempts")]
    RateLimited { url: String, attempts: u32 },

    /// Malformed JSON from the model or missing HTML structure
    #[error("Parse error: {0}")]
    Parse(String),

    /// The search listed no matching entry
    #[error("No matching paper for author: {author:?}, title: {title:?}")]
    NotFound { title: String, author: String },

    /// Transport failure (connection refused, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// Missing credentials or unusable settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// The filesystem refused the target name
    #[error("Rename error: {0}")]
    Rename(String),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResolveError {
    /// Short stable label used in log entries
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Upstream { .. } => "upstream",
            Self::RateLimited { .. } => "rate_limited",
            Self::Parse(_) => "parse",
            Self::NotFound { .. } => "not_found",
            Self::Network(_) => "network",
            Self::Config(_) => "config",
            Self::Rename(_) => "rename",
            Self::Io(_) => "io",
        }
    }
}

impl From<reqwest::Error> for ResolveError {
    fn from(err: reqwest::Error) -> Self {
        ResolveError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ResolveError {
    fn from(err: serde_json::Error) -> Self {
        ResolveError::Parse(format!("JSON: {}", err))
    }
}
