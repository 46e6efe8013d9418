//! Mock collaborators for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::models::{BibliographicRecord, ExtractedGuess};
use crate::sources::{BibliographicSearch, MetadataExtractor, ResolveError};

/// Canned result for a mock call
#[derive(Debug, Clone)]
pub enum MockReply<T> {
    Ok(T),
    Upstream(u16),
    Parse(String),
    NotFound,
}

impl<T: Clone> MockReply<T> {
    fn to_result(&self, guess: Option<&ExtractedGuess>) -> Result<T, ResolveError> {
        match self {
            MockReply::Ok(value) => Ok(value.clone()),
            MockReply::Upstream(status) => Err(ResolveError::Upstream {
                status: *status,
                url: "mock://".to_string(),
            }),
            MockReply::Parse(msg) => Err(ResolveError::Parse(msg.clone())),
            MockReply::NotFound => {
                let guess = guess.cloned().unwrap_or_default();
                Err(ResolveError::NotFound {
                    title: guess.title,
                    author: guess.author,
                })
            }
        }
    }
}

/// A mock extractor that returns a predefined guess.
#[derive(Debug)]
pub struct MockExtractor {
    reply: Mutex<MockReply<ExtractedGuess>>,
    calls: AtomicUsize,
}

impl MockExtractor {
    pub fn new(reply: MockReply<ExtractedGuess>) -> Self {
        Self {
            reply: Mutex::new(reply),
            calls: AtomicUsize::new(0),
        }
    }

    /// Answer every call with this guess
    pub fn returning(guess: ExtractedGuess) -> Self {
        Self::new(MockReply::Ok(guess))
    }

    /// Replace the configured reply.
    pub fn set_reply(&self, reply: MockReply<ExtractedGuess>) {
        if let Ok(mut guard) = self.reply.lock() {
            *guard = reply;
        }
    }

    /// Number of `extract` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataExtractor for MockExtractor {
    async fn extract(&self, _document_text: &str) -> Result<ExtractedGuess, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .reply
            .lock()
            .map_err(|_| ResolveError::Parse("mock poisoned".to_string()))?
            .clone();
        reply.to_result(None)
    }
}

/// A mock search that returns a predefined record and remembers queries.
#[derive(Debug)]
pub struct MockSearch {
    reply: Mutex<MockReply<BibliographicRecord>>,
    queries: Mutex<Vec<ExtractedGuess>>,
}

impl MockSearch {
    pub fn new(reply: MockReply<BibliographicRecord>) -> Self {
        Self {
            reply: Mutex::new(reply),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Answer every call with this record
    pub fn returning(record: BibliographicRecord) -> Self {
        Self::new(MockReply::Ok(record))
    }

    /// Answer every call with `NotFound`
    pub fn not_found() -> Self {
        Self::new(MockReply::NotFound)
    }

    /// Guesses received so far
    pub fn queries(&self) -> Vec<ExtractedGuess> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl BibliographicSearch for MockSearch {
    async fn resolve(&self, guess: &ExtractedGuess) -> Result<BibliographicRecord, ResolveError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(guess.clone());
        }
        let reply = self
            .reply
            .lock()
            .map_err(|_| ResolveError::Parse("mock poisoned".to_string()))?
            .clone();
        reply.to_result(Some(guess))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_extractor_counts_calls() {
        let extractor = MockExtractor::returning(ExtractedGuess::new("T", "A"));
        assert_eq!(extractor.extract("x").await.unwrap().title, "T");

        extractor.set_reply(MockReply::Upstream(500));
        assert!(extractor.extract("x").await.is_err());
        assert_eq!(extractor.calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_search_not_found_echoes_guess() {
        let search = MockSearch::not_found();
        let err = search
            .resolve(&ExtractedGuess::new("Title", "Author"))
            .await
            .unwrap_err();

        assert!(matches!(err, ResolveError::NotFound { ref title, .. } if title == "Title"));
        assert_eq!(search.queries().len(), 1);
    }
}
