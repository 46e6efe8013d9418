//! Bibliographic record scraped from a detail page.

use serde::{Deserialize, Serialize};

/// Separator placed between repeated `citation_author` values
pub const AUTHOR_SEPARATOR: &str = "・";

/// Normalized metadata for one resolved document
///
/// Every field defaults to the empty string, which means "not present on the
/// detail page". Nothing here is ever filled in from outside the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibliographicRecord {
    /// Author names, joined with [`AUTHOR_SEPARATOR`] when several are listed
    pub author: String,

    /// Publication date as published (usually ISO, `2019-05-01`, or just `2019`)
    pub date: String,

    /// Article title
    pub title: String,

    /// Journal title
    pub journal: String,

    /// Issue number
    pub issue: String,

    /// Volume
    pub volume: String,

    /// First page
    pub first_page: String,

    /// Last page
    pub last_page: String,
}

impl BibliographicRecord {
    /// Build a record from raw `citation_*` meta tag pairs.
    ///
    /// Keys may be given with or without the `citation_` prefix. Keys outside
    /// the fixed schema are dropped. Repeated authors are kept in document
    /// order; for any other repeated key the last value wins.
    pub fn from_meta_pairs<K, V, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut record = Self::default();
        let mut authors: Vec<String> = Vec::new();

        for (key, value) in pairs {
            let key = key.as_ref();
            let key = key.strip_prefix("citation_").unwrap_or(key);
            let value = value.as_ref().trim().to_string();

            match key {
                "author" => {
                    if !value.is_empty() {
                        authors.push(value);
                    }
                }
                "date" | "publication_date" => record.date = value,
                "title" => record.title = value,
                "journal_title" => record.journal = value,
                "issue" => record.issue = value,
                "volume" => record.volume = value,
                "firstpage" => record.first_page = value,
                "lastpage" => record.last_page = value,
                other => tracing::trace!("Dropping unrecognized citation key: {}", other),
            }
        }

        record.author = authors.join(AUTHOR_SEPARATOR);
        record
    }

    /// Year part of the date: everything before the first `-`
    pub fn year(&self) -> &str {
        self.date.split('-').next().unwrap_or_default()
    }

    /// Whether the page carried no recognized metadata at all
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Builder for constructing records by hand
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    record: BibliographicRecord,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.record.author = author.into();
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.record.date = date.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.record.title = title.into();
        self
    }

    pub fn journal(mut self, journal: impl Into<String>) -> Self {
        self.record.journal = journal.into();
        self
    }

    pub fn issue(mut self, issue: impl Into<String>) -> Self {
        self.record.issue = issue.into();
        self
    }

    pub fn volume(mut self, volume: impl Into<String>) -> Self {
        self.record.volume = volume.into();
        self
    }

    pub fn pages(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.record.first_page = first.into();
        self.record.last_page = last.into();
        self
    }

    pub fn build(self) -> BibliographicRecord {
        self.record
    }
}
