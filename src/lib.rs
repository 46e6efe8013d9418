//! # cite-rename
//!
//! Identify unlabelled paper PDFs and rename them to a citation.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (ExtractedGuess, BibliographicRecord, outcomes)
//! - [`sources`]: The language-model extractor and bibliographic search client
//! - [`pipeline`]: The per-document rename state machine and its log sink
//! - [`utils`]: Citation formatting, filename sanitization, HTTP, retry, PDF text
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal output for the command-line tool
//!
//! ## Flow
//!
//! For each document the first page is read, a language model guesses title
//! and author, CiNii Research confirms the guess and supplies `citation_*`
//! metadata, the metadata is formatted as
//! `{author}, {year}, 「{title}」{journal}（{issue}）{volume}, p.{first}-{last}`,
//! and the file is moved to `{output_dir}/{citation}.pdf`. When the filesystem
//! rejects that name, reserved characters are replaced and the move is tried
//! once more.

pub mod config;
pub mod models;
pub mod pipeline;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{BibliographicRecord, DocumentOutcome, ExtractedGuess, PipelineState};
pub use pipeline::RenameCoordinator;
pub use sources::{BibliographicSearch, MetadataExtractor, ResolveError};
