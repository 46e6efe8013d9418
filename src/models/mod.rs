//! Core data models for the citation-resolution pipeline.

mod guess;
mod outcome;
mod record;

pub use guess::{ExtractedGuess, SearchHit};
pub use outcome::{DocumentOutcome, PipelineState, RenameOutcome};
pub use record::{BibliographicRecord, RecordBuilder, AUTHOR_SEPARATOR};
