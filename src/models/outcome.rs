//! Per-document pipeline results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Stage of the per-document state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Extracting,
    Searching,
    Formatting,
    Renaming,
    /// Renamed to the citation stem
    Done,
    /// Renamed (or attempted) under the sanitized stem
    Fallback,
    /// Stopped before any rename happened
    Aborted,
}

impl PipelineState {
    /// Whether the state ends the pipeline
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Fallback | Self::Aborted)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Extracting => "extracting",
            Self::Searching => "searching",
            Self::Formatting => "formatting",
            Self::Renaming => "renaming",
            Self::Done => "done",
            Self::Fallback => "fallback",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Result of applying a candidate name to a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameOutcome {
    pub success: bool,

    /// File name (with extension) that was last attempted
    pub final_name: String,

    pub error: Option<String>,
}

impl RenameOutcome {
    pub fn renamed(final_name: impl Into<String>) -> Self {
        Self {
            success: true,
            final_name: final_name.into(),
            error: None,
        }
    }

    pub fn failed(final_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            final_name: final_name.into(),
            error: Some(error.into()),
        }
    }
}

/// Everything known about one document after the pipeline ran
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutcome {
    /// Source document path
    pub source: PathBuf,

    /// Terminal state
    pub state: PipelineState,

    /// Last non-terminal stage entered
    pub stage_reached: PipelineState,

    /// Citation stem, once formatting ran
    pub citation: Option<String>,

    /// Rename result, once renaming ran
    pub rename: Option<RenameOutcome>,

    /// Error that ended the pipeline, if any
    pub error: Option<String>,
}

impl DocumentOutcome {
    /// Whether the file ended up under a new name
    pub fn renamed(&self) -> bool {
        self.rename.as_ref().is_some_and(|r| r.success)
    }
}
