//! Per-document result log.
//!
//! The coordinator reports every outcome through the [`RenameLog`] sink it was
//! built with. [`TracingLog`] forwards entries to the tracing subscriber,
//! [`JsonlLog`] additionally appends them to a timestamped JSON-lines file for
//! unattended runs, and [`MemoryLog`] keeps them in memory for tests.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Severity of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    /// `renamed`, `fallback`, `dry_run`, `rename_failed`, or an error kind
    pub kind: String,
    /// Source file name before renaming
    pub old_name: String,
    /// Name that was tried and rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempted_name: Option<String>,
    /// Name the file ended up with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    pub message: String,
}

impl LogEntry {
    pub fn new(
        level: LogLevel,
        kind: impl Into<String>,
        old_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            kind: kind.into(),
            old_name: old_name.into(),
            attempted_name: None,
            new_name: None,
            message: message.into(),
        }
    }

    pub fn attempted(mut self, name: impl Into<String>) -> Self {
        self.attempted_name = Some(name.into());
        self
    }

    pub fn renamed_to(mut self, name: impl Into<String>) -> Self {
        self.new_name = Some(name.into());
        self
    }
}

/// Append-only sink for per-document results
pub trait RenameLog: Send + Sync + std::fmt::Debug {
    fn append(&self, entry: LogEntry);
}

/// Sink that emits entries as tracing events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl RenameLog for TracingLog {
    fn append(&self, entry: LogEntry) {
        let new_name = entry.new_name.as_deref().unwrap_or("");
        let attempted = entry.attempted_name.as_deref().unwrap_or("");
        match entry.level {
            LogLevel::Info => tracing::info!(
                kind = %entry.kind,
                old_name = %entry.old_name,
                new_name = %new_name,
                "{}",
                entry.message
            ),
            LogLevel::Warn => tracing::warn!(
                kind = %entry.kind,
                old_name = %entry.old_name,
                attempted = %attempted,
                "{}",
                entry.message
            ),
            LogLevel::Error => tracing::error!(
                kind = %entry.kind,
                old_name = %entry.old_name,
                attempted = %attempted,
                "{}",
                entry.message
            ),
        }
    }
}

/// Sink that appends JSON lines to a file and mirrors entries to tracing
#[derive(Debug)]
pub struct JsonlLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlLog {
    /// Open (or create) a log file for appending
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Open a log named after the current time inside `log_dir`
    pub fn timestamped(log_dir: &Path) -> io::Result<Self> {
        let name = format!("{}.jsonl", Local::now().format("%Y%m%d%H%M%S"));
        Self::open(log_dir.join(name))
    }

    /// Read entries back, oldest first
    pub fn read_entries(path: &Path) -> io::Result<Vec<LogEntry>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(path)?);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if let Ok(entry) = serde_json::from_str(&line) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Get log file path (for external access)
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_entry(&self, entry: &LogEntry) -> io::Result<()> {
        let json = serde_json::to_string(entry)?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        writeln!(file, "{}", json)?;
        file.flush()
    }
}

impl RenameLog for JsonlLog {
    fn append(&self, entry: LogEntry) {
        if let Err(e) = self.append_entry(&entry) {
            tracing::warn!("Failed to write log entry to {}: {}", self.path.display(), e);
        }
        TracingLog.append(entry);
    }
}

/// Sink that keeps entries in memory
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Entries of one kind
    pub fn of_kind(&self, kind: &str) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect()
    }
}

impl RenameLog for MemoryLog {
    fn append(&self, entry: LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }
}
