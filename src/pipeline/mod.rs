//! Per-document rename pipeline.
//!
//! [`RenameCoordinator`] drives one document through
//! `Extracting → Searching → Formatting → Renaming` and ends in `Done`,
//! `Fallback` or `Aborted`. Failures never escape a document: they are
//! reported through the injected [`RenameLog`] and recorded on the returned
//! [`DocumentOutcome`], and the next document is processed as usual.

mod log;
mod rename;

pub use log::{JsonlLog, LogEntry, LogLevel, MemoryLog, RenameLog, TracingLog};
pub use rename::{attempt_rename, target_file_name, RenameAttempt, RenameOptions, PDF_EXTENSION};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::models::{DocumentOutcome, PipelineState, RenameOutcome};
use crate::sources::{
    BibliographicSearch, CiniiSearchClient, MetadataExtractor, OpenAiExtractor, ResolveError,
};
use crate::utils::{extract_first_page, format_citation, sanitize_with, HttpClient};

/// Sequences extraction, search, formatting and rename for one document at a time
#[derive(Debug, Clone)]
pub struct RenameCoordinator {
    extractor: Arc<dyn MetadataExtractor>,
    search: Arc<dyn BibliographicSearch>,
    log: Arc<dyn RenameLog>,
    output_dir: PathBuf,
    options: RenameOptions,
    dry_run: bool,
}

/// Counts for one directory run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<DocumentOutcome>,
}

impl RunSummary {
    pub fn count(&self, state: PipelineState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }

    pub fn renamed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.renamed()).count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

struct Progress {
    source: PathBuf,
    old_name: String,
    stage: PipelineState,
    citation: Option<String>,
}

impl Progress {
    fn new(source: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            old_name: display_name(source),
            stage: PipelineState::Extracting,
            citation: None,
        }
    }

    fn enter(&mut self, stage: PipelineState) {
        tracing::debug!("{}: {} -> {}", self.old_name, self.stage, stage);
        self.stage = stage;
    }

    fn finish(
        self,
        state: PipelineState,
        rename: Option<RenameOutcome>,
        error: Option<String>,
    ) -> DocumentOutcome {
        DocumentOutcome {
            source: self.source,
            state,
            stage_reached: self.stage,
            citation: self.citation,
            rename,
            error,
        }
    }
}

impl RenameCoordinator {
    pub fn new(
        config: &Config,
        extractor: Arc<dyn MetadataExtractor>,
        search: Arc<dyn BibliographicSearch>,
        log: Arc<dyn RenameLog>,
    ) -> Self {
        Self {
            extractor,
            search,
            log,
            output_dir: config.paths.output_dir.clone(),
            options: RenameOptions {
                overwrite: config.rename.overwrite,
                sanitize_mode: config.rename.sanitize_mode,
            },
            dry_run: false,
        }
    }

    /// Build the production pipeline: OpenAI extractor, CiNii search, tracing log
    pub fn from_config(config: &Config) -> Result<Self, ResolveError> {
        let client = HttpClient::with_config(&config.http)?;
        let extractor = OpenAiExtractor::new(&config.llm, client.clone())?;
        let search = CiniiSearchClient::new(&config.search, client);

        Ok(Self::new(
            config,
            Arc::new(extractor),
            Arc::new(search),
            Arc::new(TracingLog),
        ))
    }

    /// Replace the log sink
    pub fn with_log(mut self, log: Arc<dyn RenameLog>) -> Self {
        self.log = log;
        self
    }

    /// Resolve and log names without moving any file
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Resolve the citation stem for a document's text without renaming
    pub async fn resolve_citation(&self, document_text: &str) -> Result<String, ResolveError> {
        let guess = self.extractor.extract(document_text).await?;
        let record = self.search.resolve(&guess).await?;
        Ok(format_citation(&record))
    }

    /// Read the first page of `source` and run the pipeline on it
    pub async fn process_file(&self, source: &Path, max_chars: usize) -> DocumentOutcome {
        let path = source.to_path_buf();
        let extracted =
            tokio::task::spawn_blocking(move || extract_first_page(&path, max_chars)).await;

        let text = match extracted {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return self.abort(Progress::new(source), "extract", e.to_string()),
            Err(e) => return self.abort(Progress::new(source), "extract", e.to_string()),
        };

        self.process(source, &text).await
    }

    /// Run the pipeline for one document whose text is already extracted
    pub async fn process(&self, source: &Path, document_text: &str) -> DocumentOutcome {
        let mut progress = Progress::new(source);

        // Extracting
        let guess = match self.extractor.extract(document_text).await {
            Ok(guess) => guess,
            Err(e) => return self.abort_with(progress, e),
        };

        // Searching
        progress.enter(PipelineState::Searching);
        let record = match self.search.resolve(&guess).await {
            Ok(record) => record,
            Err(e) => return self.abort_with(progress, e),
        };

        // Formatting
        progress.enter(PipelineState::Formatting);
        let stem = format_citation(&record);
        progress.citation = Some(stem.clone());

        if self.dry_run {
            self.log.append(
                LogEntry::new(LogLevel::Info, "dry_run", &progress.old_name, "Would rename")
                    .renamed_to(target_file_name(&stem)),
            );
            return progress.finish(PipelineState::Done, None, None);
        }

        // Renaming
        progress.enter(PipelineState::Renaming);
        self.rename(progress, &stem).await
    }

    async fn rename(&self, progress: Progress, stem: &str) -> DocumentOutcome {
        let first_name = target_file_name(stem);

        let reason = match attempt_rename(&progress.source, &self.output_dir, stem, self.options).await {
            RenameAttempt::Renamed(path) => {
                let new_name = display_name(&path);
                self.log.append(
                    LogEntry::new(LogLevel::Info, "renamed", &progress.old_name, "Renamed")
                        .renamed_to(&new_name),
                );
                return progress.finish(
                    PipelineState::Done,
                    Some(RenameOutcome::renamed(new_name)),
                    None,
                );
            }
            RenameAttempt::Fatal(e) => {
                return self.rename_failed(progress, &first_name, e.to_string());
            }
            RenameAttempt::NeedsSanitization(reason) => reason,
        };

        // Fallback
        let sanitized = sanitize_with(stem, self.options.sanitize_mode);
        let second_name = target_file_name(&sanitized);
        self.log.append(
            LogEntry::new(
                LogLevel::Warn,
                "fallback",
                &progress.old_name,
                format!("Name may contain reserved characters ({}), retrying as {}", reason, second_name),
            )
            .attempted(&first_name),
        );

        match attempt_rename(&progress.source, &self.output_dir, &sanitized, self.options).await {
            RenameAttempt::Renamed(path) => {
                let new_name = display_name(&path);
                self.log.append(
                    LogEntry::new(
                        LogLevel::Info,
                        "renamed",
                        &progress.old_name,
                        "Renamed after replacing reserved characters",
                    )
                    .attempted(&first_name)
                    .renamed_to(&new_name),
                );
                progress.finish(
                    PipelineState::Fallback,
                    Some(RenameOutcome::renamed(new_name)),
                    None,
                )
            }
            RenameAttempt::NeedsSanitization(reason) => {
                self.fallback_failed(progress, &second_name, reason)
            }
            RenameAttempt::Fatal(e) => self.fallback_failed(progress, &second_name, e.to_string()),
        }
    }

    fn rename_failed(&self, progress: Progress, name: &str, error: String) -> DocumentOutcome {
        self.log.append(
            LogEntry::new(LogLevel::Error, "rename_failed", &progress.old_name, &error)
                .attempted(name),
        );
        progress.finish(
            PipelineState::Aborted,
            Some(RenameOutcome::failed(name, &error)),
            Some(error),
        )
    }

    fn fallback_failed(&self, progress: Progress, name: &str, error: String) -> DocumentOutcome {
        self.log.append(
            LogEntry::new(
                LogLevel::Error,
                "rename_failed",
                &progress.old_name,
                format!("Rename failed: {}", error),
            )
            .attempted(name),
        );
        progress.finish(
            PipelineState::Fallback,
            Some(RenameOutcome::failed(name, &error)),
            Some(error),
        )
    }

    fn abort_with(&self, progress: Progress, error: ResolveError) -> DocumentOutcome {
        self.abort(progress, error.kind(), error.to_string())
    }

    fn abort(&self, progress: Progress, kind: &str, message: String) -> DocumentOutcome {
        self.log.append(LogEntry::new(
            LogLevel::Error,
            kind,
            &progress.old_name,
            format!("Could not build a new name at stage {}: {}", progress.stage, message),
        ));
        progress.finish(PipelineState::Aborted, None, Some(message))
    }

    /// Process every `*.pdf` in `input_dir`, one after another.
    ///
    /// `on_done` is called after each document. Only a failure to list the
    /// input directory or create the output directory is returned as an error.
    pub async fn run_directory<F>(
        &self,
        input_dir: &Path,
        max_chars: usize,
        on_done: F,
    ) -> Result<RunSummary, ResolveError>
    where
        F: FnMut(&DocumentOutcome),
    {
        let documents = list_documents(input_dir)?;
        tracing::info!("Processing {} documents from {}", documents.len(), input_dir.display());
        self.run_documents(documents, max_chars, on_done).await
    }

    /// Process an already listed set of documents in order.
    ///
    /// The output directory is created first unless this is a dry run.
    pub async fn run_documents<F>(
        &self,
        documents: Vec<PathBuf>,
        max_chars: usize,
        mut on_done: F,
    ) -> Result<RunSummary, ResolveError>
    where
        F: FnMut(&DocumentOutcome),
    {
        if !self.dry_run {
            tokio::fs::create_dir_all(&self.output_dir).await?;
        }

        let mut summary = RunSummary::default();
        for path in documents {
            let outcome = self.process_file(&path, max_chars).await;
            on_done(&outcome);
            summary.outcomes.push(outcome);
        }
        Ok(summary)
    }
}

/// PDF files directly inside `dir`, sorted by name
pub fn list_documents(dir: &Path) -> Result<Vec<PathBuf>, ResolveError> {
    let mut documents: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_pdf(path))
        .collect();
    documents.sort();
    Ok(documents)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PDF_EXTENSION))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
