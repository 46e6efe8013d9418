//! Single rename attempts.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::sources::ResolveError;
use crate::utils::{sanitize_with, SanitizeMode};

/// Extension given to every renamed document
pub const PDF_EXTENSION: &str = "pdf";

/// Result of one attempt to move a document under a candidate name
#[derive(Debug)]
pub enum RenameAttempt {
    /// The file now lives at this path
    Renamed(PathBuf),
    /// The name was rejected; a sanitized name may still work
    NeedsSanitization(String),
    /// Retrying with a sanitized name cannot help
    Fatal(ResolveError),
}

/// Options shared by every attempt
#[derive(Debug, Clone, Copy, Default)]
pub struct RenameOptions {
    pub overwrite: bool,
    pub sanitize_mode: SanitizeMode,
}

/// Target file name for a stem
pub fn target_file_name(stem: &str) -> String {
    format!("{}.{}", stem, PDF_EXTENSION)
}

/// Try to move `source` to `{output_dir}/{stem}.pdf`.
///
/// An existing target is never replaced unless `overwrite` is set. Without
/// `overwrite` the target is first claimed with an exclusive create, so a file
/// appearing there between the check and the move cannot be clobbered. A stem
/// that would place the file outside `output_dir` is rejected before the
/// filesystem is touched.
pub async fn attempt_rename(
    source: &Path,
    output_dir: &Path,
    stem: &str,
    options: RenameOptions,
) -> RenameAttempt {
    let file_name = target_file_name(stem);
    let target = output_dir.join(&file_name);
    let sanitizable = sanitize_with(stem, options.sanitize_mode) != stem;
    let rejected = |e: std::io::Error| {
        if sanitizable {
            RenameAttempt::NeedsSanitization(e.to_string())
        } else {
            RenameAttempt::Fatal(ResolveError::Io(e))
        }
    };

    if target.parent() != Some(output_dir) || target.file_name().is_none() {
        let reason = format!("{:?} is not a plain file name", file_name);
        return if sanitizable {
            RenameAttempt::NeedsSanitization(reason)
        } else {
            RenameAttempt::Fatal(ResolveError::Rename(reason))
        };
    }

    if target == source {
        return RenameAttempt::Renamed(target);
    }

    if !options.overwrite {
        let claimed = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await;
        match claimed {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return RenameAttempt::Fatal(ResolveError::Rename(format!(
                    "{} already exists",
                    target.display()
                )));
            }
            Err(e) => return rejected(e),
        }
    }

    match tokio::fs::rename(source, &target).await {
        Ok(()) => RenameAttempt::Renamed(target),
        Err(e) => {
            if !options.overwrite {
                // Drop the empty placeholder claimed above
                if let Err(cleanup) = tokio::fs::remove_file(&target).await {
                    tracing::warn!("Could not remove placeholder {}: {}", target.display(), cleanup);
                }
            }
            rejected(e)
        }
    }
}
