use crate::check::{lint_file, LintResult};
use crate::checker::{Checker, CheckerError, CommandChecker};
use crate::collector::collect_documents;
use crate::config::LintConfig;
use crate::fence::FenceTags;
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What happened to one document.
#[derive(Debug)]
pub enum FileOutcome {
    /// Every block was handed to the checker.
    Checked(LintResult),
    /// The document could not be checked (unreadable, checker timed out, ...).
    Failed { path: PathBuf, error: anyhow::Error },
}

impl FileOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Checked(result) => &result.path,
            Self::Failed { path, .. } => path,
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, Self::Checked(result) if result.passed())
    }
}

/// Totals for a whole run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub files: usize,
    pub blocks_checked: usize,
    pub diagnostics: usize,
    /// Documents with findings or that failed, in completion order
    pub failed_files: Vec<PathBuf>,
    /// The subset of `failed_files` that could not be checked at all
    pub unchecked_files: Vec<PathBuf>,
    pub duration: Duration,
}

impl RunSummary {
    fn record(&mut self, outcome: &FileOutcome) {
        self.files += 1;
        if let FileOutcome::Checked(result) = outcome {
            self.blocks_checked += result.blocks_checked;
            self.diagnostics += result.diagnostics.len();
        }
        if !outcome.passed() {
            self.failed_files.push(outcome.path().to_path_buf());
        }
        if let FileOutcome::Failed { path, .. } = outcome {
            self.unchecked_files.push(path.clone());
        }
    }

    /// Documents that were checked and produced findings.
    pub fn files_with_findings(&self) -> impl Iterator<Item = &Path> {
        self.failed_files
            .iter()
            .filter(|path| !self.unchecked_files.contains(*path))
            .map(PathBuf::as_path)
    }

    pub fn passed(&self) -> bool {
        self.failed_files.is_empty()
    }

    /// Process exit status: 0 when every document passed, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }
}

/// Lints the Python code blocks of many Markdown documents.
///
/// Documents are checked concurrently, up to `jobs` at a time, each on its
/// own task; the blocks of a document are checked one after another.
pub struct Linter {
    tags: Arc<FenceTags>,
    checker: Arc<dyn Checker>,
    jobs: usize,
}

impl Linter {
    pub fn new(tags: FenceTags, checker: Arc<dyn Checker>, jobs: usize) -> Self {
        Self {
            tags: Arc::new(tags),
            checker,
            jobs: jobs.max(1),
        }
    }

    pub fn from_config(config: &LintConfig) -> Self {
        Self::new(
            FenceTags::from_config(&config.fences),
            Arc::new(CommandChecker::from_config(&config.checker)),
            config.jobs(),
        )
    }

    /// Expands `patterns` and lints every matching document.
    ///
    /// `on_file` sees each outcome as soon as its document is done, so the
    /// diagnostics of one document arrive together and in order while
    /// documents themselves arrive in completion order.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is invalid or the checker cannot be run
    /// at all. Problems confined to one document are reported through
    /// [`FileOutcome::Failed`] instead.
    pub async fn run<F>(&self, patterns: &[String], mut on_file: F) -> Result<RunSummary>
    where
        F: FnMut(&FileOutcome),
    {
        let start = Instant::now();
        let documents = collect_documents(patterns).await?;

        let mut outcomes = stream::iter(documents)
            .map(|path| {
                let tags = Arc::clone(&self.tags);
                let checker = Arc::clone(&self.checker);
                tokio::spawn(async move {
                    match lint_file(&path, &tags, checker.as_ref()).await {
                        Ok(result) => FileOutcome::Checked(result),
                        Err(error) => FileOutcome::Failed { path, error },
                    }
                })
            })
            .buffer_unordered(self.jobs);

        let mut summary = RunSummary::default();
        while let Some(joined) = outcomes.next().await {
            let outcome = match joined.context("Lint task panicked")? {
                FileOutcome::Failed { error, .. } if is_fatal(&error) => return Err(error),
                outcome => outcome,
            };

            if let FileOutcome::Checked(result) = &outcome {
                log::debug!(
                    "[FILE_CHECK_TIME] {}: {} block(s) in {}ms",
                    result.path.display(),
                    result.blocks_checked,
                    result.duration.as_millis()
                );
            }

            on_file(&outcome);
            summary.record(&outcome);
        }

        summary.duration = start.elapsed();
        Ok(summary)
    }
}

fn is_fatal(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<CheckerError>()
        .is_some_and(CheckerError::is_fatal)
}
