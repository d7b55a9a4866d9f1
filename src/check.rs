use crate::checker::{Checker, CheckerError};
use crate::diagnostic::{parse_checker_line, CheckerLine, Diagnostic};
use crate::extractor::{extract_code_blocks, CodeBlock};
use crate::fence::FenceTags;
use crate::remap::to_document;
use crate::session::{normalize, NormalizedBlock};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Result of checking a single code block.
#[derive(Debug, Clone)]
pub struct BlockOutcome {
    pub diagnostics: Vec<Diagnostic>,
    pub duration: Duration,
}

impl BlockOutcome {
    /// A block passes when the checker reported nothing for it.
    pub fn passed(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Result of checking every code block of one document.
///
/// Diagnostics are in block order and, within a block, in the order the
/// checker printed them.
#[derive(Debug, Clone)]
pub struct LintResult {
    pub path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
    pub blocks_checked: usize,
    pub duration: Duration,
}

impl LintResult {
    pub fn passed(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Checks one block and maps the findings onto `document`.
///
/// Only parsed output lines decide the outcome; the checker's exit status is
/// ignored. Lines that do not look like diagnostics are kept verbatim.
///
/// # Errors
///
/// Returns an error if the checker could not be run.
pub async fn check_block(
    block: &CodeBlock,
    document: &Path,
    checker: &dyn Checker,
) -> Result<BlockOutcome, CheckerError> {
    let start = Instant::now();
    let normalized = normalize(block);

    let output = checker.check(&normalized.checkable_text).await?;
    if !output.stderr.trim().is_empty() {
        log::debug!(
            "Checker stderr for block at {}:{}:\n{}",
            document.display(),
            block.start_line,
            output.stderr.trim_end()
        );
    }

    let diagnostics = output
        .stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| remap_output_line(line, block, &normalized, document))
        .collect();

    Ok(BlockOutcome {
        diagnostics,
        duration: start.elapsed(),
    })
}

fn remap_output_line(
    line: &str,
    block: &CodeBlock,
    normalized: &NormalizedBlock,
    document: &Path,
) -> Diagnostic {
    match parse_checker_line(line) {
        CheckerLine::Located { position, rest, .. } => {
            if position.line == 0 || position.line > block.line_count() {
                log::debug!(
                    "Checker line {} is outside the {}-line block at {}:{}",
                    position.line,
                    block.line_count(),
                    document.display(),
                    block.start_line
                );
            }
            let position = to_document(position, block.start_line, normalized);
            Diagnostic::located(document, position, rest)
        }
        CheckerLine::Unparsed(text) => Diagnostic::verbatim(document, text),
    }
}

/// Checks every code block of a document's content, one block at a time.
pub async fn lint_document(
    path: &Path,
    content: &str,
    tags: &FenceTags,
    checker: &dyn Checker,
) -> Result<LintResult, CheckerError> {
    let start = Instant::now();
    let blocks = extract_code_blocks(content, tags);
    log::debug!("{}: {} code block(s)", path.display(), blocks.len());

    let mut diagnostics = Vec::new();
    for (index, block) in blocks.iter().enumerate() {
        let outcome = check_block(block, path, checker).await?;
        log::debug!(
            "[CODE_CHECK_TIME] {} block #{} ({:?}): {}ms, {} diagnostic(s)",
            path.display(),
            index,
            block.kind,
            outcome.duration.as_millis(),
            outcome.diagnostics.len()
        );
        diagnostics.extend(outcome.diagnostics);
    }

    Ok(LintResult {
        path: path.to_path_buf(),
        diagnostics,
        blocks_checked: blocks.len(),
        duration: start.elapsed(),
    })
}

/// Reads a document and checks it.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the checker cannot be run.
/// A [`CheckerError`] stays reachable through `downcast_ref`.
pub async fn lint_file(path: &Path, tags: &FenceTags, checker: &dyn Checker) -> Result<LintResult> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Ok(lint_document(path, &content, tags, checker).await?)
}
