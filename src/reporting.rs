use crate::runner::{FileOutcome, RunSummary};
use chrono::Local;
use std::path::Path;

/// Formats an error line with a timestamp and the crate prefix.
fn format_error(timestamp: &str, message: &str) -> String {
    format!("{} [ERROR] (flake8_markdown): {}", timestamp, message)
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Renders the stdout report for one document: one diagnostic per line.
///
/// Returns `None` for a document that passed or could not be checked.
pub fn render_diagnostics(outcome: &FileOutcome) -> Option<String> {
    match outcome {
        FileOutcome::Checked(result) if !result.passed() => Some(
            result
                .diagnostics
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        _ => None,
    }
}

/// Prints one document's outcome as soon as it is known.
///
/// Diagnostics go to stdout in a single write so they stay together even
/// when documents finish concurrently; failures go to stderr.
pub fn print_file_outcome(outcome: &FileOutcome) {
    if let Some(report) = render_diagnostics(outcome) {
        println!("{}", report);
    }
    if let FileOutcome::Failed { path, error } = outcome {
        report_file_error(path, error);
    }
}

/// Reports a document that could not be checked to stderr.
pub fn report_file_error(path: &Path, error: &anyhow::Error) {
    let timestamp = timestamp();

    eprintln!(
        "{}",
        format_error(&timestamp, &format!("Could not check {}", path.display()))
    );
    for line in format!("{:#}", error).lines() {
        eprintln!("{}", format_error(&timestamp, &format!("  {}", line)));
    }
}

/// Reports an error that stopped the whole run.
pub fn report_fatal(error: &anyhow::Error) {
    let timestamp = timestamp();

    for line in format!("{:#}", error).lines() {
        eprintln!("{}", format_error(&timestamp, line));
    }
}

/// Lines summarising the documents that did not pass, split into those
/// with findings and those that could not be checked.
pub fn render_failed_files(summary: &RunSummary) -> Vec<String> {
    let mut lines = Vec::new();

    let with_findings: Vec<&Path> = summary.files_with_findings().collect();
    if !with_findings.is_empty() {
        lines.push("Code blocks have findings in the following files:".to_string());
        lines.extend(with_findings.iter().map(|file| format!("  {}", file.display())));
    }

    if !summary.unchecked_files.is_empty() {
        lines.push("The following files could not be checked:".to_string());
        lines.extend(
            summary
                .unchecked_files
                .iter()
                .map(|file| format!("  {}", file.display())),
        );
    }

    lines
}

/// Lists the documents that did not pass.
pub fn report_failed_files(summary: &RunSummary) {
    let timestamp = timestamp();
    for line in render_failed_files(summary) {
        eprintln!("{}", format_error(&timestamp, &line));
    }
}

/// Logs run statistics.
///
/// - Totals at info level (`RUST_LOG=info`)
/// - Average time per document at debug level
pub fn log_statistics(summary: &RunSummary) {
    if summary.blocks_checked == 0 {
        log::info!("No Python code blocks found to check");
        return;
    }

    log::info!(
        "Checked {} code block(s) in {} file(s) in {}ms, {} diagnostic(s)",
        summary.blocks_checked,
        summary.files,
        summary.duration.as_millis(),
        summary.diagnostics
    );

    let avg_ms = summary.duration.as_millis() / summary.files.max(1) as u128;
    log::debug!("Average {}ms per file", avg_ms);
}
