//! End-to-end library tests for the linter
//!
//! These run the full pipeline (glob expansion, extraction, prompt
//! stripping, checking, remapping) against fixture documents, with a
//! scripted checker standing in for flake8 so no Python toolchain is needed.

mod common;

use anyhow::Result;
use common::{MissingChecker, TestFixture, UnusedImportChecker};
use flake8_markdown::{Checker, CheckerError, FenceTags, FileOutcome, Linter, RunSummary};
use std::collections::BTreeMap;
use std::sync::Arc;

struct Run {
    summary: RunSummary,
    /// Rendered diagnostics per document, relative to the fixture root
    reports: BTreeMap<String, Vec<String>>,
    failures: Vec<String>,
}

async fn run_linter(
    fixture: &TestFixture,
    checker: Arc<dyn Checker>,
    tags: FenceTags,
    jobs: usize,
    patterns: &[String],
) -> Result<Run> {
    let linter = Linter::new(tags, checker, jobs);
    let prefix = format!("{}/", fixture.root().display());
    let relative = |s: String| s.replacen(&prefix, "", 1);

    let mut reports = BTreeMap::new();
    let mut failures = Vec::new();
    let summary = linter
        .run(patterns, |outcome| match outcome {
            FileOutcome::Checked(result) => {
                let rendered = result
                    .diagnostics
                    .iter()
                    .map(|d| relative(d.to_string()))
                    .collect();
                reports.insert(relative(result.path.display().to_string()), rendered);
            }
            FileOutcome::Failed { path, .. } => {
                failures.push(relative(path.display().to_string()));
            }
        })
        .await?;

    Ok(Run {
        summary,
        reports,
        failures,
    })
}

async fn run_default(fixture: &TestFixture, patterns: &[String]) -> Result<Run> {
    run_linter(
        fixture,
        Arc::new(UnusedImportChecker::default()),
        FenceTags::default(),
        4,
        patterns,
    )
    .await
}

#[tokio::test]
async fn linter_reports_at_document_positions() -> Result<()> {
    let fixture = TestFixture::new()?;
    let run = run_default(&fixture, &[fixture.pattern("basic.md")]).await?;

    assert_eq!(
        run.reports["basic.md"],
        vec![
            "basic.md:6:1: F401 'os' imported but unused",
            "basic.md:12:1: F401 'sys' imported but unused",
        ]
    );
    assert_eq!(run.summary.blocks_checked, 2);
    assert_eq!(run.summary.exit_code(), 1);
    Ok(())
}

#[tokio::test]
async fn linter_corrects_columns_of_session_lines() -> Result<()> {
    let fixture = TestFixture::new()?;
    let checker = Arc::new(UnusedImportChecker::default());
    let run = run_linter(
        &fixture,
        checker.clone(),
        FenceTags::default(),
        1,
        &[fixture.pattern("pycon.md")],
    )
    .await?;

    assert_eq!(checker.inputs(), vec!["import os\nprint('hello')\nhello\n"]);
    assert_eq!(
        run.reports["pycon.md"],
        vec!["pycon.md:4:5: F401 'os' imported but unused"]
    );
    Ok(())
}

#[tokio::test]
async fn linter_accepts_annotated_fences() -> Result<()> {
    let fixture = TestFixture::new()?;
    let checker = Arc::new(UnusedImportChecker::default());
    let run = run_linter(
        &fixture,
        checker.clone(),
        FenceTags::default(),
        1,
        &[fixture.pattern("emphasized_lines.md")],
    )
    .await?;

    assert_eq!(checker.inputs(), vec!["print(undefined_name)\n"]);
    assert!(run.summary.passed());
    Ok(())
}

#[tokio::test]
async fn linter_ignores_other_languages() -> Result<()> {
    let fixture = TestFixture::new()?;
    let checker = Arc::new(UnusedImportChecker::default());
    let run = run_linter(
        &fixture,
        checker.clone(),
        FenceTags::default(),
        1,
        &[fixture.pattern("only_markdown.md")],
    )
    .await?;

    assert!(checker.inputs().is_empty());
    assert_eq!(run.summary.files, 1);
    assert_eq!(run.summary.blocks_checked, 0);
    assert_eq!(run.summary.exit_code(), 0);
    Ok(())
}

#[tokio::test]
async fn linter_recursive_glob_covers_every_document() -> Result<()> {
    let fixture = TestFixture::new()?;
    fixture.write(
        "guide/advanced/imports.md",
        "# Imports\n\n```py\nimport json\n```\n",
    )?;

    let run = run_default(&fixture, &[fixture.pattern("**/*.md")]).await?;

    assert_eq!(run.summary.files, 6);
    assert_eq!(run.summary.diagnostics, 4);
    assert_eq!(
        run.reports["guide/advanced/imports.md"],
        vec!["guide/advanced/imports.md:4:1: F401 'json' imported but unused"]
    );
    assert!(run.reports["good.md"].is_empty());

    let mut failed: Vec<_> = run
        .summary
        .failed_files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    failed.sort();
    assert_eq!(failed, vec!["basic.md", "imports.md", "pycon.md"]);
    Ok(())
}

#[tokio::test]
async fn linter_results_do_not_depend_on_job_count() -> Result<()> {
    let fixture = TestFixture::new()?;
    let patterns = [fixture.pattern("*.md")];

    let sequential = run_linter(
        &fixture,
        Arc::new(UnusedImportChecker::default()),
        FenceTags::default(),
        1,
        &patterns,
    )
    .await?;
    let parallel = run_linter(
        &fixture,
        Arc::new(UnusedImportChecker::default()),
        FenceTags::default(),
        8,
        &patterns,
    )
    .await?;

    assert_eq!(sequential.reports, parallel.reports);
    assert_eq!(sequential.summary.diagnostics, parallel.summary.diagnostics);
    Ok(())
}

#[tokio::test]
async fn linter_non_matching_glob_passes() -> Result<()> {
    let fixture = TestFixture::new()?;
    let run = run_default(&fixture, &[fixture.pattern("nowhere/**/*.md")]).await?;

    assert_eq!(run.summary.files, 0);
    assert_eq!(run.summary.exit_code(), 0);
    Ok(())
}

#[tokio::test]
async fn linter_unreadable_document_fails_alone() -> Result<()> {
    let fixture = TestFixture::new()?;
    std::fs::write(fixture.path("binary.md"), [0xff, 0xfe, 0x00, 0x80])?;

    let run = run_default(&fixture, &[fixture.pattern("*.md")]).await?;

    assert_eq!(run.failures, vec!["binary.md"]);
    assert_eq!(run.reports.len(), 5);
    assert_eq!(run.summary.exit_code(), 1);
    Ok(())
}

#[tokio::test]
async fn linter_missing_checker_aborts_run() -> Result<()> {
    let fixture = TestFixture::new()?;
    let result = run_linter(
        &fixture,
        Arc::new(MissingChecker),
        FenceTags::default(),
        2,
        &[fixture.pattern("*.md")],
    )
    .await;

    let err = result.err().expect("missing checker should abort the run");
    assert!(matches!(
        err.downcast_ref::<CheckerError>(),
        Some(CheckerError::NotFound { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn linter_custom_fence_tags() -> Result<()> {
    let fixture = TestFixture::empty()?;
    fixture.write(
        "custom.md",
        "```python3\nimport os\n```\n\n```python\nimport sys\n```\n",
    )?;

    let tags = FenceTags::new(vec!["python3".to_string()], Vec::new());
    let checker = Arc::new(UnusedImportChecker::default());
    let run = run_linter(&fixture, checker.clone(), tags, 1, &[fixture.pattern("*.md")]).await?;

    assert_eq!(checker.inputs(), vec!["import os\n"]);
    assert_eq!(
        run.reports["custom.md"],
        vec!["custom.md:2:1: F401 'os' imported but unused"]
    );
    Ok(())
}
