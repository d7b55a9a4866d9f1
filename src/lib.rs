//! flake8-markdown library
//!
//! Lints the Python code blocks embedded in Markdown documents with an
//! external style checker (flake8 by default) and reports the findings at
//! their positions in the Markdown source. The primary interface is the
//! `flake8-markdown` binary; the library is exposed for testing and custom
//! integrations.
//!
//! ## Public API
//!
//! - [`Linter`] - expands glob patterns and checks every matching document
//! - [`lint_file`] / [`lint_document`] / [`check_block`] - the per-document pipeline
//! - [`extract_code_blocks`] - finds `python`, `py` and `pycon` fenced blocks
//! - [`Checker`] - the seam to the external checker, implemented by [`CommandChecker`]
//! - [`LintConfig`] - configuration loaded from TOML

mod check;
mod checker;
mod collector;
mod config;
mod diagnostic;
mod extractor;
mod fence;
mod remap;
pub mod reporting;
mod runner;
mod session;

pub use check::{check_block, lint_document, lint_file, BlockOutcome, LintResult};
pub use checker::{Checker, CheckerError, CheckerOutput, CommandChecker};
pub use collector::{collect_documents, expand_pattern};
pub use config::{CheckerConfig, FenceConfig, LintConfig};
pub use diagnostic::{parse_checker_line, CheckerLine, Diagnostic};
pub use extractor::{extract_code_blocks, CodeBlock};
pub use fence::{BlockKind, FenceTags};
pub use remap::{to_document, Position};
pub use runner::{FileOutcome, Linter, RunSummary};
pub use session::{normalize, NormalizedBlock};
