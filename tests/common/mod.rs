//! Common test utilities for integration tests
//!
//! Shared fixtures and a scripted stand-in for flake8. These utilities are
//! not compiled into the library.

#![allow(dead_code)]

use anyhow::Result;
use flake8_markdown::{Checker, CheckerError, CheckerOutput};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Isolated test fixture with automatic cleanup
///
/// Creates a temporary copy of a fixture directory, allowing tests to run
/// in parallel without interfering with each other.
pub struct TestFixture {
    _dir: TempDir,
    root: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture from the default fixtures directory
    pub fn new() -> Result<Self> {
        Self::new_from("tests/fixtures")
    }

    /// Create a new test fixture from a specific source directory
    pub fn new_from(source: impl AsRef<Path>) -> Result<Self> {
        let dir = TempDir::new()?;
        copy_dir_all(source.as_ref(), dir.path())?;

        Ok(Self {
            root: dir.path().to_path_buf(),
            _dir: dir,
        })
    }

    /// An empty fixture for tests that write their own documents
    pub fn empty() -> Result<Self> {
        let dir = TempDir::new()?;
        Ok(Self {
            root: dir.path().to_path_buf(),
            _dir: dir,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Glob pattern rooted at the fixture directory
    pub fn pattern(&self, suffix: &str) -> String {
        format!("{}/{}", self.root.display(), suffix)
    }

    pub fn write(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

/// A flake8 stand-in that flags every `import` statement as unused.
///
/// Emits `stdin:<line>:1: F401 '<module>' imported but unused` and records
/// every snippet it was given.
#[derive(Default)]
pub struct UnusedImportChecker {
    inputs: Mutex<Vec<String>>,
}

impl UnusedImportChecker {
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

impl Checker for UnusedImportChecker {
    fn check<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<CheckerOutput, CheckerError>> {
        self.inputs.lock().unwrap().push(source.to_string());

        let stdout: String = source
            .lines()
            .enumerate()
            .filter_map(|(i, line)| {
                let module = line.strip_prefix("import ")?;
                Some(format!(
                    "stdin:{}:1: F401 '{}' imported but unused\n",
                    i + 1,
                    module.trim()
                ))
            })
            .collect();

        async move {
            Ok(CheckerOutput {
                exit_code: Some(if stdout.is_empty() { 0 } else { 1 }),
                stdout,
                stderr: String::new(),
            })
        }
        .boxed()
    }
}

/// A checker that cannot be found.
pub struct MissingChecker;

impl Checker for MissingChecker {
    fn check<'a>(&'a self, _: &'a str) -> BoxFuture<'a, Result<CheckerOutput, CheckerError>> {
        async {
            Err(CheckerError::NotFound {
                command: "flake8".to_string(),
            })
        }
        .boxed()
    }
}

/// Recursively copy all files and directories from src to dst
fn copy_dir_all(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<()> {
    std::fs::create_dir_all(&dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let ty = entry.file_type()?;
        if ty.is_dir() {
            copy_dir_all(entry.path(), dst.as_ref().join(entry.file_name()))?;
        } else {
            std::fs::copy(entry.path(), dst.as_ref().join(entry.file_name()))?;
        }
    }
    Ok(())
}
