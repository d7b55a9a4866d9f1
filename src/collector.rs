use anyhow::{Context, Result};
use globset::GlobBuilder;
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Characters that make a path component a glob rather than a literal.
const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Expands one glob pattern into the files it matches.
///
/// `*` and `?` stay within a path component, `**` spans any number of
/// directories, hidden entries are skipped the way a shell glob skips them.
/// Symbolic links are followed, so a linked document is checked under the
/// name of its link.
/// A pattern without glob characters names a file directly. Patterns that
/// match nothing yield an empty list.
///
/// # Errors
///
/// Returns an error if the pattern is not valid glob syntax.
pub fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    if !pattern.contains(GLOB_META) {
        let path = PathBuf::from(pattern);
        if path.is_file() {
            return Ok(vec![path]);
        }
        log::debug!("No file matches {}", pattern);
        return Ok(Vec::new());
    }

    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("Invalid glob pattern: {}", pattern))?
        .compile_matcher();

    let base = literal_base(pattern);
    let relative_to_cwd = base.as_os_str().is_empty();
    let root = if relative_to_cwd { Path::new(".") } else { base.as_path() };
    if !root.is_dir() {
        log::debug!("No directory {} for pattern {}", root.display(), pattern);
        return Ok(Vec::new());
    }

    let mut matches = Vec::new();
    for entry in WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(true)
        .follow_links(true)
        .build()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable path while expanding {}: {}", pattern, e);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ty| ty.is_file()) {
            continue;
        }

        let path = if relative_to_cwd {
            entry.path().strip_prefix(".").unwrap_or(entry.path())
        } else {
            entry.path()
        };
        if matcher.is_match(path) {
            matches.push(path.to_path_buf());
        }
    }

    matches.sort();
    log::debug!("{} matched {} file(s)", pattern, matches.len());
    Ok(matches)
}

/// The leading components of a pattern that contain no glob characters.
fn literal_base(pattern: &str) -> PathBuf {
    let mut base = if pattern.starts_with('/') {
        PathBuf::from("/")
    } else {
        PathBuf::new()
    };

    let mut components: Vec<&str> = pattern.split('/').filter(|c| !c.is_empty()).collect();
    // The last component names files, never the directory to walk.
    components.pop();
    for component in components {
        if component.contains(GLOB_META) {
            break;
        }
        base.push(component);
    }
    base
}

/// Expands every pattern, one blocking task per pattern.
///
/// Paths are returned in pattern order with duplicates removed.
pub async fn collect_documents(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let expansions =
        futures::future::try_join_all(patterns.iter().cloned().map(expand_in_background)).await?;

    let mut seen = HashSet::new();
    let documents: Vec<PathBuf> = expansions
        .into_iter()
        .flatten()
        .filter(|path| seen.insert(path.clone()))
        .collect();

    log::info!(
        "Found {} document(s) for {} pattern(s)",
        documents.len(),
        patterns.len()
    );
    Ok(documents)
}

async fn expand_in_background(pattern: String) -> Result<Vec<PathBuf>> {
    tokio::task::spawn_blocking(move || expand_pattern(&pattern))
        .await
        .context("Pattern expansion task panicked")?
}
