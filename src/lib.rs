//! Shared library for the devstandards catalog.
//!
//! The crate keeps an in-memory catalog of development standards fed by
//! pluggable sources. `StandardsAggregator::refresh_all` pulls each source and
//! reconciles the catalog so it holds exactly what each source last reported.
//! Read paths (`query`, `get_by_id`, `category_counts`) run against that
//! catalog; `StandardsAggregator::search` reads sources directly.
//!
//! The `standards` binary wraps these operations behind JSON responses on
//! stdout. Project discovery lives here so the binary and tests agree on where
//! the `data/` directory is.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub mod aggregator;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod logging;
pub mod snapshot;
pub mod sources;

pub use aggregator::{
    DEFAULT_SEARCH_LIMIT, RefreshReport, SearchRequest, SourceFailure, SourceSync,
    StandardsAggregator,
};
pub use catalog::{
    CategoryInfo, CategoryOverview, DEFAULT_QUERY_LIMIT, KNOWN_SEVERITIES, Origin, QuerySpec,
    Severity, SourceInfo, Standard, StandardId, StandardsCatalog, SyncSummary,
};
pub use config::{Config, LogFormat};
pub use errors::{CatalogError, PersistenceError, RegistryError, SourceError, ValidationError};
pub use snapshot::{JsonSnapshotStore, SnapshotBatch, SnapshotStore};
pub use sources::StandardsSource;

const DATA_SENTINEL: &str = "data";

fn is_project_root(candidate: &Path) -> bool {
    candidate.join(DATA_SENTINEL).is_dir()
}

fn root_from_hint(hint: &str) -> Option<PathBuf> {
    if hint.is_empty() {
        return None;
    }
    let hint_path = PathBuf::from(hint);
    if !is_project_root(&hint_path) {
        return None;
    }
    fs::canonicalize(hint_path).ok()
}

fn search_upwards(start: &Path) -> Option<PathBuf> {
    let mut dir = fs::canonicalize(start).ok()?;
    loop {
        if is_project_root(&dir) {
            return Some(dir);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Locate the project root, the directory holding `data/`.
///
/// Honors `hint` when it points at such a directory, then climbs up from the
/// working directory, then tries the path recorded at build time. Falls back
/// to the working directory so a missing `data/` only means empty sources.
pub fn find_project_root(hint: Option<&str>) -> PathBuf {
    if let Some(root) = hint.and_then(root_from_hint) {
        return root;
    }

    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if let Some(root) = search_upwards(&cwd) {
        return root;
    }

    if let Some(root) = option_env!("DEVSTANDARDS_ROOT_HINT").and_then(root_from_hint) {
        return root;
    }

    cwd
}

/// Split comma- or whitespace-delimited configuration lists into tokens.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .replace(',', " ")
        .split_whitespace()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn split_list_accepts_commas_and_whitespace() {
        assert_eq!(split_list("drupal, owasp  wcag,,"), vec!["drupal", "owasp", "wcag"]);
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn hint_with_data_dir_is_canonicalized() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("data")).unwrap();
        let hint = dir.path().to_str().unwrap();
        assert_eq!(
            find_project_root(Some(hint)),
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn hint_without_data_dir_is_ignored() {
        let dir = TempDir::new().unwrap();
        let hint = dir.path().to_str().unwrap();
        assert_ne!(find_project_root(Some(hint)), dir.path().canonicalize().unwrap());
    }
}
