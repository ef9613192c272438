//! Coordinates registered sources with the catalog.
//!
//! `refresh_all` loads every source outside the catalog lock, drops records
//! that fail validation, and synchronizes each successful batch under the
//! source's name. A source that fails keeps its previous contribution and is
//! listed in the returned report.
//!
//! `search` reads the sources directly instead of the catalog, so it works
//! before any refresh. It keeps source order and does not re-sort; catalog
//! queries sort by severity. Callers that need the catalog ordering should use
//! `StandardsCatalog::query`.

use crate::catalog::{
    CategoryOverview, Origin, SourceInfo, Standard, StandardsCatalog, SyncSummary, partition_valid,
};
use crate::errors::{RegistryError, SourceError};
use crate::sources::StandardsSource;
use std::collections::BTreeMap;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_SEARCH_LIMIT: usize = 50;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Cross-source search parameters.
pub struct SearchRequest {
    /// Case-insensitive substring; empty matches everything.
    pub query: String,
    /// When non-empty, a record's category must be one of these.
    pub categories: Vec<String>,
    /// When non-empty, a record must carry at least one of these tags.
    pub tags: Vec<String>,
    pub limit: usize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            categories: Vec::new(),
            tags: Vec::new(),
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    fn matches(&self, standard: &Standard, query_lower: &str) -> bool {
        if !self.categories.is_empty() && !self.categories.contains(&standard.category) {
            return false;
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|tag| standard.has_tag(tag)) {
            return false;
        }
        if query_lower.is_empty() {
            return true;
        }
        let searchable = [
            standard.title.as_str(),
            standard.description.as_str(),
            standard.rationale.as_deref().unwrap_or(""),
            standard.fix_guidance.as_deref().unwrap_or(""),
            &standard.tags.join(" "),
        ]
        .join(" ")
        .to_lowercase();
        searchable.contains(query_lower)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Outcome of one source during a refresh.
pub struct SourceSync {
    pub origin: Origin,
    /// Records the source returned.
    pub loaded: usize,
    /// Records dropped by validation before synchronizing.
    pub rejected: usize,
    pub summary: SyncSummary,
    pub elapsed: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// A source whose load failed; its previous catalog contribution is untouched.
pub struct SourceFailure {
    pub origin: Origin,
    pub error: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Per-source results of `refresh_all`, in registration order.
pub struct RefreshReport {
    pub synced: Vec<SourceSync>,
    pub failures: Vec<SourceFailure>,
}

impl RefreshReport {
    /// True when every source synchronized.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owns the registered sources.
#[derive(Default)]
pub struct StandardsAggregator {
    sources: Vec<Box<dyn StandardsSource>>,
}

impl StandardsAggregator {
    /// Aggregator over `sources`; names must be unique and non-empty.
    pub fn new(sources: Vec<Box<dyn StandardsSource>>) -> Result<Self, RegistryError> {
        let mut aggregator = Self::default();
        for source in sources {
            aggregator.register(source)?;
        }
        Ok(aggregator)
    }

    pub fn register(&mut self, source: Box<dyn StandardsSource>) -> Result<(), RegistryError> {
        let name = source.name();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.sources.iter().any(|existing| existing.name() == name) {
            return Err(RegistryError::DuplicateSource(name.to_string()));
        }
        self.sources.push(source);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Load every source and synchronize the successful batches.
    ///
    /// Loads run concurrently, one scoped thread per source, and never under
    /// the catalog lock. Synchronization happens afterwards in registration
    /// order. A source that errors or panics is skipped and reported.
    pub fn refresh_all(&self, catalog: &StandardsCatalog) -> RefreshReport {
        let loads = self.load_all_sources();
        let mut report = RefreshReport::default();

        for (source, (result, elapsed)) in self.sources.iter().zip(loads) {
            let origin = Origin(source.name().to_string());
            match result {
                Ok(records) => {
                    let loaded = records.len();
                    let (valid, rejected) = partition_valid(records);
                    for (standard, errors) in &rejected {
                        let details = errors
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join("; ");
                        warn!(
                            origin = %origin,
                            id = %standard.id,
                            %details,
                            "dropping invalid standard"
                        );
                    }
                    let summary = catalog.synchronize(&origin, valid);
                    debug!(
                        origin = %origin,
                        loaded,
                        rejected = rejected.len(),
                        load_ms = elapsed.as_millis() as u64,
                        "source refreshed"
                    );
                    report.synced.push(SourceSync {
                        origin,
                        loaded,
                        rejected: rejected.len(),
                        summary,
                        elapsed,
                    });
                }
                Err(err) => {
                    warn!(origin = %origin, error = %err, "source refresh failed; keeping previous records");
                    report.failures.push(SourceFailure {
                        origin,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            synced = report.synced.len(),
            failed = report.failures.len(),
            records = catalog.len(),
            "catalog refresh finished"
        );
        report
    }

    /// Search the sources' current records directly.
    ///
    /// Results follow source registration order, then each source's own
    /// order, truncated at `request.limit`. Sources that fail to load are
    /// skipped.
    pub fn search(&self, request: &SearchRequest) -> Vec<Standard> {
        let query_lower = request.query.to_lowercase();
        let mut results = Vec::new();
        if request.limit == 0 {
            return results;
        }

        for source in &self.sources {
            let records = match source.load_standards() {
                Ok(records) => records,
                Err(err) => {
                    warn!(source = %source.name(), error = %err, "skipping source in search");
                    continue;
                }
            };
            for standard in records {
                if request.matches(&standard, &query_lower) {
                    results.push(standard);
                    if results.len() >= request.limit {
                        return results;
                    }
                }
            }
        }
        results
    }

    /// Name, version and description of every registered source.
    pub fn source_info(&self) -> Vec<SourceInfo> {
        self.sources.iter().map(|source| source.info()).collect()
    }

    /// Categories declared by the sources, merged by name, with catalog counts.
    ///
    /// The first source to declare a category supplies its description.
    /// Categories present in the catalog but declared by no source are not
    /// listed.
    pub fn categories(&self, catalog: &StandardsCatalog) -> Vec<CategoryOverview> {
        let mut merged: Vec<CategoryOverview> = Vec::new();
        let mut positions: BTreeMap<String, usize> = BTreeMap::new();

        for source in &self.sources {
            for category in source.categories() {
                match positions.get(&category.name) {
                    Some(&idx) => merged[idx].sources.push(source.name().to_string()),
                    None => {
                        positions.insert(category.name.clone(), merged.len());
                        merged.push(CategoryOverview {
                            name: category.name,
                            description: category.description,
                            sources: vec![source.name().to_string()],
                            count: 0,
                        });
                    }
                }
            }
        }

        let counts = catalog.category_counts();
        for overview in &mut merged {
            overview.count = counts.get(&overview.name).copied().unwrap_or(0);
        }
        merged
    }

    fn load_all_sources(&self) -> Vec<(Result<Vec<Standard>, SourceError>, Duration)> {
        thread::scope(|scope| {
            let handles: Vec<_> = self
                .sources
                .iter()
                .map(|source| {
                    scope.spawn(move || {
                        let start = Instant::now();
                        let result = source.load_standards();
                        (result, start.elapsed())
                    })
                })
                .collect();

            handles
                .into_iter()
                .zip(&self.sources)
                .map(|(handle, source)| match handle.join() {
                    Ok(outcome) => outcome,
                    Err(_) => (
                        Err(SourceError::Unavailable {
                            source_name: source.name().to_string(),
                            reason: "source load panicked".into(),
                        }),
                        Duration::ZERO,
                    ),
                })
                .collect()
        })
    }
}
