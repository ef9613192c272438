//! Filter, search, sort, and pagination over catalog records.
//!
//! Filters compose conjunctively; an unset or empty field imposes nothing.
//! Ordering is always applied so identical catalog state yields identical
//! pages: severity rank, then category, then id.

use crate::catalog::identity::{Origin, Severity};
use crate::catalog::model::Standard;
use std::cmp::Ordering;

pub const DEFAULT_QUERY_LIMIT: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Parameters for [`StandardsCatalog::query`](crate::catalog::StandardsCatalog::query).
pub struct QuerySpec {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub severity: Option<Severity>,
    pub origin: Option<Origin>,
    /// Case-insensitive substring over title, description, rationale and
    /// fix guidance.
    pub search: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            category: None,
            subcategory: None,
            severity: None,
            origin: None,
            search: None,
            limit: DEFAULT_QUERY_LIMIT,
            offset: 0,
        }
    }
}

impl QuerySpec {
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(Origin(origin.into()));
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Whether `standard`, owned by `owner`, passes every populated filter.
    pub(crate) fn matches(&self, standard: &Standard, owner: Option<&Origin>) -> bool {
        if let Some(category) = non_empty(&self.category) {
            if standard.category != category {
                return false;
            }
        }
        if let Some(subcategory) = non_empty(&self.subcategory) {
            if standard.subcategory.as_deref() != Some(subcategory) {
                return false;
            }
        }
        if let Some(severity) = &self.severity {
            if &standard.severity != severity {
                return false;
            }
        }
        if let Some(origin) = &self.origin {
            if !origin.0.is_empty() && owner != Some(origin) {
                return false;
            }
        }
        if let Some(text) = non_empty(&self.search) {
            if !matches_search(standard, &text.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Substring match of an already-lowercased needle against any of the four
/// descriptive fields; missing fields count as empty.
pub fn matches_search(standard: &Standard, needle_lower: &str) -> bool {
    [
        standard.title.as_str(),
        standard.description.as_str(),
        standard.rationale.as_deref().unwrap_or(""),
        standard.fix_guidance.as_deref().unwrap_or(""),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle_lower))
}

/// Catalog ordering: severity rank, category, id.
pub fn catalog_order(a: &Standard, b: &Standard) -> Ordering {
    a.severity
        .rank()
        .cmp(&b.severity.rank())
        .then_with(|| a.category.cmp(&b.category))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort then page. Pagination never runs before the sort.
pub(crate) fn sort_and_page(mut results: Vec<Standard>, offset: usize, limit: usize) -> Vec<Standard> {
    results.sort_by(catalog_order);
    results.into_iter().skip(offset).take(limit).collect()
}
