//! Typed records held by the catalog and the descriptors sources publish.
//!
//! `Standard` mirrors the fields sources load from disk. The serde derives
//! back the snapshot store and the CLI envelopes; the catalog itself only
//! works on the typed record.

use crate::catalog::identity::{Severity, StandardId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// One coding or security guidance entry.
pub struct Standard {
    pub id: StandardId,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub severity: Severity,
    /// Sample snippets keyed by kind, usually `good` and `bad`.
    #[serde(default)]
    pub examples: BTreeMap<String, String>,
    #[serde(default)]
    pub references: Vec<String>,
    /// Insertion order is kept for display; matching treats tags as a set.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rationale: Option<String>,
    #[serde(default)]
    pub fix_guidance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Standard {
    /// Minimal record with the required fields set and everything else empty.
    pub fn new(
        id: impl Into<String>,
        category: impl Into<String>,
        title: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            id: StandardId(id.into()),
            category: category.into(),
            subcategory: None,
            title: title.into(),
            description: String::new(),
            severity,
            examples: BTreeMap::new(),
            references: Vec::new(),
            tags: Vec::new(),
            rationale: None,
            fix_guidance: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|existing| existing == tag)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// Category declared by a source, with its human description.
pub struct CategoryInfo {
    pub name: String,
    pub description: String,
}

impl CategoryInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
/// Identity of a registered source.
pub struct SourceInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
/// A category merged across every source that declares it, with the number
/// of catalog records currently filed under it.
pub struct CategoryOverview {
    pub name: String,
    pub description: String,
    pub sources: Vec<String>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn standard_deserializes_with_optional_fields_missing() {
        let value = json!({
            "id": "owasp_a01",
            "category": "owasp_top10",
            "title": "Broken Access Control",
            "severity": "critical"
        });
        let standard: Standard = serde_json::from_value(value).unwrap();
        assert_eq!(standard.id, StandardId::from("owasp_a01"));
        assert_eq!(standard.severity, Severity::Critical);
        assert!(standard.subcategory.is_none());
        assert!(standard.tags.is_empty());
        assert!(standard.description.is_empty());
    }

    #[test]
    fn timestamps_are_omitted_when_absent() {
        let standard = Standard::new("a", "cat", "Title", Severity::Low);
        let value = serde_json::to_value(&standard).unwrap();
        assert!(value.get("created_at").is_none());
        assert_eq!(value.get("severity").and_then(|v| v.as_str()), Some("low"));
    }

    #[test]
    fn has_tag_matches_exactly() {
        let mut standard = Standard::new("a", "cat", "Title", Severity::Low);
        standard.tags = vec!["sql".into(), "database".into()];
        assert!(standard.has_tag("sql"));
        assert!(!standard.has_tag("SQL"));
    }
}
