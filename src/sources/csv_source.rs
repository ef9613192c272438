//! CSV-backed standards source.
//!
//! Reads `<name>_standards.csv` with one standard per row. `examples` and
//! `references` hold JSON (object and array), `tags` is pipe-separated. Rows
//! that fail to parse or validate are skipped with a warning; the rest of the
//! file still loads. A missing file is an empty batch.

use crate::catalog::{CategoryInfo, Severity, Standard, StandardId, validate_standard};
use crate::errors::SourceError;
use crate::sources::StandardsSource;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

#[derive(Clone, Debug)]
/// Name, version and categories a CSV source reports about itself.
pub struct CsvSourceDescriptor {
    pub name: String,
    pub version: String,
    pub description: String,
    pub categories: Vec<CategoryInfo>,
}

/// `StandardsSource` reading a single CSV file, cached after the first read.
pub struct CsvStandardsSource {
    descriptor: CsvSourceDescriptor,
    path: PathBuf,
    cache: Mutex<Option<Vec<Standard>>>,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    id: String,
    category: String,
    #[serde(default)]
    subcategory: Option<String>,
    title: String,
    #[serde(default)]
    description: String,
    severity: String,
    #[serde(default)]
    examples: Option<String>,
    #[serde(default)]
    references: Option<String>,
    #[serde(default)]
    tags: Option<String>,
    #[serde(default)]
    rationale: Option<String>,
    #[serde(default)]
    fix_guidance: Option<String>,
}

impl CsvStandardsSource {
    pub fn new(descriptor: CsvSourceDescriptor, path: impl Into<PathBuf>) -> Self {
        Self {
            descriptor,
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    /// Source reading `<data_dir>/<name>/<name>_standards.csv`.
    pub fn in_data_dir(descriptor: CsvSourceDescriptor, data_dir: &Path) -> Self {
        let path = data_dir
            .join(&descriptor.name)
            .join(format!("{}_standards.csv", descriptor.name));
        Self::new(descriptor, path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Result<Vec<Standard>, SourceError> {
        let unreadable = |reason: String| SourceError::Unreadable {
            source_name: self.descriptor.name.clone(),
            path: self.path.clone(),
            reason,
        };

        let mut reader =
            csv::Reader::from_path(&self.path).map_err(|err| unreadable(err.to_string()))?;
        reader.headers().map_err(|err| unreadable(err.to_string()))?;

        let mut standards = Vec::new();
        for (idx, row) in reader.deserialize::<CsvRow>().enumerate() {
            let line = idx + 2;
            let standard = match row
                .with_context(|| format!("reading row {line}"))
                .and_then(standard_from_row)
            {
                Ok(standard) => standard,
                Err(err) => {
                    let error = format!("{err:#}");
                    warn!(
                        source = %self.descriptor.name,
                        line,
                        %error,
                        "skipping malformed standard"
                    );
                    continue;
                }
            };

            let errors = validate_standard(&standard);
            if !errors.is_empty() {
                let details = errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                warn!(
                    source = %self.descriptor.name,
                    id = %standard.id,
                    %details,
                    "skipping invalid standard"
                );
                continue;
            }
            standards.push(standard);
        }

        debug!(
            source = %self.descriptor.name,
            path = %self.path.display(),
            count = standards.len(),
            "loaded standards"
        );
        Ok(standards)
    }
}

impl StandardsSource for CsvStandardsSource {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn version(&self) -> &str {
        &self.descriptor.version
    }

    fn description(&self) -> &str {
        &self.descriptor.description
    }

    fn load_standards(&self) -> Result<Vec<Standard>, SourceError> {
        let mut cache = self.cache.lock().expect("csv source cache poisoned");
        if let Some(cached) = cache.as_ref() {
            return Ok(cached.clone());
        }
        // Not cached: the file may show up later.
        if !self.path.is_file() {
            return Ok(Vec::new());
        }
        let standards = self.read_file()?;
        *cache = Some(standards.clone());
        Ok(standards)
    }

    fn categories(&self) -> Vec<CategoryInfo> {
        self.descriptor.categories.clone()
    }
}

fn standard_from_row(row: CsvRow) -> Result<Standard> {
    let examples: BTreeMap<String, String> = match non_blank(row.examples.as_deref()) {
        Some(raw) => serde_json::from_str(raw)
            .with_context(|| format!("parsing examples for {}", row.id))?,
        None => BTreeMap::new(),
    };
    let references: Vec<String> = match non_blank(row.references.as_deref()) {
        Some(raw) => serde_json::from_str(raw)
            .with_context(|| format!("parsing references for {}", row.id))?,
        None => Vec::new(),
    };
    let tags = row
        .tags
        .as_deref()
        .map(split_tags)
        .unwrap_or_default();

    Ok(Standard {
        id: StandardId(row.id.trim().to_string()),
        category: row.category.trim().to_string(),
        subcategory: row.subcategory.filter(|s| !s.trim().is_empty()),
        title: row.title,
        description: row.description,
        severity: Severity::parse(row.severity.trim()),
        examples,
        references,
        tags,
        rationale: row.rationale,
        fix_guidance: row.fix_guidance,
        created_at: None,
        updated_at: None,
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
