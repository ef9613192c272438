//! Composition root for the sources shipped with the crate.
//!
//! Sources are selected by name from `Config::plugins_enabled`. Known names
//! carry their own descriptor; any other name gets a generic CSV source under
//! the data directory so new corpora can be dropped in without code changes.

use crate::catalog::CategoryInfo;
use crate::config::Config;
use crate::sources::{CsvSourceDescriptor, CsvStandardsSource, StandardsSource};
use std::path::Path;

/// Descriptor for the bundled Drupal standards.
pub fn drupal_descriptor() -> CsvSourceDescriptor {
    CsvSourceDescriptor {
        name: "drupal".to_string(),
        version: "1.0.0".to_string(),
        description: "Drupal security, coding standards, and best practices".to_string(),
        categories: vec![
            CategoryInfo::new("drupal_security", "Security best practices for Drupal"),
            CategoryInfo::new(
                "drupal_coding_standards",
                "Drupal coding conventions and formatting",
            ),
            CategoryInfo::new(
                "drupal_best_practices",
                "Drupal development best practices",
            ),
            CategoryInfo::new("drupal_performance", "Performance optimization guidelines"),
        ],
    }
}

fn generic_descriptor(name: &str) -> CsvSourceDescriptor {
    CsvSourceDescriptor {
        name: name.to_string(),
        version: "1.0.0".to_string(),
        description: format!("{name} standards loaded from CSV"),
        categories: Vec::new(),
    }
}

fn source_for(name: &str, data_dir: &Path) -> Box<dyn StandardsSource> {
    let descriptor = match name {
        "drupal" => drupal_descriptor(),
        other => generic_descriptor(other),
    };
    Box::new(CsvStandardsSource::in_data_dir(descriptor, data_dir))
}

/// Build the source list for `config`, in the order plugins were enabled.
/// Repeated names are kept once.
pub fn builtin_sources(config: &Config) -> Vec<Box<dyn StandardsSource>> {
    let mut seen = Vec::new();
    let mut sources = Vec::new();
    for name in &config.plugins_enabled {
        if seen.contains(name) {
            continue;
        }
        seen.push(name.clone());
        sources.push(source_for(name, &config.data_dir));
    }
    sources
}
