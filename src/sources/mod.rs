//! Source interface and the built-in sources.
//!
//! Ownership model:
//! - `StandardsSource` is what the aggregator consumes: an origin name,
//!   descriptive metadata, and a record batch on demand.
//! - Concrete sources are registered explicitly by the composition root
//!   (`builtin_sources`); nothing is discovered by scanning directories.

use crate::catalog::{CategoryInfo, SourceInfo, Standard};
use crate::errors::SourceError;

pub mod csv_source;
pub mod registry;

pub use csv_source::{CsvSourceDescriptor, CsvStandardsSource};
pub use registry::{builtin_sources, drupal_descriptor};

/// Producer of a batch of standards under one stable origin name.
///
/// `load_standards` may be slow (disk, network) and is never called while the
/// catalog lock is held. It should be idempotent and may cache; "no data
/// present" is an empty batch, not an error.
pub trait StandardsSource: Send + Sync {
    /// Stable unique identifier, used as the catalog origin.
    fn name(&self) -> &str;
    fn version(&self) -> &str;
    fn description(&self) -> &str;
    /// Current record batch.
    fn load_standards(&self) -> Result<Vec<Standard>, SourceError>;
    /// Categories this source files records under, with descriptions.
    fn categories(&self) -> Vec<CategoryInfo>;

    fn info(&self) -> SourceInfo {
        SourceInfo {
            name: self.name().to_string(),
            version: self.version().to_string(),
            description: self.description().to_string(),
        }
    }
}
