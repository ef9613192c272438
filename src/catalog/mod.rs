//! Standards catalog wiring.
//!
//! `StandardsCatalog` owns the authoritative record set and per-origin
//! ownership; every mutation goes through `synchronize` or `clear`. The query
//! engine in `query` is embedded in the catalog; `validation` holds the
//! ingestion checks sources and the aggregator apply before synchronizing.

pub mod identity;
pub mod model;
pub mod query;
pub mod store;
pub mod validation;

pub use identity::{KNOWN_SEVERITIES, Origin, Severity, StandardId};
pub use model::{CategoryInfo, CategoryOverview, SourceInfo, Standard};
pub use query::{DEFAULT_QUERY_LIMIT, QuerySpec, catalog_order, matches_search};
pub use store::{StandardsCatalog, SyncSummary};
pub use validation::{partition_valid, validate_standard};
