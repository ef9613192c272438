use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::{Origin, StandardId};

/// A single reason a candidate record was refused at ingestion.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("standard id is required")]
    MissingId,
    #[error("standard '{0}' has no title")]
    MissingTitle(StandardId),
    #[error("standard '{id}' has invalid severity '{severity}'")]
    InvalidSeverity { id: StandardId, severity: String },
}

/// Errors surfaced by catalog lookups.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("standard '{0}' not found")]
    NotFound(StandardId),
}

/// Failure of a source to produce its record batch.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source '{source_name}' is unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },
    #[error("source '{source_name}' could not read {}: {reason}", .path.display())]
    Unreadable {
        source_name: String,
        path: PathBuf,
        reason: String,
    },
}

/// Failures of the optional snapshot mirror.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("snapshot for origin '{origin}' could not be written: {reason}")]
    Write { origin: Origin, reason: String },
    #[error("snapshot {} is invalid: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Problems assembling the set of sources.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("source '{0}' is registered more than once")]
    DuplicateSource(String),
    #[error("source names must not be empty")]
    EmptyName,
}
