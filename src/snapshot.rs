//! Optional durable mirror of catalog contents.
//!
//! A `SnapshotStore` receives the same `(origin, records)` pair as every
//! catalog synchronize and can hand the batches back for a cold start. It is
//! never consulted by queries. `JsonSnapshotStore` keeps one JSON document
//! per origin and checks each document against the bundled schema before
//! trusting it.

use crate::catalog::{Origin, Standard};
use crate::errors::PersistenceError;
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

pub const SNAPSHOT_SCHEMA_VERSION: &str = "standards_snapshot_v1";

const SNAPSHOT_SCHEMA: &str = include_str!("../schema/standards_snapshot.schema.json");

/// One origin's stored batch.
#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotBatch {
    pub origin: Origin,
    pub records: Vec<Standard>,
}

/// Side channel that mirrors synchronized batches.
pub trait SnapshotStore: Send + Sync {
    /// Record `records` as `origin`'s current batch, replacing any prior one.
    fn persist(&self, origin: &Origin, records: &[Standard]) -> Result<(), PersistenceError>;

    /// Every readable stored batch, in stable origin order.
    ///
    /// A document that cannot be read or fails validation is logged and
    /// skipped so one bad origin never hides the others.
    fn load_all(&self) -> Result<Vec<SnapshotBatch>, PersistenceError>;
}

#[derive(Serialize)]
struct SnapshotDocumentRef<'a> {
    schema_version: &'a str,
    origin: &'a Origin,
    records: &'a [Standard],
}

#[derive(Deserialize)]
struct SnapshotDocument {
    origin: Origin,
    records: Vec<Standard>,
}

/// `SnapshotStore` writing `<dir>/<origin>.json`.
pub struct JsonSnapshotStore {
    dir: PathBuf,
    schema: JSONSchema,
}

impl JsonSnapshotStore {
    /// Open (creating if needed) a snapshot directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            schema: compile_snapshot_schema()?,
        })
    }

    fn path_for(&self, origin: &Origin) -> PathBuf {
        self.dir.join(format!("{}.json", origin.0))
    }

    fn check_document(&self, path: &Path, value: &Value) -> Result<(), PersistenceError> {
        if let Err(errors) = self.schema.validate(value) {
            let details = errors
                .map(|err| err.to_string())
                .collect::<Vec<_>>()
                .join("\n");
            return Err(PersistenceError::Invalid {
                path: path.to_path_buf(),
                reason: details,
            });
        }
        Ok(())
    }

    fn read_document(&self, path: &Path) -> Result<SnapshotBatch, PersistenceError> {
        let data = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&data).map_err(|err| PersistenceError::Invalid {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        self.check_document(path, &value)?;

        let document: SnapshotDocument = serde_json::from_value(value)?;
        Ok(SnapshotBatch {
            origin: document.origin,
            records: document.records,
        })
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn persist(&self, origin: &Origin, records: &[Standard]) -> Result<(), PersistenceError> {
        validate_origin_name(origin)?;

        let document = serde_json::to_value(SnapshotDocumentRef {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            origin,
            records,
        })?;
        let path = self.path_for(origin);
        // Never write a document load_all would refuse.
        self.check_document(&path, &document)?;

        let tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, &document)?;
            writer.flush()?;
        }
        // Rename within the same directory so readers never see a partial file.
        tmp.persist(path)
            .map_err(|err| PersistenceError::Io(err.error))?;
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<SnapshotBatch>, PersistenceError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut batches = Vec::with_capacity(paths.len());
        for path in &paths {
            match self.read_document(path) {
                Ok(batch) => batches.push(batch),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable snapshot")
                }
            }
        }
        Ok(batches)
    }
}

fn compile_snapshot_schema() -> Result<JSONSchema, PersistenceError> {
    let schema: Value = serde_json::from_str(SNAPSHOT_SCHEMA)?;
    JSONSchema::compile(&schema).map_err(|err| PersistenceError::Invalid {
        path: PathBuf::from("schema/standards_snapshot.schema.json"),
        reason: err.to_string(),
    })
}

fn validate_origin_name(origin: &Origin) -> Result<(), PersistenceError> {
    if origin.0.is_empty()
        || !origin
            .0
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(PersistenceError::Write {
            origin: origin.clone(),
            reason: "origin must match ^[A-Za-z0-9_.-]+$".to_string(),
        });
    }
    Ok(())
}
