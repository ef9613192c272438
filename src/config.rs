//! Runtime configuration resolved from environment variables.
//!
//! Every setting has a default so a bare invocation inside a checkout works:
//! data under `<project root>/data`, the `drupal` source enabled, no snapshot
//! mirror, `info` logging in human-readable form.

use crate::{find_project_root, split_list};
use anyhow::{Result, bail};
use std::env;
use std::path::PathBuf;

pub const SERVER_NAME: &str = "devstandards";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_PLUGINS: &str = "drupal";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub project_root: PathBuf,
    /// Root under which each source keeps `<name>/<name>_standards.csv`.
    pub data_dir: PathBuf,
    /// Enables the JSON snapshot mirror when set.
    pub snapshot_dir: Option<PathBuf>,
    /// Source names to register, in order.
    pub plugins_enabled: Vec<String>,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Defaults anchored at an explicit data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            project_root: data_dir.parent().map(PathBuf::from).unwrap_or_default(),
            data_dir,
            snapshot_dir: None,
            plugins_enabled: split_list(DEFAULT_PLUGINS),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::Text,
        }
    }

    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup.
    ///
    /// `DEVSTANDARDS_PROJECT_ROOT`, `DATA_DIR`, `SNAPSHOT_DIR`,
    /// `PLUGINS_ENABLED`, `LOG_LEVEL`, `LOG_FORMAT`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let set = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let project_root = find_project_root(set("DEVSTANDARDS_PROJECT_ROOT").as_deref());
        let data_dir = set("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| project_root.join("data"));
        let snapshot_dir = set("SNAPSHOT_DIR").map(PathBuf::from);

        let plugins_enabled = split_list(
            set("PLUGINS_ENABLED")
                .as_deref()
                .unwrap_or(DEFAULT_PLUGINS),
        );
        if plugins_enabled.is_empty() {
            bail!("PLUGINS_ENABLED did not name any sources");
        }

        Ok(Self {
            project_root,
            data_dir,
            snapshot_dir,
            plugins_enabled,
            log_level: set("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_format: set("LOG_FORMAT")
                .map(|value| LogFormat::parse(&value))
                .unwrap_or(LogFormat::Text),
        })
    }
}
