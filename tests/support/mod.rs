#![allow(dead_code)]

use anyhow::{Context, Result, bail};
use devstandards::{CategoryInfo, Severity, SourceError, Standard, StandardsSource};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

pub const CSV_HEADER: &str =
    "id,category,subcategory,title,description,severity,examples,references,tags,rationale,fix_guidance\n";

/// Record with the required fields set.
pub fn standard(id: &str, category: &str, severity: Severity) -> Standard {
    Standard::new(id, category, format!("Title for {id}"), severity)
}

/// Source returning a fixed batch that tests can swap or break between refreshes.
pub struct StaticSource {
    name: String,
    records: Mutex<Vec<Standard>>,
    categories: Vec<CategoryInfo>,
    failing: AtomicBool,
}

impl StaticSource {
    pub fn new(name: &str, records: Vec<Standard>) -> Self {
        Self {
            name: name.to_string(),
            records: Mutex::new(records),
            categories: Vec::new(),
            failing: AtomicBool::new(false),
        }
    }

    pub fn with_categories(mut self, categories: Vec<CategoryInfo>) -> Self {
        self.categories = categories;
        self
    }

    pub fn replace(&self, records: Vec<Standard>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl StandardsSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn description(&self) -> &str {
        "in-memory fixture"
    }

    fn load_standards(&self) -> Result<Vec<Standard>, SourceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable {
                source_name: self.name.clone(),
                reason: "temporarily unavailable".into(),
            });
        }
        Ok(self.records.lock().unwrap().clone())
    }

    fn categories(&self) -> Vec<CategoryInfo> {
        self.categories.clone()
    }
}

/// Shares a `StaticSource` with the test while the aggregator owns a box.
pub struct SharedSource(pub std::sync::Arc<StaticSource>);

impl StandardsSource for SharedSource {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn version(&self) -> &str {
        self.0.version()
    }

    fn description(&self) -> &str {
        self.0.description()
    }

    fn load_standards(&self) -> Result<Vec<Standard>, SourceError> {
        self.0.load_standards()
    }

    fn categories(&self) -> Vec<CategoryInfo> {
        self.0.categories()
    }
}

/// Source whose load fails, or panics when `panics` is set.
pub struct FailingSource {
    pub name: String,
    pub panics: bool,
}

impl FailingSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            panics: false,
        }
    }

    pub fn panicking(name: &str) -> Self {
        Self {
            name: name.to_string(),
            panics: true,
        }
    }
}

impl StandardsSource for FailingSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        "0.0.0"
    }

    fn description(&self) -> &str {
        "always fails"
    }

    fn load_standards(&self) -> Result<Vec<Standard>, SourceError> {
        if self.panics {
            panic!("fixture source {} panicked", self.name);
        }
        Err(SourceError::Unavailable {
            source_name: self.name.clone(),
            reason: "backend offline".into(),
        })
    }

    fn categories(&self) -> Vec<CategoryInfo> {
        Vec::new()
    }
}

/// Write `<data_dir>/<name>/<name>_standards.csv` with the standard header.
pub fn write_source_csv(data_dir: &Path, name: &str, rows: &str) -> Result<PathBuf> {
    let dir = data_dir.join(name);
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(format!("{name}_standards.csv"));
    fs::write(&path, format!("{CSV_HEADER}{rows}"))
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

pub fn standards_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_standards"))
}

/// Run `cmd`, returning its output regardless of exit status.
pub fn run_command(mut cmd: Command) -> Result<Output> {
    cmd.output()
        .with_context(|| format!("failed to run command: {:?}", cmd))
}

/// Run `cmd` and fail unless it exits successfully.
pub fn run_command_ok(cmd: Command) -> Result<Output> {
    let output = run_command(cmd)?;
    if !output.status.success() {
        bail!(
            "command failed: status {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(output)
}
