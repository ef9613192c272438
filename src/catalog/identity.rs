use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Stable identifier for an individual standard (e.g., `drupal_sec_001`).
///
/// Unique across the whole catalog: two sources claiming the same id resolve
/// to whichever synchronized last.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StandardId(pub String);

/// Name of the source that contributed a batch of standards.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Origin(pub String);

impl StandardId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Origin {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StandardId {
    fn from(value: &str) -> Self {
        StandardId(value.to_string())
    }
}

impl From<&str> for Origin {
    fn from(value: &str) -> Self {
        Origin(value.to_string())
    }
}

impl fmt::Display for StandardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How urgently a standard should be addressed.
///
/// The five known levels drive sort priority. `Other` keeps whatever string a
/// source supplied so validation can report it; such records are rejected at
/// ingestion and rank after `Info` if they reach the catalog anyway.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
    Other(String),
}

/// Every severity accepted at ingestion, in rank order.
pub const KNOWN_SEVERITIES: [Severity; 5] = [
    Severity::Critical,
    Severity::High,
    Severity::Medium,
    Severity::Low,
    Severity::Info,
];

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
            Severity::Other(value) => value.as_str(),
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "medium" => Severity::Medium,
            "low" => Severity::Low,
            "info" => Severity::Info,
            other => Severity::Other(other.to_string()),
        }
    }

    /// Primary sort key: critical=0 through info=4, anything else 5.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
            Severity::Info => 4,
            Severity::Other(_) => 5,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Severity::Other(_))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}
