use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_OPERATOR_COLOR: &str = "#007bff";

/// Stable identifier used to pick the source adapter for an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperatorCode {
    Mts,
    Megafon,
    Beeline,
    T2,
}

impl OperatorCode {
    pub const ALL: [OperatorCode; 4] = [
        OperatorCode::Mts,
        OperatorCode::Megafon,
        OperatorCode::Beeline,
        OperatorCode::T2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorCode::Mts => "mts",
            OperatorCode::Megafon => "megafon",
            OperatorCode::Beeline => "beeline",
            OperatorCode::T2 => "t2",
        }
    }
}

impl fmt::Display for OperatorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatorCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperatorCode::ALL
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownOperatorCode(s.to_string()))
    }
}

/// Mobile carrier whose tariffs are ingested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    pub id: i64,
    pub code: OperatorCode,
    pub name: String,
    pub website: String,
    pub color: String,
    pub last_ingested_at: Option<i64>,
}

impl Operator {
    /// Case-insensitive substring match against the display name or the code.
    pub fn matches_filter(&self, filter: &str) -> bool {
        let needle = filter.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle) || self.code.as_str().contains(&needle)
    }

    /// Whether the last successful ingestion is younger than `max_age_secs`.
    pub fn is_fresh(&self, now: i64, max_age_secs: i64) -> bool {
        self.last_ingested_at
            .map(|at| now - at < max_age_secs)
            .unwrap_or(false)
    }
}

pub fn validate_color(color: &str) -> Result<(), ValidationError> {
    let hex = color.strip_prefix('#').unwrap_or("");
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidColor(color.to_string()))
    }
}
