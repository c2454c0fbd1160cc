use crate::ValidationError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const MIN_CONSUMPTION_YEAR: i32 = 2020;

/// Planned monthly usage of a subscriber
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageExpectation {
    pub data_gb: f64,
    pub minutes: u32,
}

impl Default for UsageExpectation {
    fn default() -> Self {
        Self {
            data_gb: 5.0,
            minutes: 200,
        }
    }
}

/// Actual usage for one month, entered by the subscriber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    pub id: i64,
    pub profile: String,
    pub year: i32,
    pub month: u32,
    pub actual_data_used: f64,
    pub actual_minutes_used: u32,
    pub recorded_at: i64,
}

impl ConsumptionRecord {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.profile.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.year < MIN_CONSUMPTION_YEAR {
            return Err(ValidationError::OutOfRange {
                field: "year",
                value: self.year as i64,
            });
        }
        if !(1..=12).contains(&self.month) {
            return Err(ValidationError::OutOfRange {
                field: "month",
                value: self.month as i64,
            });
        }
        if !self.actual_data_used.is_finite() || self.actual_data_used < 0.0 {
            return Err(ValidationError::InvalidVolume {
                field: "actual_data_used",
            });
        }
        Ok(())
    }
}

/// Outcome of one plan evaluated against a usage figure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub id: i64,
    pub profile: String,
    pub tariff_plan_id: i64,
    pub calculated_monthly_cost: Decimal,
    pub user_data_input: f64,
    pub user_minutes_input: u32,
    pub is_recommended: bool,
    pub compared_at: i64,
}
