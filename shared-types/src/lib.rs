pub mod allowance;
pub mod error;
pub mod operator;
pub mod tariff;
pub mod usage;

pub use allowance::{Allowance, UNLIMITED_SENTINEL};
pub use error::{ExtractionError, FetchError, ValidationError};
pub use operator::{validate_color, Operator, OperatorCode, DEFAULT_OPERATOR_COLOR};
pub use tariff::{RawTariffRecord, TariffPlan, ValidatedTariff, MAX_PLAN_NAME_LEN};
pub use usage::{ComparisonRecord, ConsumptionRecord, UsageExpectation, MIN_CONSUMPTION_YEAR};
