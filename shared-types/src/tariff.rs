use crate::{Allowance, ValidationError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const MAX_PLAN_NAME_LEN: usize = 200;

/// Tariff as emitted by a source adapter, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTariffRecord {
    pub name: String,
    pub description: String,
    pub monthly_fee: Decimal,
    pub data_volume: Allowance<f64>,
    pub minutes_volume: Allowance<u32>,

    // Operators often omit overage pricing; missing values count as 0
    pub overage_data_price: Option<Decimal>,
    pub overage_minute_price: Option<Decimal>,

    pub is_archived: bool,
}

impl RawTariffRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            monthly_fee: Decimal::ZERO,
            data_volume: Allowance::default(),
            minutes_volume: Allowance::default(),
            overage_data_price: None,
            overage_minute_price: None,
            is_archived: false,
        }
    }

    pub fn validate(&self) -> Result<ValidatedTariff, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if name.chars().count() > MAX_PLAN_NAME_LEN {
            return Err(ValidationError::NameTooLong {
                max: MAX_PLAN_NAME_LEN,
            });
        }

        let monthly_fee = non_negative("monthly_fee", self.monthly_fee)?;
        let overage_data_price = non_negative(
            "overage_data_price",
            self.overage_data_price.unwrap_or(Decimal::ZERO),
        )?;
        let overage_minute_price = non_negative(
            "overage_minute_price",
            self.overage_minute_price.unwrap_or(Decimal::ZERO),
        )?;

        if let Allowance::Bounded(gb) = self.data_volume {
            if !gb.is_finite() || gb < 0.0 {
                return Err(ValidationError::InvalidVolume {
                    field: "data_volume",
                });
            }
        }

        Ok(ValidatedTariff {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            monthly_fee,
            data_volume: self.data_volume,
            minutes_volume: self.minutes_volume,
            overage_data_price,
            overage_minute_price,
            is_archived: self.is_archived,
        })
    }
}

fn non_negative(field: &'static str, amount: Decimal) -> Result<Decimal, ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ValidationError::NegativeAmount { field });
    }
    Ok(amount.round_dp(2))
}

/// Record that passed validation and is ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTariff {
    pub name: String,
    pub description: String,
    pub monthly_fee: Decimal,
    pub data_volume: Allowance<f64>,
    pub minutes_volume: Allowance<u32>,
    pub overage_data_price: Decimal,
    pub overage_minute_price: Decimal,
    pub is_archived: bool,
}

/// Canonical tariff plan; `(operator_id, name)` is unique
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffPlan {
    pub id: i64,
    pub operator_id: i64,
    pub operator_name: String,
    pub name: String,
    pub description: String,
    pub monthly_fee: Decimal,
    pub data_volume: Allowance<f64>,
    pub minutes_volume: Allowance<u32>,
    pub overage_data_price: Decimal,
    pub overage_minute_price: Decimal,
    pub is_archived: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_validate_defaults_overage_to_zero() {
        let mut raw = RawTariffRecord::new("  Мой онлайн ");
        raw.monthly_fee = Decimal::from_str("350.499").unwrap();

        let tariff = raw.validate().unwrap();
        assert_eq!(tariff.name, "Мой онлайн");
        assert_eq!(tariff.monthly_fee, Decimal::from_str("350.50").unwrap());
        assert_eq!(tariff.overage_data_price, Decimal::ZERO);
        assert_eq!(tariff.overage_minute_price, Decimal::ZERO);
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        assert_eq!(
            RawTariffRecord::new("   ").validate(),
            Err(ValidationError::EmptyName)
        );
    }

    #[test]
    fn test_validate_rejects_long_name() {
        let raw = RawTariffRecord::new("я".repeat(MAX_PLAN_NAME_LEN + 1));
        assert!(matches!(
            raw.validate(),
            Err(ValidationError::NameTooLong { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_negative_money() {
        let mut raw = RawTariffRecord::new("Тариф");
        raw.monthly_fee = Decimal::from(-1);
        assert_eq!(
            raw.validate(),
            Err(ValidationError::NegativeAmount {
                field: "monthly_fee"
            })
        );

        let mut raw = RawTariffRecord::new("Тариф");
        raw.overage_minute_price = Some(Decimal::from(-3));
        assert_eq!(
            raw.validate(),
            Err(ValidationError::NegativeAmount {
                field: "overage_minute_price"
            })
        );
    }

    #[test]
    fn test_validate_rejects_bad_volume() {
        let mut raw = RawTariffRecord::new("Тариф");
        raw.data_volume = Allowance::Bounded(f64::NAN);
        assert!(raw.validate().is_err());

        raw.data_volume = Allowance::Bounded(-5.0);
        assert!(raw.validate().is_err());

        raw.data_volume = Allowance::Unlimited;
        assert!(raw.validate().is_ok());
    }
}
