use serde::{Deserialize, Serialize};
use std::fmt;

/// Legacy numeric marker operators and older exports use for "unlimited".
pub const UNLIMITED_SENTINEL: u32 = 999_999;

/// Volume included in a tariff plan (GB of data or minutes of calls)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "amount")]
pub enum Allowance<T> {
    Unlimited,
    Bounded(T),
}

impl<T> Allowance<T> {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Allowance::Unlimited)
    }

    pub fn bounded(&self) -> Option<&T> {
        match self {
            Allowance::Unlimited => None,
            Allowance::Bounded(value) => Some(value),
        }
    }
}

impl<T: Default> Default for Allowance<T> {
    fn default() -> Self {
        Allowance::Bounded(T::default())
    }
}

impl Allowance<f64> {
    /// Usage above the included volume; always zero for unlimited plans.
    pub fn excess(&self, usage: f64) -> f64 {
        match self {
            Allowance::Unlimited => 0.0,
            Allowance::Bounded(limit) => (usage - limit).max(0.0),
        }
    }

    pub fn legacy_value(&self) -> f64 {
        match self {
            Allowance::Unlimited => UNLIMITED_SENTINEL as f64,
            Allowance::Bounded(value) => *value,
        }
    }

    pub fn from_legacy_value(value: f64) -> Self {
        if value >= UNLIMITED_SENTINEL as f64 {
            Allowance::Unlimited
        } else {
            Allowance::Bounded(value)
        }
    }
}

impl Allowance<u32> {
    pub fn excess(&self, usage: u32) -> u32 {
        match self {
            Allowance::Unlimited => 0,
            Allowance::Bounded(limit) => usage.saturating_sub(*limit),
        }
    }

    pub fn legacy_value(&self) -> u32 {
        match self {
            Allowance::Unlimited => UNLIMITED_SENTINEL,
            Allowance::Bounded(value) => *value,
        }
    }

    pub fn from_legacy_value(value: u32) -> Self {
        if value >= UNLIMITED_SENTINEL {
            Allowance::Unlimited
        } else {
            Allowance::Bounded(value)
        }
    }
}

impl<T: fmt::Display> fmt::Display for Allowance<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Allowance::Unlimited => write!(f, "unlimited"),
            Allowance::Bounded(value) => write!(f, "{}", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excess_bounded() {
        let data = Allowance::Bounded(10.0);
        assert_eq!(data.excess(12.0), 2.0);
        assert_eq!(data.excess(4.0), 0.0);

        let minutes = Allowance::Bounded(300u32);
        assert_eq!(minutes.excess(450), 150);
        assert_eq!(minutes.excess(100), 0);
    }

    #[test]
    fn test_excess_unlimited() {
        assert_eq!(Allowance::<f64>::Unlimited.excess(1_000_000.0), 0.0);
        assert_eq!(Allowance::<u32>::Unlimited.excess(u32::MAX), 0);
    }

    #[test]
    fn test_legacy_sentinel() {
        assert_eq!(Allowance::<f64>::Unlimited.legacy_value(), 999_999.0);
        assert_eq!(Allowance::<u32>::from_legacy_value(999_999), Allowance::Unlimited);
        assert_eq!(Allowance::<u32>::from_legacy_value(500), Allowance::Bounded(500));
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&Allowance::Bounded(15.0)).unwrap();
        assert_eq!(json, r#"{"kind":"bounded","amount":15.0}"#);

        let unlimited: Allowance<u32> = serde_json::from_str(r#"{"kind":"unlimited"}"#).unwrap();
        assert!(unlimited.is_unlimited());
    }
}
