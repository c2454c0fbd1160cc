use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use shared_types::TariffPlan;

/// Monthly cost of `plan` for the given usage: fee plus overage beyond the
/// included volumes. Unlimited allowances never incur overage; negative usage
/// counts as zero. Rounded to kopecks.
pub fn calculate_cost(plan: &TariffPlan, data_gb: f64, minutes: i64) -> Decimal {
    let data_gb = if data_gb.is_finite() { data_gb.max(0.0) } else { 0.0 };
    let minutes = minutes.clamp(0, u32::MAX as i64) as u32;

    let excess_data = Decimal::from_f64(plan.data_volume.excess(data_gb)).unwrap_or(Decimal::ZERO);
    let excess_minutes = Decimal::from(plan.minutes_volume.excess(minutes));

    let data_charge = excess_data
        .checked_mul(plan.overage_data_price)
        .unwrap_or(Decimal::MAX);
    let minute_charge = excess_minutes
        .checked_mul(plan.overage_minute_price)
        .unwrap_or(Decimal::MAX);

    plan.monthly_fee
        .checked_add(data_charge)
        .and_then(|total| total.checked_add(minute_charge))
        .unwrap_or(Decimal::MAX)
        .round_dp(2)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanCost {
    pub plan: TariffPlan,
    pub total_cost: Decimal,
    pub is_recommended: bool,
}

/// Active plans ordered cheapest first; the first one is the recommendation.
pub fn rank_plans(plans: &[TariffPlan], data_gb: f64, minutes: i64) -> Vec<PlanCost> {
    let mut ranked: Vec<PlanCost> = plans
        .iter()
        .filter(|plan| !plan.is_archived)
        .map(|plan| PlanCost {
            total_cost: calculate_cost(plan, data_gb, minutes),
            plan: plan.clone(),
            is_recommended: false,
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.total_cost
            .cmp(&b.total_cost)
            .then_with(|| a.plan.operator_name.cmp(&b.plan.operator_name))
            .then_with(|| a.plan.name.cmp(&b.plan.name))
    });

    if let Some(best) = ranked.first_mut() {
        best.is_recommended = true;
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Allowance;
    use std::str::FromStr;

    fn plan(operator: &str, name: &str, fee: i64, data: Allowance<f64>, minutes: Allowance<u32>) -> TariffPlan {
        TariffPlan {
            id: 1,
            operator_id: 1,
            operator_name: operator.to_string(),
            name: name.to_string(),
            description: String::new(),
            monthly_fee: Decimal::from(fee),
            data_volume: data,
            minutes_volume: minutes,
            overage_data_price: Decimal::from(100),
            overage_minute_price: Decimal::from_str("2.5").unwrap(),
            is_archived: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_data_overage() {
        let p = plan("Т2", "Мой онлайн", 300, Allowance::Bounded(10.0), Allowance::Bounded(500));
        assert_eq!(calculate_cost(&p, 12.0, 0), Decimal::from(500));
    }

    #[test]
    fn test_usage_below_allowance_adds_nothing() {
        let p = plan("Т2", "Мой онлайн", 300, Allowance::Bounded(10.0), Allowance::Bounded(500));
        assert_eq!(calculate_cost(&p, 9.5, 499), Decimal::from(300));
    }

    #[test]
    fn test_minute_overage() {
        let p = plan("МТС", "Базовый", 200, Allowance::Bounded(10.0), Allowance::Bounded(100));
        assert_eq!(calculate_cost(&p, 0.0, 110), Decimal::from(225));
    }

    #[test]
    fn test_unlimited_never_overcharges() {
        let p = plan("Билайн", "UP", 800, Allowance::Unlimited, Allowance::Unlimited);
        assert_eq!(calculate_cost(&p, 5_000.0, 1_000_000), Decimal::from(800));
    }

    #[test]
    fn test_negative_usage_is_zero() {
        let p = plan("Т2", "Мой онлайн", 300, Allowance::Bounded(0.0), Allowance::Bounded(0));
        assert_eq!(calculate_cost(&p, -4.0, -10), Decimal::from(300));
        assert_eq!(calculate_cost(&p, f64::NAN, 0), Decimal::from(300));
    }

    #[test]
    fn test_fractional_overage_rounded() {
        let p = plan("Т2", "Мой онлайн", 300, Allowance::Bounded(10.0), Allowance::Bounded(0));
        assert_eq!(calculate_cost(&p, 10.123, 0), Decimal::from_str("312.30").unwrap());
    }

    #[test]
    fn test_rank_cheapest_first() {
        let mut archived = plan("МТС", "Архивный", 10, Allowance::Unlimited, Allowance::Unlimited);
        archived.is_archived = true;

        let plans = vec![
            plan("Т2", "Б", 500, Allowance::Unlimited, Allowance::Unlimited),
            plan("МТС", "Маленький", 200, Allowance::Bounded(1.0), Allowance::Bounded(0)),
            plan("Билайн", "А", 500, Allowance::Unlimited, Allowance::Unlimited),
            archived,
        ];

        let ranked = rank_plans(&plans, 5.0, 0);
        let names: Vec<_> = ranked.iter().map(|c| c.plan.name.as_str()).collect();
        assert_eq!(names, vec!["А", "Б", "Маленький"]);
        assert!(ranked[0].is_recommended);
        assert!(ranked[1..].iter().all(|c| !c.is_recommended));
        assert_eq!(ranked[2].total_cost, Decimal::from(600));
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank_plans(&[], 1.0, 1).is_empty());
    }
}
