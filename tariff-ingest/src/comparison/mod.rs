pub mod calculator;

pub use calculator::{calculate_cost, rank_plans, PlanCost};
