mod advisory;
mod engine;
mod error;
mod solver;
mod types;

pub use advisory::advise;
pub use engine::{
    appreciated_value, capitalize_lump_sum, capitalize_monthly, compare_rent_vs_buy,
    compare_strategies, monthly_ownership_costs, monthly_payment,
};
pub use error::ParamError;
pub use solver::{optimize, wealth_by_price};
pub use types::{
    Advisory, ComparisonResult, DEFAULT_DURATIONS, DEFAULT_PRICE_STEP, DurationWealth,
    MAX_DURATION_YEARS, MAX_GRID_PRICES, ModelConfig, OptimizationResult, PriceSeries, Recommendation, RentOutcome, RentVsBuy,
    SearchConfig, SimulationParameters, StrategyKind, StrategyOutcome, Tenure, WealthBreakdown,
};
