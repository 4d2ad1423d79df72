use serde::Serialize;

use super::error::ParamError;

/// Loan durations swept by default, in years.
pub const DEFAULT_DURATIONS: [u32; 5] = [5, 10, 15, 20, 25];
/// Price increment between two grid columns, in currency units.
pub const DEFAULT_PRICE_STEP: f64 = 10_000.0;
/// Longest loan or comparison horizon accepted, in years.
pub const MAX_DURATION_YEARS: u32 = 100;
/// Largest number of prices a single sweep may visit.
pub const MAX_GRID_PRICES: usize = 100_000;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    WithDownPayment,
    WithoutDownPayment,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Recommendation {
    FavorLeverage,
    FavorDownPayment,
    Neutral,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tenure {
    Buy,
    Rent,
}

/// Household and market inputs. Rates are percentages (`2.8` means 2.8%).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationParameters {
    pub monthly_income: f64,
    pub borrowing_rate: f64,
    pub investment_return: f64,
    pub inflation: f64,
    pub available_capital: f64,
    pub invested_capital: f64,
    pub notary_fee_rate: f64,
    pub maintenance_rate: f64,
    pub loan_insurance_rate: f64,
    pub property_tax_rate: f64,
    pub condo_fee_per_sqm: f64,
    pub home_insurance: f64,
    pub dwelling_area: f64,
    pub monthly_rent: f64,
    pub comparison_duration_years: u32,
    pub comparison_price: f64,
    pub price_min: f64,
    pub price_max: f64,
}

impl SimulationParameters {
    /// Rejects NaN and infinities. Negative amounts are left to the caller.
    pub fn validate(&self) -> Result<(), ParamError> {
        for (field, value) in [
            ("monthlyIncome", self.monthly_income),
            ("borrowingRate", self.borrowing_rate),
            ("investmentReturn", self.investment_return),
            ("inflation", self.inflation),
            ("availableCapital", self.available_capital),
            ("investedCapital", self.invested_capital),
            ("notaryFeeRate", self.notary_fee_rate),
            ("maintenanceRate", self.maintenance_rate),
            ("loanInsuranceRate", self.loan_insurance_rate),
            ("propertyTaxRate", self.property_tax_rate),
            ("condoFeePerSqm", self.condo_fee_per_sqm),
            ("homeInsurance", self.home_insurance),
            ("dwellingArea", self.dwelling_area),
            ("monthlyRent", self.monthly_rent),
            ("comparisonPrice", self.comparison_price),
            ("priceMin", self.price_min),
            ("priceMax", self.price_max),
        ] {
            if !value.is_finite() {
                return Err(ParamError::NonFinite { field });
            }
        }
        if self.comparison_duration_years > MAX_DURATION_YEARS {
            return Err(ParamError::DurationTooLong {
                field: "comparisonDurationYears",
                years: self.comparison_duration_years,
                max: MAX_DURATION_YEARS,
            });
        }
        Ok(())
    }
}

/// Policy knobs of the financial model. Ratios are fractions, not percentages.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    /// Share of monthly income that ownership costs may take.
    pub affordability_ratio: f64,
    /// Share of the residual capacity invested every month.
    pub investment_allocation: f64,
    /// Largest down payment, as a share of the purchase price.
    pub down_payment_cap: f64,
    /// Yearly appreciation on top of inflation, in percent.
    pub appreciation_premium: f64,
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), ParamError> {
        for (field, value) in [
            ("affordabilityRatio", self.affordability_ratio),
            ("investmentAllocation", self.investment_allocation),
            ("downPaymentCap", self.down_payment_cap),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ParamError::OutOfRange { field, max: 1.0 });
            }
        }
        if !self.appreciation_premium.is_finite() {
            return Err(ParamError::NonFinite {
                field: "appreciationPremium",
            });
        }
        Ok(())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            affordability_ratio: 0.40,
            investment_allocation: 0.80,
            down_payment_cap: 0.20,
            appreciation_premium: 1.5,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    pub price_step: f64,
    pub durations: Vec<u32>,
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ParamError> {
        if !self.price_step.is_finite() || self.price_step <= 0.0 {
            return Err(ParamError::InvalidPriceStep(self.price_step));
        }
        if self.durations.is_empty() {
            return Err(ParamError::NoDurations);
        }
        if self.durations.contains(&0) {
            return Err(ParamError::ZeroDuration);
        }
        if let Some(&years) = self.durations.iter().find(|&&y| y > MAX_DURATION_YEARS) {
            return Err(ParamError::DurationTooLong {
                field: "durations",
                years,
                max: MAX_DURATION_YEARS,
            });
        }
        Ok(())
    }

    /// Bounds the number of prices in `price_min..=price_max`. Inverted bounds
    /// are an empty sweep and always pass.
    pub fn validate_grid(&self, price_min: f64, price_max: f64) -> Result<(), ParamError> {
        if price_max < price_min {
            return Ok(());
        }
        if price_min + self.price_step <= price_min {
            return Err(ParamError::InvalidPriceStep(self.price_step));
        }
        let prices = self.price_count(price_min, price_max);
        if !(prices <= MAX_GRID_PRICES as f64) {
            return Err(ParamError::GridTooLarge {
                prices,
                max: MAX_GRID_PRICES,
            });
        }
        Ok(())
    }

    /// Number of grid prices between the bounds, as a float so huge spans do
    /// not overflow.
    pub fn price_count(&self, price_min: f64, price_max: f64) -> f64 {
        if price_max < price_min {
            return 0.0;
        }
        ((price_max - price_min) / self.price_step).floor() + 1.0
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            price_step: DEFAULT_PRICE_STEP,
            durations: DEFAULT_DURATIONS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WealthBreakdown {
    pub property_value: f64,
    pub grown_invested_capital: f64,
    pub grown_unused_capital: f64,
    pub grown_contributions: f64,
    pub acquisition_fees: f64,
}

impl WealthBreakdown {
    pub fn total(&self) -> f64 {
        self.property_value
            + self.grown_invested_capital
            + self.grown_unused_capital
            + self.grown_contributions
            - self.acquisition_fees
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyOutcome {
    pub kind: StrategyKind,
    pub down_payment: f64,
    pub principal: f64,
    pub monthly_payment: f64,
    pub loan_insurance: f64,
    pub ownership_cost: f64,
    pub residual_capacity: f64,
    pub monthly_investment: f64,
    pub final_wealth: f64,
    pub breakdown: WealthBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub price: f64,
    pub duration_years: u32,
    pub optimal_strategy: StrategyKind,
    pub with_down_payment: StrategyOutcome,
    pub without_down_payment: StrategyOutcome,
    pub wealth_gap: f64,
    pub property_value: f64,
    pub grown_invested_capital: f64,
    pub optimal_wealth: f64,
    pub optimal_monthly_payment: f64,
    pub optimal_ownership_cost: f64,
    pub optimal_monthly_investment: f64,
    pub optimal_down_payment: f64,
    pub debt_to_income: f64,
    pub residual_capacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisory {
    pub recommendation: Recommendation,
    pub spread: f64,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentOutcome {
    pub monthly_rent: f64,
    pub residual_capacity: f64,
    pub monthly_investment: f64,
    pub grown_contributions: f64,
    pub grown_available_capital: f64,
    pub grown_invested_capital: f64,
    pub final_wealth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentVsBuy {
    pub price: f64,
    pub duration_years: u32,
    pub rent: Option<RentOutcome>,
    pub buy: Option<ComparisonResult>,
    pub winner: Option<Tenure>,
    pub wealth_gap: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationWealth {
    pub duration_years: u32,
    pub wealth: f64,
}

/// One chart column: every feasible duration at a single price.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSeries {
    pub price: f64,
    pub wealth_by_duration: Vec<DurationWealth>,
}

#[derive(Debug, Clone)]
pub struct OptimizationResult {
    pub ranked: Vec<ComparisonResult>,
    pub series: Vec<PriceSeries>,
}

impl OptimizationResult {
    pub fn best(&self) -> Option<&ComparisonResult> {
        self.ranked.first()
    }
}
