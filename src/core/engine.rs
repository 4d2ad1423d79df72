use super::types::{
    ComparisonResult, ModelConfig, RentOutcome, RentVsBuy, SimulationParameters, StrategyKind,
    StrategyOutcome, Tenure, WealthBreakdown,
};

/// Fixed monthly payment of a fully amortizing loan.
///
/// `annual_rate` is a percentage. A zero rate falls back to straight-line
/// repayment and a zero duration makes the whole principal due at once, so the
/// result is always finite for finite inputs.
pub fn monthly_payment(principal: f64, annual_rate: f64, years: u32) -> f64 {
    let months = years.saturating_mul(12);
    if months == 0 {
        return principal;
    }
    let monthly_rate = annual_rate / 100.0 / 12.0;
    if monthly_rate == 0.0 {
        return principal / months as f64;
    }

    let denom = 1.0 - (1.0 + monthly_rate).powf(-(months as f64));
    if denom == 0.0 || !denom.is_finite() {
        return principal / months as f64;
    }
    principal * monthly_rate / denom
}

/// Property value after `years` of appreciation at `inflation + premium` percent a year.
pub fn appreciated_value(price: f64, years: u32, inflation: f64, premium: f64) -> f64 {
    let annual = inflation + premium;
    price * (1.0 + annual / 100.0).powf(years as f64)
}

/// Recurring monthly cost of holding the property, independent of financing:
/// property tax, condo fees, home insurance and maintenance.
pub fn monthly_ownership_costs(price: f64, params: &SimulationParameters) -> f64 {
    let property_tax = price * params.property_tax_rate / 100.0 / 12.0;
    let condo_fees = params.condo_fee_per_sqm * params.dwelling_area;
    let maintenance = price * params.maintenance_rate / 100.0 / 12.0;
    property_tax + condo_fees + params.home_insurance + maintenance
}

/// Future value of a constant monthly contribution.
///
/// Each month the contribution is deposited first and the whole balance then
/// earns one month of return, so a deposit grows in the month it is made.
pub fn capitalize_monthly(contribution: f64, monthly_rate: f64, months: u32) -> f64 {
    if monthly_rate == 0.0 {
        return contribution * months as f64;
    }
    let mut value = 0.0;
    for _ in 0..months {
        value = (value + contribution) * (1.0 + monthly_rate);
    }
    value
}

/// Yearly compounding of a one-off amount at `annual_rate` percent.
pub fn capitalize_lump_sum(amount: f64, annual_rate: f64, years: u32) -> f64 {
    amount * (1.0 + annual_rate / 100.0).powf(years as f64)
}

/// Simulates buying at `price` with a `years`-long loan, once with the capped
/// down payment and once fully financed, and keeps the wealthier path.
///
/// Returns `None` when either path's ownership cost breaks the affordability
/// ceiling.
pub fn compare_strategies(
    price: f64,
    years: u32,
    params: &SimulationParameters,
    model: &ModelConfig,
) -> Option<ComparisonResult> {
    let ceiling = affordability_ceiling(params, model);
    let cell = CellContext {
        price,
        years,
        ceiling,
        fixed_costs: monthly_ownership_costs(price, params),
        property_value: appreciated_value(
            price,
            years,
            params.inflation,
            model.appreciation_premium,
        ),
        acquisition_fees: price * params.notary_fee_rate / 100.0,
        grown_invested_capital: capitalize_lump_sum(
            params.invested_capital,
            params.investment_return,
            years,
        ),
    };

    let down_payment = params.available_capital.min(price * model.down_payment_cap);
    let with_down_payment =
        simulate_strategy(&cell, StrategyKind::WithDownPayment, down_payment, params, model)?;
    let without_down_payment =
        simulate_strategy(&cell, StrategyKind::WithoutDownPayment, 0.0, params, model)?;

    let optimal_strategy = if without_down_payment.final_wealth > with_down_payment.final_wealth {
        StrategyKind::WithoutDownPayment
    } else {
        StrategyKind::WithDownPayment
    };
    let optimal = match optimal_strategy {
        StrategyKind::WithDownPayment => with_down_payment,
        StrategyKind::WithoutDownPayment => without_down_payment,
    };

    Some(ComparisonResult {
        price,
        duration_years: years,
        optimal_strategy,
        with_down_payment,
        without_down_payment,
        wealth_gap: (without_down_payment.final_wealth - with_down_payment.final_wealth).abs(),
        property_value: cell.property_value,
        grown_invested_capital: cell.grown_invested_capital,
        optimal_wealth: optimal.final_wealth,
        optimal_monthly_payment: optimal.monthly_payment,
        optimal_ownership_cost: optimal.ownership_cost,
        optimal_monthly_investment: optimal.monthly_investment,
        optimal_down_payment: optimal.down_payment,
        debt_to_income: ratio_to_income(optimal.ownership_cost, params),
        residual_capacity: optimal.residual_capacity,
    })
}

/// Buying at the comparison price and duration versus renting and investing
/// everything the purchase would have absorbed.
pub fn compare_rent_vs_buy(params: &SimulationParameters, model: &ModelConfig) -> RentVsBuy {
    let price = params.comparison_price;
    let years = params.comparison_duration_years;
    let buy = compare_strategies(price, years, params, model);
    let rent = simulate_renting(years, params, model);

    let (winner, wealth_gap) = match (&buy, &rent) {
        (Some(buy), Some(rent)) => {
            let winner = if rent.final_wealth > buy.optimal_wealth {
                Tenure::Rent
            } else {
                Tenure::Buy
            };
            (
                Some(winner),
                Some((rent.final_wealth - buy.optimal_wealth).abs()),
            )
        }
        (Some(_), None) => (Some(Tenure::Buy), None),
        (None, Some(_)) => (Some(Tenure::Rent), None),
        (None, None) => (None, None),
    };

    RentVsBuy {
        price,
        duration_years: years,
        rent,
        buy,
        winner,
        wealth_gap,
    }
}

struct CellContext {
    price: f64,
    years: u32,
    ceiling: f64,
    fixed_costs: f64,
    property_value: f64,
    acquisition_fees: f64,
    grown_invested_capital: f64,
}

fn affordability_ceiling(params: &SimulationParameters, model: &ModelConfig) -> f64 {
    params.monthly_income * model.affordability_ratio
}

fn ratio_to_income(monthly_cost: f64, params: &SimulationParameters) -> f64 {
    if params.monthly_income == 0.0 {
        return 0.0;
    }
    monthly_cost / params.monthly_income * 100.0
}

fn monthly_investment_rate(params: &SimulationParameters) -> f64 {
    params.investment_return / 100.0 / 12.0
}

fn simulate_strategy(
    cell: &CellContext,
    kind: StrategyKind,
    down_payment: f64,
    params: &SimulationParameters,
    model: &ModelConfig,
) -> Option<StrategyOutcome> {
    let principal = cell.price - down_payment;
    let monthly_payment = monthly_payment(principal, params.borrowing_rate, cell.years);
    let loan_insurance = principal * params.loan_insurance_rate / 100.0 / 12.0;
    let ownership_cost = monthly_payment + loan_insurance + cell.fixed_costs;
    if ownership_cost > cell.ceiling {
        return None;
    }

    let residual_capacity = cell.ceiling - ownership_cost;
    let monthly_investment = residual_capacity * model.investment_allocation;
    let breakdown = WealthBreakdown {
        property_value: cell.property_value,
        grown_invested_capital: cell.grown_invested_capital,
        grown_unused_capital: capitalize_lump_sum(
            params.available_capital - down_payment,
            params.investment_return,
            cell.years,
        ),
        grown_contributions: capitalize_monthly(
            monthly_investment,
            monthly_investment_rate(params),
            cell.years.saturating_mul(12),
        ),
        acquisition_fees: cell.acquisition_fees,
    };

    Some(StrategyOutcome {
        kind,
        down_payment,
        principal,
        monthly_payment,
        loan_insurance,
        ownership_cost,
        residual_capacity,
        monthly_investment,
        final_wealth: breakdown.total(),
        breakdown,
    })
}

fn simulate_renting(
    years: u32,
    params: &SimulationParameters,
    model: &ModelConfig,
) -> Option<RentOutcome> {
    let ceiling = affordability_ceiling(params, model);
    if params.monthly_rent > ceiling {
        return None;
    }

    let residual_capacity = ceiling - params.monthly_rent;
    let monthly_investment = residual_capacity * model.investment_allocation;
    let grown_contributions = capitalize_monthly(
        monthly_investment,
        monthly_investment_rate(params),
        years.saturating_mul(12),
    );
    let grown_available_capital =
        capitalize_lump_sum(params.available_capital, params.investment_return, years);
    let grown_invested_capital =
        capitalize_lump_sum(params.invested_capital, params.investment_return, years);

    Some(RentOutcome {
        monthly_rent: params.monthly_rent,
        residual_capacity,
        monthly_investment,
        grown_contributions,
        grown_available_capital,
        grown_invested_capital,
        final_wealth: grown_contributions + grown_available_capital + grown_invested_capital,
    })
}
