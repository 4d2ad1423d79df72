use tracing::debug;

use super::engine::compare_strategies;
use super::error::ParamError;
use super::types::{
    ComparisonResult, DurationWealth, ModelConfig, OptimizationResult, PriceSeries, SearchConfig,
    SimulationParameters,
};

/// Exhaustive search over `price_min..=price_max` × `search.durations`.
///
/// Infeasible cells are dropped. The ranking is sorted by optimal wealth,
/// highest first, and keeps grid order among equal values. An empty ranking is
/// a valid outcome: nothing in the sweep is affordable.
pub fn optimize(
    params: &SimulationParameters,
    model: &ModelConfig,
    search: &SearchConfig,
) -> Result<OptimizationResult, ParamError> {
    params.validate()?;
    model.validate()?;
    search.validate()?;
    search.validate_grid(params.price_min, params.price_max)?;

    let prices = price_grid(params.price_min, params.price_max, search.price_step);
    let mut ranked = Vec::with_capacity(prices.len() * search.durations.len());
    for &price in &prices {
        for &years in &search.durations {
            if let Some(result) = compare_strategies(price, years, params, model) {
                ranked.push(result);
            }
        }
    }

    ranked.sort_by(|a, b| b.optimal_wealth.total_cmp(&a.optimal_wealth));
    let series = wealth_by_price(&ranked);

    debug!(
        cells = prices.len() * search.durations.len(),
        feasible = ranked.len(),
        best_price = ranked.first().map(|r| r.price),
        best_duration = ranked.first().map(|r| r.duration_years),
        "grid search finished"
    );

    Ok(OptimizationResult { ranked, series })
}

/// Pivots results into one column per price (ascending) holding the optimal
/// wealth of each feasible duration (ascending).
pub fn wealth_by_price(results: &[ComparisonResult]) -> Vec<PriceSeries> {
    let mut cells: Vec<(f64, u32, f64)> = results
        .iter()
        .map(|r| (r.price, r.duration_years, r.optimal_wealth))
        .collect();
    cells.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut series: Vec<PriceSeries> = Vec::new();
    for (price, duration_years, wealth) in cells {
        let point = DurationWealth {
            duration_years,
            wealth,
        };
        match series.last_mut() {
            Some(last) if last.price == price => {
                // A duplicate cell overwrites the earlier value for that duration.
                if let Some(existing) = last
                    .wealth_by_duration
                    .iter_mut()
                    .find(|p| p.duration_years == duration_years)
                {
                    *existing = point;
                } else {
                    last.wealth_by_duration.push(point);
                }
            }
            _ => series.push(PriceSeries {
                price,
                wealth_by_duration: vec![point],
            }),
        }
    }
    series
}

/// Callers bound the grid size with `SearchConfig::validate_grid` first.
fn price_grid(price_min: f64, price_max: f64, step: f64) -> Vec<f64> {
    if price_max < price_min {
        return Vec::new();
    }
    // One extra index absorbs rounding in the division.
    let last = ((price_max - price_min) / step).floor() as u64 + 1;
    (0..=last)
        .map(|index| price_min + index as f64 * step)
        .take_while(|&price| price <= price_max)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MAX_DURATION_YEARS, MAX_GRID_PRICES};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn sample_params() -> SimulationParameters {
        SimulationParameters {
            monthly_income: 5_000.0,
            borrowing_rate: 2.8,
            investment_return: 6.0,
            inflation: 2.0,
            available_capital: 18_000.0,
            invested_capital: 42_000.0,
            notary_fee_rate: 8.0,
            maintenance_rate: 1.0,
            loan_insurance_rate: 0.3,
            property_tax_rate: 1.2,
            condo_fee_per_sqm: 3.5,
            home_insurance: 45.0,
            dwelling_area: 60.0,
            monthly_rent: 1_000.0,
            comparison_duration_years: 20,
            comparison_price: 200_000.0,
            price_min: 150_000.0,
            price_max: 300_000.0,
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(24))]

        #[test]
        fn prop_ranking_is_sorted_and_feasible(
            income in 2_000u32..12_000,
            price_min_k in 50u32..400,
            span_k in 0u32..200,
            borrowing_bp in 0u32..700,
            return_bp in 0u32..1_000
        ) {
            let mut params = sample_params();
            params.monthly_income = income as f64;
            params.price_min = price_min_k as f64 * 1_000.0;
            params.price_max = (price_min_k + span_k) as f64 * 1_000.0;
            params.borrowing_rate = borrowing_bp as f64 / 100.0;
            params.investment_return = return_bp as f64 / 100.0;

            let result = optimize(&params, &ModelConfig::default(), &SearchConfig::default())
                .expect("valid search");
            for pair in result.ranked.windows(2) {
                prop_assert!(pair[0].optimal_wealth >= pair[1].optimal_wealth);
            }
            for cell in &result.ranked {
                prop_assert!(cell.optimal_ownership_cost <= params.monthly_income * 0.4 + 1e-9);
                prop_assert!(cell.price >= params.price_min && cell.price <= params.price_max);
            }
            let charted: usize = result.series.iter().map(|s| s.wealth_by_duration.len()).sum();
            prop_assert_eq!(charted, result.ranked.len());
        }
    }

    #[test]
    fn single_cell_matches_direct_comparison() {
        let mut params = sample_params();
        params.price_min = 200_000.0;
        params.price_max = 200_000.0;
        let model = ModelConfig::default();
        let search = SearchConfig {
            price_step: 10_000.0,
            durations: vec![20],
        };

        let result = optimize(&params, &model, &search).expect("valid search");
        let direct = compare_strategies(200_000.0, 20, &params, &model);
        assert_eq!(result.ranked.len(), 1);
        assert_eq!(result.best(), direct.as_ref());
    }

    #[test]
    fn default_grid_visits_every_price_and_duration() {
        let mut params = sample_params();
        params.monthly_income = 1_000_000.0;
        let result = optimize(&params, &ModelConfig::default(), &SearchConfig::default())
            .expect("valid search");
        // 150k..=300k in 10k steps is 16 prices.
        assert_eq!(result.ranked.len(), 16 * 5);
        assert_eq!(result.series.len(), 16);
        assert_eq!(result.series[0].price, 150_000.0);
        assert_eq!(result.series[15].price, 300_000.0);
        let durations: Vec<u32> = result.series[3]
            .wealth_by_duration
            .iter()
            .map(|p| p.duration_years)
            .collect();
        assert_eq!(durations, vec![5, 10, 15, 20, 25]);
    }

    #[test]
    fn best_is_head_of_ranking() {
        let params = sample_params();
        let result = optimize(&params, &ModelConfig::default(), &SearchConfig::default())
            .expect("valid search");
        let best = result.best().expect("reference household has feasible cells");
        let max = result
            .ranked
            .iter()
            .map(|r| r.optimal_wealth)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(best.optimal_wealth, max);
    }

    #[test]
    fn unaffordable_sweep_is_empty_not_an_error() {
        let mut params = sample_params();
        params.monthly_income = 500.0;
        let result = optimize(&params, &ModelConfig::default(), &SearchConfig::default())
            .expect("valid search");
        assert!(result.ranked.is_empty());
        assert!(result.series.is_empty());
        assert!(result.best().is_none());
    }

    #[test]
    fn inverted_price_bounds_yield_empty_sweep() {
        let mut params = sample_params();
        params.price_min = 300_000.0;
        params.price_max = 150_000.0;
        let result = optimize(&params, &ModelConfig::default(), &SearchConfig::default())
            .expect("valid search");
        assert!(result.ranked.is_empty());
    }

    #[test]
    fn price_grid_includes_upper_bound_only_when_on_step() {
        assert_eq!(
            price_grid(100.0, 130.0, 10.0),
            vec![100.0, 110.0, 120.0, 130.0]
        );
        assert_eq!(price_grid(100.0, 125.0, 10.0), vec![100.0, 110.0, 120.0]);
        assert_eq!(price_grid(100.0, 100.0, 10.0), vec![100.0]);
    }

    #[test]
    fn oversized_grid_is_rejected_before_allocating() {
        let params = sample_params();
        let model = ModelConfig::default();
        let tiny_step = SearchConfig {
            price_step: 1e-9,
            durations: vec![5],
        };
        assert!(matches!(
            optimize(&params, &model, &tiny_step),
            Err(ParamError::GridTooLarge { max: MAX_GRID_PRICES, .. })
        ));

        let mut wide = sample_params();
        wide.price_max = 1e300;
        assert!(matches!(
            optimize(&wide, &model, &SearchConfig::default()),
            Err(ParamError::GridTooLarge { .. })
        ));

        // A step lost in the rounding of price_min would repeat the same price.
        let mut huge_min = sample_params();
        huge_min.price_min = 1e20;
        huge_min.price_max = 1e20;
        let unit_step = SearchConfig {
            price_step: 1.0,
            durations: vec![5],
        };
        assert_eq!(
            optimize(&huge_min, &model, &unit_step).err(),
            Some(ParamError::InvalidPriceStep(1.0))
        );
    }

    #[test]
    fn grid_at_the_price_limit_is_accepted() {
        let search = SearchConfig {
            price_step: 1.0,
            durations: vec![5],
        };
        let max_price = (MAX_GRID_PRICES - 1) as f64;
        assert_eq!(search.price_count(0.0, max_price), MAX_GRID_PRICES as f64);
        assert!(search.validate_grid(0.0, max_price).is_ok());
        assert!(search.validate_grid(0.0, max_price + 1.0).is_err());
        assert!(search.validate_grid(10.0, 0.0).is_ok());
    }

    #[test]
    fn comparison_horizon_is_bounded() {
        let mut params = sample_params();
        params.comparison_duration_years = MAX_DURATION_YEARS + 1;
        assert_eq!(
            params.validate().err(),
            Some(ParamError::DurationTooLong {
                field: "comparisonDurationYears",
                years: MAX_DURATION_YEARS + 1,
                max: MAX_DURATION_YEARS,
            })
        );
        params.comparison_duration_years = MAX_DURATION_YEARS;
        assert!(params.validate().is_ok());
    }

    #[test]
    fn series_groups_by_price_and_sorts_durations() {
        let params = sample_params();
        let model = ModelConfig::default();
        let cells: Vec<ComparisonResult> = [(160_000.0, 25), (150_000.0, 15), (160_000.0, 15)]
            .into_iter()
            .filter_map(|(price, years)| compare_strategies(price, years, &params, &model))
            .collect();
        assert_eq!(cells.len(), 3);

        let series = wealth_by_price(&cells);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].price, 150_000.0);
        assert_eq!(series[0].wealth_by_duration.len(), 1);
        assert_eq!(series[1].price, 160_000.0);
        assert_eq!(series[1].wealth_by_duration[0].duration_years, 15);
        assert_eq!(series[1].wealth_by_duration[1].duration_years, 25);
        assert_eq!(series[1].wealth_by_duration[1].wealth, cells[0].optimal_wealth);
    }

    #[test]
    fn invalid_search_config_is_rejected() {
        let params = sample_params();
        let model = ModelConfig::default();
        let zero_step = SearchConfig {
            price_step: 0.0,
            durations: vec![5],
        };
        assert_eq!(
            optimize(&params, &model, &zero_step).err(),
            Some(ParamError::InvalidPriceStep(0.0))
        );

        let no_durations = SearchConfig {
            price_step: 10_000.0,
            durations: Vec::new(),
        };
        assert_eq!(
            optimize(&params, &model, &no_durations).err(),
            Some(ParamError::NoDurations)
        );

        let too_long = SearchConfig {
            price_step: 10_000.0,
            durations: vec![20, 179_000_000],
        };
        assert_eq!(
            optimize(&params, &model, &too_long).err(),
            Some(ParamError::DurationTooLong {
                field: "durations",
                years: 179_000_000,
                max: MAX_DURATION_YEARS,
            })
        );

        let mut nan_params = sample_params();
        nan_params.inflation = f64::NAN;
        assert_eq!(
            optimize(&nan_params, &model, &SearchConfig::default()).err(),
            Some(ParamError::NonFinite { field: "inflation" })
        );
    }
}
