use super::types::{Advisory, Recommendation};

/// Spread, in percentage points, below which the rate difference is called marginal.
const NEUTRAL_BAND: f64 = 0.5;

/// Descriptive hint from the gap between investment return and borrowing cost.
/// It never feeds back into the optimizer.
pub fn advise(investment_return: f64, borrowing_rate: f64) -> Advisory {
    let spread = investment_return - borrowing_rate;
    let (recommendation, message) = if spread > NEUTRAL_BAND {
        (
            Recommendation::FavorLeverage,
            format!(
                "Investment return ({investment_return}%) exceeds borrowing rate ({borrowing_rate}%): borrow more and invest the difference."
            ),
        )
    } else if spread < -NEUTRAL_BAND {
        (
            Recommendation::FavorDownPayment,
            format!(
                "Borrowing rate ({borrowing_rate}%) exceeds investment return ({investment_return}%): put capital into the down payment."
            ),
        )
    } else {
        (
            Recommendation::Neutral,
            format!(
                "Rates are close ({borrowing_rate}% vs {investment_return}%): the choice of down payment is marginal."
            ),
        )
    };

    Advisory {
        recommendation,
        spread,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_positive_spread_favors_leverage() {
        let advisory = advise(7.0, 3.5);
        assert_eq!(advisory.recommendation, Recommendation::FavorLeverage);
        assert!((advisory.spread - 3.5).abs() < 1e-12);
        assert!(advisory.message.contains("7%"));
    }

    #[test]
    fn negative_spread_favors_down_payment() {
        let advisory = advise(2.0, 5.0);
        assert_eq!(advisory.recommendation, Recommendation::FavorDownPayment);
        assert!((advisory.spread + 3.0).abs() < 1e-12);
    }

    #[test]
    fn narrow_spread_is_neutral() {
        let advisory = advise(3.2, 3.0);
        assert_eq!(advisory.recommendation, Recommendation::Neutral);
        assert!(advisory.message.contains("3%"));
    }

    #[test]
    fn band_edges_are_neutral() {
        assert_eq!(advise(3.5, 3.0).recommendation, Recommendation::Neutral);
        assert_eq!(advise(2.5, 3.0).recommendation, Recommendation::Neutral);
    }
}
