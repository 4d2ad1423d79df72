use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParamError {
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("{field} must be between 0 and {max}")]
    OutOfRange { field: &'static str, max: f64 },

    #[error("price step must be > 0, got {0}")]
    InvalidPriceStep(f64),

    #[error("at least one loan duration is required")]
    NoDurations,

    #[error("loan durations must be > 0 years")]
    ZeroDuration,

    #[error("{field} must be at most {max} years, got {years}")]
    DurationTooLong {
        field: &'static str,
        years: u32,
        max: u32,
    },

    #[error("price grid would hold {prices} prices, the limit is {max}")]
    GridTooLarge { prices: f64, max: usize },
}
