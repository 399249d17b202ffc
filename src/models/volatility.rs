use crate::errors::{WheelError, WheelResult};
use crate::types::PriceSeries;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Minimum closes needed to form one day-over-day change.
const MIN_PRICES: usize = 2;

/// Daily drift and volatility of day-over-day fractional changes.
/// Stack-allocated, Copy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[repr(C)]
pub struct DailyStats {
    /// Mean of `p_t / p_{t-1} - 1`
    pub drift: f64,
    /// Sample standard deviation of the same changes
    pub volatility: f64,
    /// Number of changes the estimate is based on
    pub observations: usize,
}

impl DailyStats {
    /// Estimate from a daily close series.
    /// A single change gives zero volatility (no dispersion to measure).
    pub fn estimate(history: &PriceSeries) -> WheelResult<Self> {
        if history.len() < MIN_PRICES {
            return Err(WheelError::InsufficientData(format!(
                "{} daily closes, need at least {MIN_PRICES} for drift/volatility",
                history.len()
            )));
        }

        let points = history.points();
        let changes: Vec<f64> = points
            .windows(2)
            .map(|w| w[1].close / w[0].close - 1.0)
            .collect();

        let drift = changes.iter().mean();
        let volatility = if changes.len() < 2 {
            0.0
        } else {
            changes.iter().std_dev()
        };

        if !drift.is_finite() || !volatility.is_finite() {
            return Err(WheelError::InsufficientData(
                "daily return statistics are not finite".into(),
            ));
        }

        tracing::debug!(drift, volatility, observations = changes.len(), "daily stats estimated");

        Ok(Self {
            drift,
            volatility,
            observations: changes.len(),
        })
    }

    /// Fixed parameters, for scenarios and tests.
    pub fn new(drift: f64, volatility: f64) -> Self {
        Self {
            drift,
            volatility,
            observations: 0,
        }
    }

    /// Volatility scaled to annual terms (252 trading days).
    #[inline]
    pub fn annualized_vol(&self) -> f64 {
        self.volatility * 252.0_f64.sqrt()
    }
}
