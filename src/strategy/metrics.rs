//! Wheel income metrics for one selected put/call pair.
//!
//! total_premium     = 100 * (call_premium + put_premium)
//! capital_required  = 100 * put_strike
//! period_return_pct = total_premium / capital_required * 100
//! annualized_return = period_return_pct * 12
//!
//! Annualization is simple multiplication by twelve, not compounding.

use crate::errors::{WheelError, WheelResult};
use crate::types::SelectedStrikes;
use serde::Serialize;

/// Shares per standard equity option contract.
pub const CONTRACT_MULTIPLIER: f64 = 100.0;

/// Monthly cycles per year.
const PERIODS_PER_YEAR: f64 = 12.0;

/// Result of the metrics computation. Stack-allocated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrategyMetrics {
    /// Cash securing one put contract
    pub capital_required: f64,
    /// Premium collected on one put plus one call
    pub total_premium: f64,
    /// Premium over capital, in percent
    pub period_return_pct: f64,
    /// period_return_pct * 12
    pub annualized_return_pct: f64,
    /// total_premium * 12, in currency
    pub annualized_premium: f64,
}

/// Pure function: same strikes always produce the same metrics.
/// Refuses non-positive or non-finite put strikes rather than dividing by zero.
pub fn compute_metrics(selected: &SelectedStrikes) -> WheelResult<StrategyMetrics> {
    if !selected.put_strike.is_finite() || selected.put_strike <= 0.0 {
        return Err(WheelError::InvalidStrike(selected.put_strike));
    }

    let total_premium = CONTRACT_MULTIPLIER * (selected.call_premium + selected.put_premium);
    let capital_required = CONTRACT_MULTIPLIER * selected.put_strike;
    let period_return_pct = total_premium / capital_required * 100.0;

    Ok(StrategyMetrics {
        capital_required,
        total_premium,
        period_return_pct,
        annualized_return_pct: period_return_pct * PERIODS_PER_YEAR,
        annualized_premium: total_premium * PERIODS_PER_YEAR,
    })
}
