//! Risk tolerance to strike-target mapping.
//!
//! Two independent piecewise-linear schedules turn r in [0, 100] into a
//! put-side and a call-side quantile of the monthly return distribution:
//!
//!   put_q(r)  = 0.05                               r <= 10
//!             = 0.05 + (r - 10)/90 * (0.50 - 0.05)  r > 10
//!   call_q(r) = 0.95                               r <= 10
//!             = 0.95 - (r - 10)/90 * (0.95 - 0.50)  r > 10
//!
//! Below r = 10 strikes sit far out (conservative zone). At r = 100 both
//! quantiles reach the median, i.e. at-the-money.
//!
//! All functions are pure.

use crate::errors::{WheelError, WheelResult};
use crate::models::MonthlyReturnSeries;
use serde::Serialize;

/// Flat zone upper bound.
const CONSERVATIVE_ZONE: f64 = 10.0;
const PUT_FLOOR_QUANTILE: f64 = 0.05;
const CALL_CEILING_QUANTILE: f64 = 0.95;
const MEDIAN_QUANTILE: f64 = 0.50;
const MIN_QUANTILE: f64 = 0.01;
const MAX_QUANTILE: f64 = 0.99;

/// A validated tolerance in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct RiskTolerance(f64);

impl RiskTolerance {
    pub fn new(value: f64) -> WheelResult<Self> {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(WheelError::InvalidRiskTolerance(value));
        }
        Ok(Self(value))
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

/// Quantile levels for the put and call sides.
/// put <= 0.5 <= call is the usual regime but is not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuantilePair {
    pub put_quantile: f64,
    pub call_quantile: f64,
}

impl QuantilePair {
    pub fn from_tolerance(r: RiskTolerance) -> Self {
        Self {
            put_quantile: put_quantile(r.value()),
            call_quantile: call_quantile(r.value()),
        }
    }

    /// Caller-chosen levels, bypassing the schedule. Clamped like the schedule;
    /// NaN is rejected.
    pub fn explicit(put_quantile: f64, call_quantile: f64) -> WheelResult<Self> {
        for q in [put_quantile, call_quantile] {
            if q.is_nan() {
                return Err(WheelError::InvalidQuantile(q));
            }
        }
        Ok(Self {
            put_quantile: clamp_quantile(put_quantile),
            call_quantile: clamp_quantile(call_quantile),
        })
    }
}

/// Absolute target prices. put < last < call is intended but not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TargetPrices {
    pub put_target: f64,
    pub call_target: f64,
}

#[inline]
pub fn put_quantile(r: f64) -> f64 {
    let q = if r <= CONSERVATIVE_ZONE {
        PUT_FLOOR_QUANTILE
    } else {
        PUT_FLOOR_QUANTILE
            + (r - CONSERVATIVE_ZONE) / (100.0 - CONSERVATIVE_ZONE) * (MEDIAN_QUANTILE - PUT_FLOOR_QUANTILE)
    };
    clamp_quantile(q)
}

#[inline]
pub fn call_quantile(r: f64) -> f64 {
    let q = if r <= CONSERVATIVE_ZONE {
        CALL_CEILING_QUANTILE
    } else {
        CALL_CEILING_QUANTILE
            - (r - CONSERVATIVE_ZONE) / (100.0 - CONSERVATIVE_ZONE) * (CALL_CEILING_QUANTILE - MEDIAN_QUANTILE)
    };
    clamp_quantile(q)
}

#[inline]
fn clamp_quantile(q: f64) -> f64 {
    q.clamp(MIN_QUANTILE, MAX_QUANTILE)
}

/// Apply the quantile-implied monthly move to the current price.
///
/// target = last_price * (1 + quantile(monthly, q) / 100)
pub fn target_prices(
    monthly: &MonthlyReturnSeries,
    last_price: f64,
    quantiles: QuantilePair,
) -> WheelResult<TargetPrices> {
    if !last_price.is_finite() || last_price <= 0.0 {
        return Err(WheelError::InvalidPrice(last_price));
    }
    if monthly.is_empty() {
        return Err(WheelError::InsufficientData("empty monthly return series".into()));
    }

    let put_pct = monthly.quantile(quantiles.put_quantile)? / 100.0;
    let call_pct = monthly.quantile(quantiles.call_quantile)? / 100.0;

    Ok(TargetPrices {
        put_target: last_price * (1.0 + put_pct),
        call_target: last_price * (1.0 + call_pct),
    })
}
