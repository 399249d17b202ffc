use crate::errors::{WheelError, WheelResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ── Price History ──

/// One daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Daily closes, strictly increasing in date.
/// Owned by whoever fetched it; the core only reads it.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Validates ordering and values. An empty series is accepted here and
    /// rejected later by whichever computation needs data.
    pub fn new(points: Vec<PricePoint>) -> WheelResult<Self> {
        for p in &points {
            if !p.close.is_finite() || p.close <= 0.0 {
                return Err(WheelError::InvalidSeries(format!(
                    "close {} on {} is not a positive finite price",
                    p.close, p.date
                )));
            }
        }

        for w in points.windows(2) {
            if w[1].date <= w[0].date {
                return Err(WheelError::InvalidSeries(format!(
                    "dates not strictly increasing: {} then {}",
                    w[0].date, w[1].date
                )));
            }
        }

        Ok(Self { points })
    }

    pub fn from_pairs<I>(pairs: I) -> WheelResult<Self>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(date, close)| PricePoint { date, close })
                .collect(),
        )
    }

    #[inline]
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn last_price(&self) -> Option<f64> {
        self.points.last().map(|p| p.close)
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.close)
    }
}

// ── Selected Positions ──

/// Put and call chosen from the chain, with their quoted premiums (per share).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SelectedStrikes {
    pub put_strike: f64,
    pub put_premium: f64,
    pub call_strike: f64,
    pub call_premium: f64,
}
