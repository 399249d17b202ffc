use crate::errors::{WheelError, WheelResult};
use crate::types::PriceSeries;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use statrs::statistics::Statistics;

/// Monthly percent-change distribution.
///
/// Built by resampling daily closes to the last observed close of each
/// calendar month, then taking `(p_t / p_{t-1} - 1) * 100` against the prior
/// month-end. The first month has no predecessor and is dropped, so the
/// series is one shorter than the number of resampled months.
///
/// Two month-ends is the hard minimum. Quantiles at the tails are only
/// meaningful with roughly a year or more of history (13+ months).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReturnSeries {
    returns: Vec<MonthlyReturn>,
    /// Ascending copy of the percent changes, for quantiles.
    #[serde(skip)]
    sorted: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyReturn {
    /// Calendar month-end of the period.
    pub period_end: NaiveDate,
    pub pct_change: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

impl MonthlyReturnSeries {
    pub fn build(history: &PriceSeries) -> WheelResult<Self> {
        let month_ends = resample_month_end(history)?;

        if month_ends.len() < 2 {
            return Err(WheelError::InsufficientData(format!(
                "{} month-end closes after resampling, need at least 2",
                month_ends.len()
            )));
        }

        let returns: Vec<MonthlyReturn> = month_ends
            .windows(2)
            .map(|w| MonthlyReturn {
                period_end: w[1].0,
                pct_change: (w[1].1 / w[0].1 - 1.0) * 100.0,
            })
            .collect();

        tracing::debug!(
            months = month_ends.len(),
            returns = returns.len(),
            "monthly return series built"
        );

        Ok(Self::from_returns(returns))
    }

    fn from_returns(returns: Vec<MonthlyReturn>) -> Self {
        let mut sorted: Vec<f64> = returns.iter().map(|r| r.pct_change).collect();
        sorted.sort_by(f64::total_cmp);
        Self { returns, sorted }
    }

    #[inline]
    pub fn returns(&self) -> &[MonthlyReturn] {
        &self.returns
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    pub fn pct_changes(&self) -> impl Iterator<Item = f64> + '_ {
        self.returns.iter().map(|r| r.pct_change)
    }

    pub fn mean(&self) -> f64 {
        self.pct_changes().mean()
    }

    /// Sample standard deviation (n - 1). None below two observations.
    pub fn std_dev(&self) -> Option<f64> {
        if self.returns.len() < 2 {
            return None;
        }
        Some(self.pct_changes().std_dev())
    }

    /// Percent change below which a fraction `q` of months fall.
    #[inline]
    /// Fails only for a NaN level; build() guarantees at least one return.
    pub fn quantile(&self, q: f64) -> WheelResult<f64> {
        quantile_sorted(&self.sorted, q).ok_or(WheelError::InvalidQuantile(q))
    }

    /// Equal-width bins over [min, max]. The maximum lands in the last bin.
    pub fn histogram(&self, bins: usize) -> Vec<HistogramBin> {
        let (Some(&min), Some(&max)) = (self.sorted.first(), self.sorted.last()) else {
            return Vec::new();
        };
        if bins == 0 {
            return Vec::new();
        }

        // Degenerate range: widen by half a unit each side
        let (lo, hi) = if max > min { (min, max) } else { (min - 0.5, max + 0.5) };
        let width = (hi - lo) / bins as f64;

        let mut out: Vec<HistogramBin> = (0..bins)
            .map(|i| HistogramBin {
                lower: lo + width * i as f64,
                upper: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
                count: 0,
            })
            .collect();

        for &v in &self.sorted {
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            out[idx].count += 1;
        }

        out
    }
}

/// Linear interpolation between order statistics:
/// h = (n - 1) * q, result = x[floor(h)] + frac(h) * (x[floor(h) + 1] - x[floor(h)]).
/// `q` is clamped to [0, 1]. None for empty input or a NaN level.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, q)
}

fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 || q.is_nan() {
        return None;
    }

    let q = q.clamp(0.0, 1.0);
    let h = (n - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = h - lo as f64;

    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Last observed close per calendar month, labelled with the month-end date.
/// Months without observations produce no row.
fn resample_month_end(history: &PriceSeries) -> WheelResult<Vec<(NaiveDate, f64)>> {
    let mut out: Vec<(NaiveDate, f64)> = Vec::new();
    let mut current: Option<(i32, u32)> = None;

    for p in history.points() {
        let key = (p.date.year(), p.date.month());
        if current == Some(key) {
            if let Some(last) = out.last_mut() {
                last.1 = p.close;
            }
            continue;
        }

        let end = month_end(p.date)
            .ok_or_else(|| WheelError::InvalidSeries(format!("no month-end for {}", p.date)))?;
        out.push((end, p.close));
        current = Some(key);
    }

    Ok(out)
}

fn month_end(date: NaiveDate) -> Option<NaiveDate> {
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)?.pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::ymd;

    /// One close on the 15th and one on the 28th of each month, last one wins.
    fn month_end_series(closes: &[f64]) -> PriceSeries {
        let mut pairs = Vec::new();
        for (i, &c) in closes.iter().enumerate() {
            let y = 2020 + (i / 12) as i32;
            let m = (i % 12) as u32 + 1;
            pairs.push((ymd(y, m, 15), c * 0.5));
            pairs.push((ymd(y, m, 28), c));
        }
        PriceSeries::from_pairs(pairs).unwrap()
    }

    #[test]
    fn test_median_of_known_series() {
        let q = quantile(&[-5.0, 0.0, 5.0, 10.0, -10.0], 0.5).unwrap();
        assert_eq!(q, 0.0, "median via linear interpolation should be 0.0, got {q}");
    }

    #[test]
    fn test_quantile_interpolates_between_order_statistics() {
        // sorted: -10, -5, 0, 5, 10; h = 4 * 0.1 = 0.4 -> -10 + 0.4 * 5
        let q = quantile(&[-5.0, 0.0, 5.0, 10.0, -10.0], 0.1).unwrap();
        assert!((q - (-8.0)).abs() < 1e-12, "q(0.1)={q}");

        let q = quantile(&[1.0, 2.0, 3.0, 4.0], 0.25).unwrap();
        assert!((q - 1.75).abs() < 1e-12, "q(0.25)={q}");
    }

    #[test]
    fn test_quantile_extremes_and_empty() {
        let v = [3.0, -1.0, 7.0];
        assert_eq!(quantile(&v, 0.0), Some(-1.0));
        assert_eq!(quantile(&v, 1.0), Some(7.0));
        assert_eq!(quantile(&v, 1.5), Some(7.0), "q above 1 is clamped");
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_nan_level_is_rejected() {
        assert_eq!(quantile(&[1.0, 2.0, 3.0], f64::NAN), None, "NaN level must not fall back to the median");
        let monthly = MonthlyReturnSeries::build(&month_end_series(&[100.0, 110.0, 99.0])).unwrap();
        assert!(matches!(monthly.quantile(f64::NAN), Err(WheelError::InvalidQuantile(_))));
        assert!(monthly.quantile(0.5).is_ok());
    }

    #[test]
    fn test_monthly_resample_uses_last_close_of_month() {
        let series = month_end_series(&[100.0, 110.0, 99.0]);
        let monthly = MonthlyReturnSeries::build(&series).unwrap();

        assert_eq!(monthly.len(), 2, "first month is dropped");
        let r = monthly.returns();
        assert_eq!(r[0].period_end, ymd(2020, 2, 29));
        assert!((r[0].pct_change - 10.0).abs() < 1e-9, "got {}", r[0].pct_change);
        assert_eq!(r[1].period_end, ymd(2020, 3, 31));
        assert!((r[1].pct_change - (-10.0)).abs() < 1e-9, "got {}", r[1].pct_change);
    }

    #[test]
    fn test_month_end_crosses_year() {
        let series = PriceSeries::from_pairs([(ymd(2023, 12, 5), 50.0), (ymd(2024, 1, 9), 55.0)]).unwrap();
        let monthly = MonthlyReturnSeries::build(&series).unwrap();
        assert_eq!(monthly.returns()[0].period_end, ymd(2024, 1, 31));
    }

    #[test]
    fn test_single_month_is_insufficient() {
        let series = PriceSeries::from_pairs([(ymd(2024, 3, 1), 10.0), (ymd(2024, 3, 28), 11.0)]).unwrap();
        let r = MonthlyReturnSeries::build(&series);
        assert!(matches!(r, Err(WheelError::InsufficientData(_))));

        assert!(MonthlyReturnSeries::build(&PriceSeries::default()).is_err());
    }

    #[test]
    fn test_moments() {
        let series = month_end_series(&[100.0, 110.0, 99.0]);
        let monthly = MonthlyReturnSeries::build(&series).unwrap();
        assert!(monthly.mean().abs() < 1e-9, "mean of +10/-10 should be 0");
        let sd = monthly.std_dev().unwrap();
        assert!((sd - 200.0_f64.sqrt()).abs() < 1e-9, "sample std of +10/-10 = sqrt(200), got {sd}");
    }

    #[test]
    fn test_std_dev_needs_two_returns() {
        let series = month_end_series(&[100.0, 105.0]);
        let monthly = MonthlyReturnSeries::build(&series).unwrap();
        assert_eq!(monthly.std_dev(), None);
    }

    #[test]
    fn test_build_is_bit_identical() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 1.7).sin() * 12.0).collect();
        let series = month_end_series(&closes);
        let a = MonthlyReturnSeries::build(&series).unwrap();
        let b = MonthlyReturnSeries::build(&series).unwrap();
        for (x, y) in a.returns().iter().zip(b.returns()) {
            assert_eq!(x.pct_change.to_bits(), y.pct_change.to_bits());
            assert_eq!(x.period_end, y.period_end);
        }
        assert_eq!(a.len(), b.len());
    }

    #[test]
    fn test_histogram_counts_everything() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + (i as f64 * 0.9).cos() * 8.0).collect();
        let monthly = MonthlyReturnSeries::build(&month_end_series(&closes)).unwrap();
        let hist = monthly.histogram(15);

        assert_eq!(hist.len(), 15);
        let total: usize = hist.iter().map(|b| b.count).sum();
        assert_eq!(total, monthly.len(), "every month must land in a bin");
        assert!(hist[14].count >= 1, "maximum belongs to the last bin");
        assert!(monthly.histogram(0).is_empty());
    }
}
