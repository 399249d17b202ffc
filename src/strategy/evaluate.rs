use crate::chain::{select_expiration, select_strikes, OptionChain, StrikePolicy};
use crate::errors::{WheelError, WheelResult};
use crate::feeds::MarketData;
use crate::models::{HistogramBin, MonthlyReturnSeries};
use crate::risk::{target_prices, QuantilePair, RiskTolerance, TargetPrices};
use crate::simulation::{MonteCarloSimulator, SimulationParams, SimulationResult};
use crate::strategy::metrics::{compute_metrics, StrategyMetrics};
use crate::types::{PriceSeries, SelectedStrikes};
use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;

/// Bins in the report's monthly-return histogram.
const HISTOGRAM_BINS: usize = 15;

/// Knobs for one evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationSettings {
    pub risk_tolerance: RiskTolerance,
    /// Overrides the tolerance schedule when set.
    pub quantiles: Option<QuantilePair>,
    pub strike_policy: StrikePolicy,
    /// `None` skips the Monte Carlo stage.
    pub simulation: Option<SimulationParams>,
}

impl EvaluationSettings {
    pub fn new(risk_tolerance: RiskTolerance) -> Self {
        Self {
            risk_tolerance,
            quantiles: None,
            strike_policy: StrikePolicy::default(),
            simulation: Some(SimulationParams::default()),
        }
    }

    fn quantile_pair(&self) -> QuantilePair {
        self.quantiles
            .unwrap_or_else(|| QuantilePair::from_tolerance(self.risk_tolerance))
    }
}

/// Everything one pass produced, ready for JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub ticker: String,
    pub last_price: f64,
    pub expiration: NaiveDate,
    pub risk_tolerance: RiskTolerance,
    pub strike_policy: StrikePolicy,
    pub monthly_observations: usize,
    pub monthly_mean_pct: f64,
    pub monthly_std_pct: Option<f64>,
    pub monthly_histogram: Vec<HistogramBin>,
    pub quantiles: QuantilePair,
    pub targets: TargetPrices,
    pub selected: SelectedStrikes,
    pub metrics: StrategyMetrics,
    pub simulation: Option<SimulationResult>,
}

/// Run distribution -> risk mapping -> strike matching -> metrics, then the
/// optional simulation, over data already in memory. Stops at the first error.
pub fn evaluate<R: Rng + ?Sized>(
    ticker: &str,
    history: &PriceSeries,
    chain: &OptionChain,
    settings: &EvaluationSettings,
    rng: &mut R,
) -> WheelResult<EvaluationReport> {
    let last_price = history
        .last_price()
        .ok_or_else(|| WheelError::InsufficientData(format!("{ticker}: empty price history")))?;

    tracing::info!(
        ticker,
        last_price,
        risk_tolerance = settings.risk_tolerance.value(),
        expiration = %chain.expiration,
        "evaluation started"
    );

    let monthly = MonthlyReturnSeries::build(history)?;
    let quantiles = settings.quantile_pair();
    let targets = target_prices(&monthly, last_price, quantiles)?;
    let selected = select_strikes(chain, targets, settings.strike_policy)?;
    let metrics = compute_metrics(&selected)?;

    tracing::info!(
        ticker,
        put_strike = selected.put_strike,
        call_strike = selected.call_strike,
        total_premium = metrics.total_premium,
        annualized_return_pct = metrics.annualized_return_pct,
        "metrics computed"
    );

    let simulation = match settings.simulation {
        Some(params) => Some(MonteCarloSimulator::new(params).run_from_history(
            history,
            last_price,
            selected.put_strike,
            selected.call_strike,
            rng,
        )?),
        None => None,
    };

    Ok(EvaluationReport {
        ticker: ticker.to_string(),
        last_price,
        expiration: chain.expiration,
        risk_tolerance: settings.risk_tolerance,
        strike_policy: settings.strike_policy,
        monthly_observations: monthly.len(),
        monthly_mean_pct: monthly.mean(),
        monthly_std_pct: monthly.std_dev(),
        monthly_histogram: monthly.histogram(HISTOGRAM_BINS),
        quantiles,
        targets,
        selected,
        metrics,
        simulation,
    })
}

/// Fetch history, expirations and the chosen chain from `source`, then
/// evaluate. Failures are logged once here and returned unchanged.
pub async fn evaluate_ticker<M: MarketData, R: Rng + ?Sized>(
    source: &M,
    ticker: &str,
    lookback: &str,
    today: NaiveDate,
    settings: &EvaluationSettings,
    rng: &mut R,
) -> WheelResult<EvaluationReport> {
    let result = fetch_and_evaluate(source, ticker, lookback, today, settings, rng).await;
    if let Err(e) = &result {
        tracing::warn!(ticker, error = %e, "evaluation aborted");
    }
    result
}

async fn fetch_and_evaluate<M: MarketData, R: Rng + ?Sized>(
    source: &M,
    ticker: &str,
    lookback: &str,
    today: NaiveDate,
    settings: &EvaluationSettings,
    rng: &mut R,
) -> WheelResult<EvaluationReport> {
    let history = source.price_history(ticker, lookback).await?;
    let expirations = source.expirations(ticker).await?;
    let expiration = select_expiration(&expirations, today)?;
    tracing::info!(ticker, %today, %expiration, listed = expirations.len(), "expiration chosen");

    let chain = source.option_chain(ticker, expiration).await?;
    evaluate(ticker, &history, &chain, settings, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::test_support::side;
    use crate::types::test_support::{daily_series, ymd};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// ~15 months of daily closes with a gentle saw-tooth around an uptrend.
    fn history() -> PriceSeries {
        let closes: Vec<f64> = (0..460)
            .map(|i| 100.0 + i as f64 * 0.02 + ((i % 37) as f64 - 18.0) * 0.3)
            .collect();
        daily_series(ymd(2023, 3, 1), &closes)
    }

    fn chain(expiration: NaiveDate) -> OptionChain {
        let quotes: Vec<(f64, Option<f64>)> = (10..=30)
            .map(|i| {
                let k = i as f64 * 5.0;
                (k, Some(((150.0 - k).abs() * 0.02 + 0.5).max(0.05)))
            })
            .collect();
        OptionChain {
            expiration,
            calls: side(&quotes),
            puts: side(&quotes),
        }
    }

    struct FakeSource {
        history: PriceSeries,
        expirations: Vec<NaiveDate>,
        chain: OptionChain,
    }

    impl MarketData for FakeSource {
        async fn price_history(&self, _ticker: &str, _lookback: &str) -> WheelResult<PriceSeries> {
            Ok(self.history.clone())
        }

        async fn expirations(&self, _ticker: &str) -> WheelResult<Vec<NaiveDate>> {
            Ok(self.expirations.clone())
        }

        async fn option_chain(&self, _ticker: &str, expiration: NaiveDate) -> WheelResult<OptionChain> {
            if expiration != self.chain.expiration {
                return Err(WheelError::NoData(format!("no chain for {expiration}")));
            }
            Ok(self.chain.clone())
        }
    }

    fn settings(r: f64) -> EvaluationSettings {
        EvaluationSettings::new(RiskTolerance::new(r).unwrap())
    }

    #[test]
    fn test_full_pass() {
        let h = history();
        let c = chain(ymd(2024, 7, 19));
        let mut rng = StdRng::seed_from_u64(7);
        let report = evaluate("TEST", &h, &c, &settings(50.0), &mut rng).unwrap();

        assert_eq!(report.last_price, h.last_price().unwrap());
        assert!(report.monthly_observations >= 13, "months={}", report.monthly_observations);
        assert_eq!(report.monthly_histogram.len(), 15);
        let binned: usize = report.monthly_histogram.iter().map(|b| b.count).sum();
        assert_eq!(binned, report.monthly_observations, "every month lands in a bin");
        assert!(report.targets.put_target <= report.targets.call_target);
        assert!(report.selected.put_strike <= report.selected.call_strike);
        assert_eq!(report.metrics.capital_required, 100.0 * report.selected.put_strike);

        let sim = report.simulation.as_ref().expect("simulation enabled by default");
        assert_eq!(sim.counts.total(), sim.params.paths);
        let total = sim.prob_assigned + sim.prob_called_away + sim.prob_kept;
        assert!((total - 100.0).abs() < 1e-9, "probabilities sum to {total}");
    }

    #[test]
    fn test_seeded_pass_is_reproducible() {
        let h = history();
        let c = chain(ymd(2024, 7, 19));
        let a = evaluate("TEST", &h, &c, &settings(30.0), &mut StdRng::seed_from_u64(99)).unwrap();
        let b = evaluate("TEST", &h, &c, &settings(30.0), &mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(a, b, "same seed and inputs must give the same report");
    }

    #[test]
    fn test_simulation_can_be_skipped() {
        let mut s = settings(50.0);
        s.simulation = None;
        let report = evaluate("TEST", &history(), &chain(ymd(2024, 7, 19)), &s, &mut StdRng::seed_from_u64(1)).unwrap();
        assert!(report.simulation.is_none());
    }

    #[test]
    fn test_explicit_quantiles_override_schedule() {
        let mut s = settings(50.0);
        s.quantiles = Some(QuantilePair::explicit(0.5, 0.5).unwrap());
        s.simulation = None;
        let report = evaluate("TEST", &history(), &chain(ymd(2024, 7, 19)), &s, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(report.targets.put_target, report.targets.call_target);
    }

    #[test]
    fn test_missing_premium_aborts() {
        let mut c = chain(ymd(2024, 7, 19));
        let unquoted: Vec<(f64, Option<f64>)> = (10..=30).map(|i| (i as f64 * 5.0, None)).collect();
        c.puts = side(&unquoted);
        let r = evaluate("TEST", &history(), &c, &settings(50.0), &mut StdRng::seed_from_u64(1));
        assert!(matches!(r, Err(WheelError::QuoteMissing { .. })), "got {r:?}");
    }

    #[test]
    fn test_short_history_aborts() {
        let h = daily_series(ymd(2024, 5, 1), &[100.0, 101.0, 102.0]);
        let r = evaluate("TEST", &h, &chain(ymd(2024, 7, 19)), &settings(50.0), &mut StdRng::seed_from_u64(1));
        assert!(matches!(r, Err(WheelError::InsufficientData(_))), "got {r:?}");
    }

    #[tokio::test]
    async fn test_evaluate_ticker_picks_next_month_expiration() {
        let source = FakeSource {
            history: history(),
            expirations: vec![ymd(2024, 6, 21), ymd(2024, 6, 28), ymd(2024, 7, 5), ymd(2024, 7, 19)],
            chain: chain(ymd(2024, 7, 5)),
        };
        let mut rng = StdRng::seed_from_u64(3);
        let report = evaluate_ticker(&source, "TEST", "5y", ymd(2024, 6, 12), &settings(50.0), &mut rng)
            .await
            .unwrap();
        assert_eq!(report.expiration, ymd(2024, 7, 5));
    }

    #[tokio::test]
    async fn test_evaluate_ticker_without_later_expiration() {
        let source = FakeSource {
            history: history(),
            expirations: vec![ymd(2024, 6, 21), ymd(2024, 6, 28)],
            chain: chain(ymd(2024, 6, 28)),
        };
        let mut rng = StdRng::seed_from_u64(3);
        let r = evaluate_ticker(&source, "TEST", "5y", ymd(2024, 6, 12), &settings(50.0), &mut rng).await;
        assert!(matches!(r, Err(WheelError::NoExpirationFound(d)) if d == ymd(2024, 7, 1)), "got {r:?}");
    }
}
