use crate::errors::{WheelError, WheelResult};
use crate::models::DailyStats;
use crate::types::PriceSeries;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::Serialize;

/// Paths per run
pub const DEFAULT_PATHS: usize = 200;
/// Steps per path (about one trading month)
pub const DEFAULT_STEPS: usize = 21;
/// One trading day per step
pub const DEFAULT_DT: f64 = 1.0;

/// Simulation shape. Stack-allocated, Copy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationParams {
    pub paths: usize,
    pub steps: usize,
    pub dt: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            paths: DEFAULT_PATHS,
            steps: DEFAULT_STEPS,
            dt: DEFAULT_DT,
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> WheelResult<()> {
        if self.paths == 0 {
            return Err(WheelError::InvalidSimulation("path count must be at least 1".into()));
        }
        if !self.dt.is_finite() || self.dt < 0.0 {
            return Err(WheelError::InvalidSimulation(format!("dt must be finite and >= 0, got {}", self.dt)));
        }
        Ok(())
    }
}

/// Where a path ends relative to the two strikes at expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Terminal price below the put strike
    Assigned,
    /// Terminal price above the call strike
    CalledAway,
    /// Anywhere in [put_strike, call_strike]
    Kept,
}

impl Outcome {
    /// Strict inequalities on both sides; equality is Kept.
    #[inline]
    pub fn classify(terminal: f64, put_strike: f64, call_strike: f64) -> Self {
        if terminal < put_strike {
            Self::Assigned
        } else if terminal > call_strike {
            Self::CalledAway
        } else {
            Self::Kept
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct OutcomeCounts {
    pub assigned: usize,
    pub called_away: usize,
    pub kept: usize,
}

impl OutcomeCounts {
    #[inline]
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Assigned => self.assigned += 1,
            Outcome::CalledAway => self.called_away += 1,
            Outcome::Kept => self.kept += 1,
        }
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.assigned + self.called_away + self.kept
    }
}

/// One simulation run. Probabilities are percentages of `paths`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub params: SimulationParams,
    pub stats: DailyStats,
    pub counts: OutcomeCounts,
    pub prob_assigned: f64,
    pub prob_called_away: f64,
    pub prob_kept: f64,
    /// Outcome of each path, same order as `paths`
    pub outcomes: Vec<Outcome>,
    /// One row per path, `steps + 1` prices each, starting at the last price
    #[serde(skip)]
    pub paths: Vec<Vec<f64>>,
}

impl SimulationResult {
    pub fn terminal_prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.paths.iter().filter_map(|p| p.last().copied())
    }
}

/// Additive-shock geometric random walk:
///
///   price[0] = last_price
///   price[t] = price[t-1] * (1 + mu + sigma * z_t * sqrt(dt)),  z_t ~ N(0, 1)
///
/// This is not the log-normal form and prices are not floored. Every path
/// draws its shocks from the injected generator in order, so a seeded
/// generator reproduces the whole matrix.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonteCarloSimulator {
    params: SimulationParams,
}

impl MonteCarloSimulator {
    pub fn new(params: SimulationParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> SimulationParams {
        self.params
    }

    /// Estimate daily drift/volatility from `history`, then simulate.
    pub fn run_from_history<R: Rng + ?Sized>(
        &self,
        history: &PriceSeries,
        last_price: f64,
        put_strike: f64,
        call_strike: f64,
        rng: &mut R,
    ) -> WheelResult<SimulationResult> {
        let stats = DailyStats::estimate(history)?;
        self.run(stats, last_price, put_strike, call_strike, rng)
    }

    pub fn run<R: Rng + ?Sized>(
        &self,
        stats: DailyStats,
        last_price: f64,
        put_strike: f64,
        call_strike: f64,
        rng: &mut R,
    ) -> WheelResult<SimulationResult> {
        self.params.validate()?;
        if !last_price.is_finite() || last_price <= 0.0 {
            return Err(WheelError::InvalidPrice(last_price));
        }
        if !stats.drift.is_finite() || !stats.volatility.is_finite() {
            return Err(WheelError::InsufficientData("daily drift/volatility not finite".into()));
        }

        let SimulationParams { paths: n, steps, dt } = self.params;
        let shock_scale = stats.volatility * dt.sqrt();

        let mut paths = Vec::with_capacity(n);
        let mut outcomes = Vec::with_capacity(n);
        let mut counts = OutcomeCounts::default();

        for _ in 0..n {
            let path = simulate_path(last_price, stats.drift, shock_scale, steps, rng);
            let terminal = path.last().copied().unwrap_or(last_price);
            let outcome = Outcome::classify(terminal, put_strike, call_strike);
            counts.record(outcome);
            outcomes.push(outcome);
            paths.push(path);
        }

        let pct = |c: usize| c as f64 / n as f64 * 100.0;
        let result = SimulationResult {
            params: self.params,
            stats,
            counts,
            prob_assigned: pct(counts.assigned),
            prob_called_away: pct(counts.called_away),
            prob_kept: pct(counts.kept),
            outcomes,
            paths,
        };

        tracing::info!(
            paths = n,
            steps,
            drift = stats.drift,
            volatility = stats.volatility,
            annualized_vol = stats.annualized_vol(),
            prob_assigned = result.prob_assigned,
            prob_called_away = result.prob_called_away,
            prob_kept = result.prob_kept,
            "monte carlo complete"
        );

        Ok(result)
    }
}

#[inline]
fn simulate_path<R: Rng + ?Sized>(
    start: f64,
    drift: f64,
    shock_scale: f64,
    steps: usize,
    rng: &mut R,
) -> Vec<f64> {
    let mut path = Vec::with_capacity(steps + 1);
    let mut price = start;
    path.push(price);

    for _ in 0..steps {
        let z: f64 = StandardNormal.sample(rng);
        price *= 1.0 + drift + shock_scale * z;
        path.push(price);
    }

    path
}
