use crate::chain::StrikePolicy;
use crate::errors::{WheelError, WheelResult};
use crate::risk::RiskTolerance;
use crate::simulation::{SimulationParams, DEFAULT_PATHS, DEFAULT_STEPS};
use crate::strategy::EvaluationSettings;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ticker: String,
    pub lookback: String,
    pub risk_tolerance: RiskTolerance,
    pub strike_policy: StrikePolicy,
    pub simulate: bool,
    pub simulation: SimulationParams,
    pub seed: Option<u64>,
    pub yahoo_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> WheelResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> WheelResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let ticker = var_or("WHEEL_TICKER", "NVDA").trim().to_ascii_uppercase();
        if ticker.is_empty() {
            return Err(WheelError::Config("WHEEL_TICKER: empty".into()));
        }

        let risk_value = var_or("WHEEL_RISK_TOLERANCE", "50")
            .trim()
            .parse::<f64>()
            .map_err(|e| WheelError::Config(format!("WHEEL_RISK_TOLERANCE: {e}")))?;
        let risk_tolerance = RiskTolerance::new(risk_value)
            .map_err(|e| WheelError::Config(format!("WHEEL_RISK_TOLERANCE: {e}")))?;

        let strike_policy = var_or("WHEEL_STRIKE_POLICY", "nearest")
            .parse::<StrikePolicy>()
            .map_err(|e| WheelError::Config(format!("WHEEL_STRIKE_POLICY: {e}")))?;

        let simulate = parse_bool(&var_or("WHEEL_SIMULATE", "true"))
            .ok_or_else(|| WheelError::Config("WHEEL_SIMULATE: expected true/false".into()))?;

        let paths = var_or("WHEEL_SIM_PATHS", &DEFAULT_PATHS.to_string())
            .trim()
            .parse::<usize>()
            .map_err(|e| WheelError::Config(format!("WHEEL_SIM_PATHS: {e}")))?;

        let steps = var_or("WHEEL_SIM_STEPS", &DEFAULT_STEPS.to_string())
            .trim()
            .parse::<usize>()
            .map_err(|e| WheelError::Config(format!("WHEEL_SIM_STEPS: {e}")))?;

        let simulation = SimulationParams {
            paths,
            steps,
            ..SimulationParams::default()
        };
        simulation
            .validate()
            .map_err(|e| WheelError::Config(format!("WHEEL_SIM_PATHS: {e}")))?;

        let seed = match lookup("WHEEL_SIM_SEED").filter(|s| !s.trim().is_empty()) {
            Some(s) => Some(
                s.trim()
                    .parse::<u64>()
                    .map_err(|e| WheelError::Config(format!("WHEEL_SIM_SEED: {e}")))?,
            ),
            None => None,
        };

        Ok(Self {
            ticker,
            lookback: var_or("WHEEL_LOOKBACK", "5y"),
            risk_tolerance,
            strike_policy,
            simulate,
            simulation,
            seed,
            yahoo_base_url: var_or("YAHOO_BASE_URL", "https://query2.finance.yahoo.com"),
        })
    }

    pub fn evaluation_settings(&self) -> EvaluationSettings {
        EvaluationSettings {
            risk_tolerance: self.risk_tolerance,
            quantiles: None,
            strike_policy: self.strike_policy,
            simulation: self.simulate.then_some(self.simulation),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
