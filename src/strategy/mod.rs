pub mod evaluate;
pub mod metrics;

pub use evaluate::{evaluate, evaluate_ticker, EvaluationReport, EvaluationSettings};
pub use metrics::{compute_metrics, StrategyMetrics, CONTRACT_MULTIPLIER};
