pub mod tolerance;

pub use tolerance::{call_quantile, put_quantile, target_prices, QuantilePair, RiskTolerance, TargetPrices};
