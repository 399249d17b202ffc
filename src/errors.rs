/// Typed failures for one evaluation pass.
/// Every condition is surfaced to the caller. Nothing is defaulted to a
/// sentinel (a zero premium, a zero strike) and nothing is retried here.
#[derive(Debug, thiserror::Error)]
pub enum WheelError {
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("no expiration on or after {0}")]
    NoExpirationFound(chrono::NaiveDate),

    #[error("strike unavailable: {0}")]
    StrikeUnavailable(String),

    #[error("quote missing for strike {strike}")]
    QuoteMissing { strike: f64 },

    #[error("invalid strike: {0}")]
    InvalidStrike(f64),

    #[error("invalid option chain: {0}")]
    InvalidChain(String),

    #[error("invalid price series: {0}")]
    InvalidSeries(String),

    #[error("risk tolerance must be within [0, 100], got {0}")]
    InvalidRiskTolerance(f64),

    #[error("quantile must be a number, got {0}")]
    InvalidQuantile(f64),

    #[error("invalid price: {0}")]
    InvalidPrice(f64),

    #[error("invalid simulation parameters: {0}")]
    InvalidSimulation(String),

    #[error("no data returned for {0}")]
    NoData(String),

    #[error("no close field in price history for {0}")]
    NoCloseField(String),

    #[error("market data API error: {status} {body}")]
    DataSource { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for WheelError {
    fn from(e: reqwest::Error) -> Self {
        WheelError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for WheelError {
    fn from(e: serde_json::Error) -> Self {
        WheelError::Parse(e.to_string())
    }
}

pub type WheelResult<T> = Result<T, WheelError>;
