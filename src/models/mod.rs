pub mod returns;
pub mod volatility;

pub use returns::{quantile, HistogramBin, MonthlyReturn, MonthlyReturnSeries};
pub use volatility::DailyStats;
