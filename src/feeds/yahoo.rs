use super::MarketData;
use crate::chain::{ChainSide, OptionChain, OptionQuote};
use crate::errors::{WheelError, WheelResult};
use crate::types::{PricePoint, PriceSeries};
use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::Client;
use serde::Deserialize;

/// Yahoo Finance JSON client. All methods return Result, never panic.
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .pool_max_idle_per_host(4)
                .user_agent("wheel_engine/0.1")
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn public_get<T: serde::de::DeserializeOwned>(&self, path: &str) -> WheelResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(WheelError::DataSource {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<T>().await.map_err(|e| WheelError::Parse(format!("GET {path}: {e}")))
    }

    async fn options(&self, ticker: &str, expiration: Option<NaiveDate>) -> WheelResult<OptionsResponse> {
        let query = expiration
            .map(|d| format!("?date={}", d.and_time(NaiveTime::MIN).and_utc().timestamp()))
            .unwrap_or_default();
        self.public_get(&format!("/v7/finance/options/{ticker}{query}")).await
    }
}

impl MarketData for YahooClient {
    async fn price_history(&self, ticker: &str, lookback: &str) -> WheelResult<PriceSeries> {
        let resp: ChartResponse = self
            .public_get(&format!("/v8/finance/chart/{ticker}?range={lookback}&interval=1d"))
            .await?;
        let series = parse_chart(ticker, resp)?;
        tracing::info!(ticker, lookback, days = series.len(), "price history fetched");
        Ok(series)
    }

    async fn expirations(&self, ticker: &str) -> WheelResult<Vec<NaiveDate>> {
        let resp = self.options(ticker, None).await?;
        parse_expirations(ticker, &resp)
    }

    async fn option_chain(&self, ticker: &str, expiration: NaiveDate) -> WheelResult<OptionChain> {
        let resp = self.options(ticker, Some(expiration)).await?;
        let chain = parse_chain(ticker, expiration, &resp)?;
        tracing::info!(
            ticker,
            %expiration,
            calls = chain.calls.len(),
            puts = chain.puts.len(),
            "option chain fetched"
        );
        Ok(chain)
    }
}

// ── Response shapes ──

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartEnvelope {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    pub timestamp: Option<Vec<i64>>,
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteIndicator>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteIndicator {
    pub close: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsResponse {
    pub option_chain: OptionsEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionsEnvelope {
    pub result: Option<Vec<OptionsResult>>,
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsResult {
    #[serde(default)]
    pub expiration_dates: Vec<i64>,
    #[serde(default)]
    pub options: Vec<OptionSet>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSet {
    pub expiration_date: Option<i64>,
    #[serde(default)]
    pub calls: Vec<Contract>,
    #[serde(default)]
    pub puts: Vec<Contract>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub strike: f64,
    pub last_price: Option<f64>,
}

// ── Parsing (pure) ──

fn unix_date(ts: i64) -> WheelResult<NaiveDate> {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| WheelError::Parse(format!("invalid timestamp {ts}")))
}

/// Daily closes from a chart response. Null closes (halted days) are
/// skipped; a trailing intraday bar on the same date replaces the close.
pub fn parse_chart(ticker: &str, resp: ChartResponse) -> WheelResult<PriceSeries> {
    if let Some(err) = resp.chart.error.filter(|e| !e.is_null()) {
        return Err(WheelError::DataSource { status: 200, body: err.to_string() });
    }

    let result = resp
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| WheelError::NoData(ticker.to_string()))?;

    let timestamps = result.timestamp.unwrap_or_default();
    if timestamps.is_empty() {
        return Err(WheelError::NoData(ticker.to_string()));
    }

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .and_then(|q| q.close)
        .ok_or_else(|| WheelError::NoCloseField(ticker.to_string()))?;

    let mut points: Vec<PricePoint> = Vec::with_capacity(timestamps.len());
    for (ts, close) in timestamps.iter().zip(closes) {
        let Some(close) = close.filter(|c| c.is_finite() && *c > 0.0) else {
            continue;
        };
        let date = unix_date(*ts)?;
        match points.last_mut() {
            Some(last) if last.date == date => last.close = close,
            _ => points.push(PricePoint { date, close }),
        }
    }

    if points.is_empty() {
        return Err(WheelError::NoData(ticker.to_string()));
    }

    PriceSeries::new(points)
}

pub fn parse_expirations(ticker: &str, resp: &OptionsResponse) -> WheelResult<Vec<NaiveDate>> {
    let result = first_options_result(ticker, resp)?;
    result.expiration_dates.iter().map(|&ts| unix_date(ts)).collect()
}

pub fn parse_chain(ticker: &str, expiration: NaiveDate, resp: &OptionsResponse) -> WheelResult<OptionChain> {
    let result = first_options_result(ticker, resp)?;
    let set = result
        .options
        .first()
        .ok_or_else(|| WheelError::NoData(format!("{ticker} options for {expiration}")))?;

    let to_quotes = |contracts: &[Contract]| {
        contracts
            .iter()
            .map(|c| OptionQuote {
                strike: c.strike,
                last_price: c.last_price,
            })
            .collect::<Vec<_>>()
    };

    Ok(OptionChain {
        expiration,
        calls: ChainSide::new(to_quotes(&set.calls))?,
        puts: ChainSide::new(to_quotes(&set.puts))?,
    })
}

fn first_options_result<'a>(ticker: &str, resp: &'a OptionsResponse) -> WheelResult<&'a OptionsResult> {
    if let Some(err) = resp.option_chain.error.as_ref().filter(|e| !e.is_null()) {
        return Err(WheelError::DataSource { status: 200, body: err.to_string() });
    }
    resp.option_chain
        .result
        .as_ref()
        .and_then(|r| r.first())
        .ok_or_else(|| WheelError::NoData(ticker.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::ymd;

    // 2024-05-13, 2024-05-14, 2024-05-15 (13:30 UTC open), then a live bar on 05-15
    const CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "NVDA", "currency": "USD"},
                "timestamp": [1715607000, 1715693400, 1715779800, 1715794200],
                "indicators": {
                    "quote": [{"close": [903.99, null, 946.30, 947.10], "open": [1, 2, 3, 4]}],
                    "adjclose": [{"adjclose": [903.9, 913.5, 946.2, 947.0]}]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_chart_skips_nulls_and_merges_same_day() {
        let resp: ChartResponse = serde_json::from_str(CHART).unwrap();
        let series = parse_chart("NVDA", resp).unwrap();
        assert_eq!(series.len(), 2, "null close dropped, same-day bar merged");
        assert_eq!(series.points()[0].date, ymd(2024, 5, 13));
        assert_eq!(series.points()[1].date, ymd(2024, 5, 15));
        assert_eq!(series.last_price(), Some(947.10));
    }

    #[test]
    fn test_parse_chart_without_close_field() {
        let json = r#"{"chart":{"result":[{"timestamp":[1715607000],"indicators":{"quote":[{"open":[1.0]}]}}],"error":null}}"#;
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(parse_chart("XYZ", resp), Err(WheelError::NoCloseField(_))));
    }

    #[test]
    fn test_parse_chart_empty_result() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(parse_chart("XYZ", resp), Err(WheelError::DataSource { .. })));

        let json = r#"{"chart":{"result":[],"error":null}}"#;
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(parse_chart("XYZ", resp), Err(WheelError::NoData(_))));
    }

    const OPTIONS: &str = r#"{
        "optionChain": {
            "result": [{
                "underlyingSymbol": "NVDA",
                "expirationDates": [1716508800, 1717718400, 1718928000],
                "strikes": [900.0, 950.0, 1000.0],
                "options": [{
                    "expirationDate": 1718928000,
                    "calls": [
                        {"contractSymbol": "NVDA240621C00950000", "strike": 950.0, "lastPrice": 41.5, "volume": 120},
                        {"contractSymbol": "NVDA240621C01000000", "strike": 1000.0, "lastPrice": 22.1}
                    ],
                    "puts": [
                        {"contractSymbol": "NVDA240621P00900000", "strike": 900.0, "lastPrice": 18.75},
                        {"contractSymbol": "NVDA240621P00850000", "strike": 850.0}
                    ]
                }]
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_expirations() {
        let resp: OptionsResponse = serde_json::from_str(OPTIONS).unwrap();
        let dates = parse_expirations("NVDA", &resp).unwrap();
        assert_eq!(dates, vec![ymd(2024, 5, 24), ymd(2024, 6, 7), ymd(2024, 6, 21)]);
    }

    #[test]
    fn test_parse_chain() {
        let resp: OptionsResponse = serde_json::from_str(OPTIONS).unwrap();
        let chain = parse_chain("NVDA", ymd(2024, 6, 21), &resp).unwrap();
        assert_eq!(chain.calls.len(), 2);
        assert_eq!(chain.puts.strikes().collect::<Vec<_>>(), vec![850.0, 900.0]);
        assert_eq!(chain.puts.quote_at(850.0).map(|q| q.last_price), Some(None), "unquoted put keeps None");
        assert_eq!(chain.calls.quote_at(950.0).and_then(|q| q.last_price), Some(41.5));
    }
}
