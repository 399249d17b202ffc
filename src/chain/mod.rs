pub mod expiry;
pub mod matcher;

use crate::errors::{WheelError, WheelResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use expiry::{first_business_day_of_next_month, select_expiration};
pub use matcher::{match_strike, select_strikes, StrikeMatch, StrikePolicy};

/// Strike resolution: 1/10000 of a currency unit.
const STRIKE_SCALE: f64 = 10_000.0;

/// Fixed-precision strike. Chains are indexed by this, never by raw f64,
/// so a computed strike and a quoted one compare exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StrikeKey(i64);

impl StrikeKey {
    #[inline]
    pub fn from_price(price: f64) -> Option<Self> {
        let scaled = (price * STRIKE_SCALE).round();
        if !scaled.is_finite() || scaled.abs() >= i64::MAX as f64 {
            return None;
        }
        Some(Self(scaled as i64))
    }

    #[inline]
    pub fn price(self) -> f64 {
        self.0 as f64 / STRIKE_SCALE
    }

    #[inline]
    pub(crate) fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub(crate) fn from_raw(raw: i64) -> Self {
        Self(raw)
    }
}

/// One listed contract: strike and last traded price.
/// `last_price` is None when the contract has no usable quote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub strike: f64,
    pub last_price: Option<f64>,
}

/// Calls or puts for one expiration, sorted ascending by strike, unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainSide {
    quotes: Vec<(StrikeKey, OptionQuote)>,
}

impl ChainSide {
    pub fn new<I>(quotes: I) -> WheelResult<Self>
    where
        I: IntoIterator<Item = OptionQuote>,
    {
        let mut keyed = Vec::new();
        for q in quotes {
            if !q.strike.is_finite() || q.strike <= 0.0 {
                return Err(WheelError::InvalidChain(format!("strike {} is not positive", q.strike)));
            }
            let key = StrikeKey::from_price(q.strike)
                .ok_or_else(|| WheelError::InvalidChain(format!("strike {} out of range", q.strike)))?;
            keyed.push((key, q));
        }

        keyed.sort_by_key(|(k, _)| *k);

        for w in keyed.windows(2) {
            if w[0].0 == w[1].0 {
                return Err(WheelError::InvalidChain(format!("duplicate strike {}", w[0].1.strike)));
            }
        }

        Ok(Self { quotes: keyed })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn strikes(&self) -> impl Iterator<Item = f64> + '_ {
        self.quotes.iter().map(|(k, _)| k.price())
    }

    #[inline]
    pub(crate) fn key_at(&self, idx: usize) -> Option<StrikeKey> {
        self.quotes.get(idx).map(|(k, _)| *k)
    }

    /// Index of the first strike >= `key`.
    #[inline]
    pub(crate) fn lower_bound(&self, key: StrikeKey) -> usize {
        self.quotes.partition_point(|(k, _)| *k < key)
    }

    pub fn get(&self, key: StrikeKey) -> Option<&OptionQuote> {
        self.quotes
            .binary_search_by_key(&key, |(k, _)| *k)
            .ok()
            .map(|idx| &self.quotes[idx].1)
    }

    pub fn quote_at(&self, strike: f64) -> Option<&OptionQuote> {
        self.get(StrikeKey::from_price(strike)?)
    }
}

/// Both sides of the chain for a single expiration.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionChain {
    pub expiration: NaiveDate,
    pub calls: ChainSide,
    pub puts: ChainSide,
}
