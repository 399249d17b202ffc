use super::{ChainSide, OptionChain, StrikeKey};
use crate::errors::{WheelError, WheelResult};
use crate::risk::TargetPrices;
use crate::types::SelectedStrikes;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a target price is turned into a listed strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrikePolicy {
    /// Closest listed strike by absolute distance; ties go to the lower strike.
    /// Tolerates uneven strike spacing.
    #[default]
    Nearest,
    /// Round the target to a multiple of the chain's strike increment (halves
    /// go to the even multiple), then require that exact strike to be listed.
    /// The increment comes from the call side and is shared by both legs.
    IncrementRound,
}

impl FromStr for StrikePolicy {
    type Err = WheelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "increment" | "increment_round" => Ok(Self::IncrementRound),
            other => Err(WheelError::Config(format!("unknown strike policy: {other}"))),
        }
    }
}

/// Matched strike and its premium per share.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrikeMatch {
    pub strike: f64,
    pub premium: f64,
}

/// Pick a strike for `target` from one side of the chain and read its premium.
/// Under `IncrementRound` the increment is inferred from `side` itself;
/// [`select_strikes`] uses the call side's increment for both legs instead.
///
/// Fails with `StrikeUnavailable` when the side is empty (or, under
/// `IncrementRound`, the rounded strike is not listed) and with
/// `QuoteMissing` when the chosen strike has no usable last price.
/// A missing quote is never replaced by zero.
pub fn match_strike(side: &ChainSide, target: f64, policy: StrikePolicy) -> WheelResult<StrikeMatch> {
    match_with_increment(side, target, policy, strike_increment(side))
}

fn match_with_increment(
    side: &ChainSide,
    target: f64,
    policy: StrikePolicy,
    increment: Option<i64>,
) -> WheelResult<StrikeMatch> {
    if side.is_empty() {
        return Err(WheelError::StrikeUnavailable("chain side has no strikes".into()));
    }

    let target_key = StrikeKey::from_price(target).ok_or(WheelError::InvalidPrice(target))?;

    let key = match policy {
        StrikePolicy::Nearest => nearest_key(side, target_key, target)
            .ok_or_else(|| WheelError::StrikeUnavailable("chain side has no strikes".into()))?,
        StrikePolicy::IncrementRound => increment_key(side, target, increment)?,
    };

    let quote = side
        .get(key)
        .ok_or_else(|| WheelError::StrikeUnavailable(format!("strike {} not in chain", key.price())))?;

    let strike = quote.strike;
    let premium = match quote.last_price {
        Some(p) if p.is_finite() && p > 0.0 => p,
        _ => return Err(WheelError::QuoteMissing { strike }),
    };

    Ok(StrikeMatch { strike, premium })
}

/// Match both legs: put target against puts, call target against calls.
pub fn select_strikes(
    chain: &OptionChain,
    targets: TargetPrices,
    policy: StrikePolicy,
) -> WheelResult<SelectedStrikes> {
    let increment = strike_increment(&chain.calls);
    let put = match_with_increment(&chain.puts, targets.put_target, policy, increment)?;
    let call = match_with_increment(&chain.calls, targets.call_target, policy, increment)?;

    tracing::debug!(
        put_target = targets.put_target,
        put_strike = put.strike,
        call_target = targets.call_target,
        call_strike = call.strike,
        ?policy,
        "strikes matched"
    );

    Ok(SelectedStrikes {
        put_strike: put.strike,
        put_premium: put.premium,
        call_strike: call.strike,
        call_premium: call.premium,
    })
}

/// Binary search on the key finds the two neighbours; the winner is decided
/// on the unrounded distance `|strike - target|`.
fn nearest_key(side: &ChainSide, target_key: StrikeKey, target: f64) -> Option<StrikeKey> {
    let idx = side.lower_bound(target_key);
    let above = side.key_at(idx);
    let below = idx.checked_sub(1).and_then(|i| side.key_at(i));

    let strike = |k: StrikeKey| side.get(k).map_or(k.price(), |q| q.strike);

    match (below, above) {
        (Some(b), Some(a)) => {
            let db = (target - strike(b)).abs();
            let da = (strike(a) - target).abs();
            // ties go to the lower strike
            Some(if da < db { a } else { b })
        }
        (Some(b), None) => Some(b),
        (None, Some(a)) => Some(a),
        (None, None) => None,
    }
}

/// Spacing between the second and third listed strikes, or the only gap
/// when just two strikes are listed.
fn strike_increment(side: &ChainSide) -> Option<i64> {
    let (first, second) = (side.key_at(1)?, side.key_at(2).or(side.key_at(0))?);
    let inc = (second.raw() - first.raw()).abs();
    (inc > 0).then_some(inc)
}

fn increment_key(side: &ChainSide, target: f64, increment: Option<i64>) -> WheelResult<StrikeKey> {
    let inc = increment.ok_or_else(|| {
        WheelError::StrikeUnavailable("cannot infer strike increment from the listed strikes".into())
    })?;

    let steps = (target / StrikeKey::from_raw(inc).price()).round_ties_even() as i64;
    let key = StrikeKey::from_raw(steps * inc);

    if side.get(key).is_none() {
        return Err(WheelError::StrikeUnavailable(format!(
            "rounded strike {} not in chain",
            key.price()
        )));
    }

    Ok(key)
}
