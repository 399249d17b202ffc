use crate::errors::{WheelError, WheelResult};
use chrono::{Datelike, NaiveDate, Weekday};

/// First weekday of the calendar month after `today`.
/// Exchange holidays are not modelled.
pub fn first_business_day_of_next_month(today: NaiveDate) -> Option<NaiveDate> {
    let (y, m) = if today.month() == 12 {
        (today.year() + 1, 1)
    } else {
        (today.year(), today.month() + 1)
    };

    let mut day = NaiveDate::from_ymd_opt(y, m, 1)?;
    while matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
        day = day.succ_opt()?;
    }
    Some(day)
}

/// First listed expiration on or after the first business day of next month.
/// `expirations` is scanned in listed order, as the data source returns it.
pub fn select_expiration(expirations: &[NaiveDate], today: NaiveDate) -> WheelResult<NaiveDate> {
    let cutoff = first_business_day_of_next_month(today).ok_or(WheelError::NoExpirationFound(today))?;

    expirations
        .iter()
        .copied()
        .find(|&d| d >= cutoff)
        .ok_or(WheelError::NoExpirationFound(cutoff))
}
