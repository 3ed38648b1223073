use super::config;
use super::models::OptionChainPayload;
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Weekly NIFTY contracts expire on Tuesdays
pub const FALLBACK_EXPIRY_WEEKDAY: Weekday = Weekday::Tue;

/// First listed expiry of an option chain payload
pub fn nearest_expiry(payload: &OptionChainPayload) -> Option<String> {
    payload
        .records
        .expiry_dates
        .first()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Next occurrence of `weekday` strictly after `from`
pub fn next_weekday(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let current = from.weekday().num_days_from_monday() as i64;
    let target = weekday.num_days_from_monday() as i64;
    let mut ahead = target - current;
    if ahead <= 0 {
        ahead += 7;
    }
    from + Duration::days(ahead)
}

pub fn format_expiry(date: NaiveDate) -> String {
    date.format(config::EXPIRY_FORMAT).to_string()
}

pub fn parse_expiry(expiry: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(expiry.trim(), config::EXPIRY_FORMAT).ok()
}

/// Nearest expiry from the payload, else the next Tuesday after `today`
pub fn resolve_nearest_expiry(payload: Option<&OptionChainPayload>, today: NaiveDate) -> String {
    payload
        .and_then(nearest_expiry)
        .unwrap_or_else(|| format_expiry(next_weekday(today, FALLBACK_EXPIRY_WEEKDAY)))
}
