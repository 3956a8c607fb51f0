// Calendar-day expressions

use chrono::{Duration, Local, NaiveDate};
use anyhow::Result;

/// Storage format for task days
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Today in the local timezone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a day expression relative to the local date.
/// Accepts `today`, `yesterday`, `tomorrow` and `YYYY-MM-DD`.
pub fn parse_day_expr(expr: &str) -> Result<NaiveDate> {
    parse_day_expr_from(expr, today())
}

/// Parse a day expression relative to `base`
pub fn parse_day_expr_from(expr: &str, base: NaiveDate) -> Result<NaiveDate> {
    match expr.trim().to_lowercase().as_str() {
        "today" => Ok(base),
        "yesterday" => Ok(base - Duration::days(1)),
        "tomorrow" => Ok(base + Duration::days(1)),
        other => NaiveDate::parse_from_str(other, DAY_FORMAT)
            .map_err(|_| anyhow::anyhow!("Invalid date: '{}'. Use YYYY-MM-DD, today, yesterday or tomorrow.", expr)),
    }
}

/// Render a day for storage and display
pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}
