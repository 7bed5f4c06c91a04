use crate::error::{LedgerError, Result};
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime};

pub fn first_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        LedgerError::DateError(format!("Invalid calendar month {:04}-{:02}", year, month))
    })
}

pub fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    first_day_of_month(year, month)?
        .checked_add_months(Months::new(1))
        .and_then(|next| next.checked_sub_days(Days::new(1)))
        .ok_or_else(|| {
            LedgerError::DateError(format!(
                "Month {:04}-{:02} has no representable end",
                year, month
            ))
        })
}

/// Inclusive `[first, last]` calendar-month window containing `date`.
pub fn month_window(date: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    Ok((
        first_day_of_month(date.year(), date.month())?,
        last_day_of_month(date.year(), date.month())?,
    ))
}

/// First day of the calendar month before the one containing `date`.
pub fn prev_month_start(date: NaiveDate) -> Result<NaiveDate> {
    first_day_of_month(date.year(), date.month())?
        .checked_sub_months(Months::new(1))
        .ok_or_else(|| LedgerError::DateError(format!("No month precedes {}", date)))
}

pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let year_diff = end.year() - start.year();
    let month_diff = end.month() as i32 - start.month() as i32;
    year_diff * 12 + month_diff
}

/// Whole months separating two dates, ignoring which one comes first.
pub fn month_span(a: NaiveDate, b: NaiveDate) -> u32 {
    months_between(a, b).unsigned_abs()
}

pub fn short_date(timestamp: NaiveDateTime, format: &str) -> String {
    timestamp.format(format).to_string()
}

pub fn month_label(date: NaiveDate, format: &str) -> String {
    date.format(format).to_string()
}

/// Parses a loosely formatted request timestamp.
///
/// Accepts `YYYY-MM-DD` (midnight), `YYYY-MM-DDTHH:MM:SS[.f]`, `YYYY-MM-DD HH:MM:SS`
/// and RFC 3339 (converted to UTC). Returns `None` for anything else.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Parses an optional request date. Absent or blank input is `Ok(None)`.
pub fn parse_request_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_timestamp(raw)
            .map(|ts| Some(ts.date()))
            .ok_or_else(|| {
                LedgerError::DateError(format!(
                    "Invalid date '{}'. Expected YYYY-MM-DD or an ISO 8601 timestamp",
                    raw
                ))
            }),
    }
}

/// Parses a comma separated id list. Blank entries are skipped.
pub fn parse_customer_ids(csv: Option<&str>) -> Result<Vec<i64>> {
    csv.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>().map_err(|_| {
                LedgerError::InvalidRequest(format!("Invalid customer id '{}'", part))
            })
        })
        .collect()
}
