//! Calendar filter classification
//!
//! A `Filter` narrows the records request to a year, a month or a single
//! day. The kind of filter is decided by which components are present,
//! strictly in year → month → date order, and each kind maps to a closed
//! calendar range that is sent to the API as `since`/`until` parameters.
//!
//! # Example
//!
//! ```
//! use chrono::FixedOffset;
//! use librpaper::filter::{build_filter_param_in, classify, FilterKind};
//! use librpaper::types::Filter;
//!
//! let filter = Filter::for_month(2017, 2);
//! assert_eq!(classify(&filter), FilterKind::Month);
//!
//! let jst = FixedOffset::east_opt(9 * 3600).unwrap();
//! let params = build_filter_param_in(&filter, &jst).unwrap();
//! assert_eq!(params["since"], "2017-02-01T00:00:00.000+09:00");
//! assert_eq!(params["until"], "2017-02-28T23:59:59.999+09:00");
//! ```

use chrono::{DateTime, Local, Months, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone};
use std::fmt;

use crate::error::FilterError;
use crate::http::QueryParams;
use crate::types::Filter;

/// Which calendar period a filter selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    None,
    Year,
    Month,
    Date,
}

/// Decide the kind of a filter
///
/// A component counts as present only when it is set and non-zero. Month
/// only counts after a year and date only after a month, so
/// `{year, date}` without a month is a plain year filter.
pub fn classify(filter: &Filter) -> FilterKind {
    let has_year = filter.year.is_some_and(|y| y != 0);
    let has_month = filter.month.is_some_and(|m| m != 0);
    let has_date = filter.date.is_some_and(|d| d != 0);

    match (has_year, has_month, has_date) {
        (true, true, true) => FilterKind::Date,
        (true, true, false) => FilterKind::Month,
        (true, false, _) => FilterKind::Year,
        _ => FilterKind::None,
    }
}

/// Closed range covering a calendar period
///
/// `until` is the last millisecond of the period (23:59:59.999 of its last
/// day), not the start of the next one.
#[derive(Debug, Clone)]
pub struct DateRange<Tz: TimeZone> {
    pub since: DateTime<Tz>,
    pub until: DateTime<Tz>,
}

impl<Tz> DateRange<Tz>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    /// Query parameters for the records endpoint
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.insert("since".to_string(), format_boundary(&self.since));
        params.insert("until".to_string(), format_boundary(&self.until));
        params
    }
}

fn format_boundary<Tz>(dt: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    dt.to_rfc3339_opts(SecondsFormat::Millis, false)
}

/// Derive the calendar range of a filter in the given time zone
///
/// Returns `Ok(None)` for `FilterKind::None`.
pub fn date_range_in<Tz: TimeZone>(
    filter: &Filter,
    tz: &Tz,
) -> Result<Option<DateRange<Tz>>, FilterError> {
    let year = filter.year.unwrap_or(0);
    let month = filter.month.unwrap_or(0);
    let date = filter.date.unwrap_or(0);
    let invalid = || FilterError::InvalidDate { year, month, date };

    let (first, last) = match classify(filter) {
        FilterKind::None => return Ok(None),
        FilterKind::Year => (
            NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?,
            NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)?,
        ),
        FilterKind::Month => {
            let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
            let last = first
                .checked_add_months(Months::new(1))
                .and_then(|next| next.pred_opt())
                .ok_or_else(invalid)?;
            (first, last)
        }
        FilterKind::Date => {
            let day = NaiveDate::from_ymd_opt(year, month, date).ok_or_else(invalid)?;
            (day, day)
        }
    };

    let since = start_of_day(first).ok_or_else(invalid)?;
    let until = end_of_day(last).ok_or_else(invalid)?;

    Ok(Some(DateRange {
        since: resolve_local(tz, since, true)?,
        until: resolve_local(tz, until, false)?,
    }))
}

/// Derive the calendar range of a filter in the viewer's local time zone
pub fn date_range(filter: &Filter) -> Result<Option<DateRange<Local>>, FilterError> {
    date_range_in(filter, &Local)
}

/// Build the `since`/`until` query parameters for a filter
///
/// An empty map is returned for an empty filter.
pub fn build_filter_param_in<Tz>(filter: &Filter, tz: &Tz) -> Result<QueryParams, FilterError>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    Ok(date_range_in(filter, tz)?
        .map(|range| range.to_params())
        .unwrap_or_default())
}

/// Build the query parameters for a filter in local time
pub fn build_filter_param(filter: &Filter) -> Result<QueryParams, FilterError> {
    Ok(date_range(filter)?
        .map(|range| range.to_params())
        .unwrap_or_default())
}

fn start_of_day(day: NaiveDate) -> Option<NaiveDateTime> {
    day.and_hms_opt(0, 0, 0)
}

fn end_of_day(day: NaiveDate) -> Option<NaiveDateTime> {
    day.and_hms_milli_opt(23, 59, 59, 999)
}

// Ambiguous wall-clock times (DST fold) widen the range: the earlier
// instant for `since`, the later for `until`.
fn resolve_local<Tz: TimeZone>(
    tz: &Tz,
    naive: NaiveDateTime,
    earliest: bool,
) -> Result<DateTime<Tz>, FilterError> {
    let local = tz.from_local_datetime(&naive);
    let resolved = if earliest { local.earliest() } else { local.latest() };
    resolved.ok_or_else(|| FilterError::NonexistentLocalTime(naive.to_string()))
}
