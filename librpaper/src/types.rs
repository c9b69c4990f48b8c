//! Core data types for rpaper
//!
//! These mirror the JSON documents exchanged with the reservation API.
//! A `Thing` is a bookable resource, a `Record` is one reservation of it.

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http::HttpResponse;

/// Longest time span a single record may cover
pub const TIMESPAN_MAX_HOURS: i64 = 24;

/// Owner of a thing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// A bookable resource (e.g. a room)
///
/// Immutable once fetched; a re-fetch replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thing {
    #[serde(alias = "pk")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub remarks: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub thumbnail: Option<String>,
    pub owner: User,
}

/// A reservation of a thing
///
/// Records are created server-side; the client only ever appends the
/// server-confirmed copy to its list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(alias = "pk")]
    pub id: String,
    pub name: String,
    pub contact: String,
    #[serde(default)]
    pub remarks: String,
    pub start_at: DateTime<FixedOffset>,
    pub end_at: DateTime<FixedOffset>,
    /// Only present on the response to a successful submission
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<Uuid>,
}

impl Record {
    /// Whether the time windows of two records overlap
    ///
    /// Touching windows (one ends exactly when the other starts) do not
    /// collide.
    pub fn is_collided(&self, other: &Record) -> bool {
        !(self.end_at <= other.start_at || other.end_at <= self.start_at)
    }

    /// Human readable time span
    pub fn timespan_display(&self) -> String {
        if self.start_at.date_naive() == self.end_at.date_naive() {
            format!(
                "{} to {}",
                self.start_at.format("%Y-%m-%d %H:%M"),
                self.end_at.format("%H:%M")
            )
        } else {
            format!(
                "{} to {}",
                self.start_at.format("%Y-%m-%d %H:%M"),
                self.end_at.format("%Y-%m-%d %H:%M")
            )
        }
    }
}

/// User input submitted to create a record
///
/// Timestamps are kept as the ISO formatted strings that go on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordForm {
    pub name: String,
    pub contact: String,
    pub remarks: String,
    pub start_at: String,
    pub end_at: String,
}

impl RecordForm {
    /// Check the form against the rules the server enforces
    ///
    /// Returns an empty `RecordError` when the form passes.
    pub fn validate(&self) -> RecordError {
        let mut errors = RecordError::default();

        if self.name.trim().is_empty() {
            errors.name.push(BLANK_MESSAGE.to_string());
        }
        if self.contact.trim().is_empty() {
            errors.contact.push(BLANK_MESSAGE.to_string());
        }

        let start_at = parse_timestamp(&self.start_at, &mut errors.start_at);
        let end_at = parse_timestamp(&self.end_at, &mut errors.end_at);

        if let (Some(start_at), Some(end_at)) = (start_at, end_at) {
            if end_at <= start_at {
                errors
                    .non_field_errors
                    .push("'end_at' must be later than 'start_at'.".to_string());
            } else if end_at - start_at > Duration::hours(TIMESPAN_MAX_HOURS) {
                errors.non_field_errors.push(format!(
                    "The time-span could not be over {} hours.",
                    TIMESPAN_MAX_HOURS
                ));
            }
        }

        errors
    }
}

const BLANK_MESSAGE: &str = "This field may not be blank.";

fn parse_timestamp(value: &str, errors: &mut Vec<String>) -> Option<DateTime<FixedOffset>> {
    if value.trim().is_empty() {
        errors.push(BLANK_MESSAGE.to_string());
        return None;
    }
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Some(dt),
        Err(_) => {
            errors.push(
                "Datetime has wrong format. Use RFC 3339, e.g. 2017-01-01T09:00:00+09:00."
                    .to_string(),
            );
            None
        }
    }
}

/// Per-field validation messages for a `RecordForm`
///
/// An empty list means the field is valid. `non_field_errors` holds
/// messages that concern the record as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordError {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contact: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remarks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub start_at: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub end_at: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_field_errors: Vec<String>,
}

impl RecordError {
    /// An error set holding a single message about the whole submission
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            non_field_errors: vec![message.into()],
            ..Self::default()
        }
    }

    /// Field errors carried by a rejected submission's body
    ///
    /// `None` when the body is not a JSON error mapping or names no known
    /// field.
    pub fn from_response(response: &HttpResponse) -> Option<Self> {
        response
            .json::<RecordError>()
            .ok()
            .filter(|errors| !errors.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.fields().next().is_none()
    }

    /// Fields that carry at least one message, in form order
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &[String])> + '_ {
        [
            ("name", self.name.as_slice()),
            ("contact", self.contact.as_slice()),
            ("remarks", self.remarks.as_slice()),
            ("start_at", self.start_at.as_slice()),
            ("end_at", self.end_at.as_slice()),
            ("non_field_errors", self.non_field_errors.as_slice()),
        ]
        .into_iter()
        .filter(|(_, messages)| !messages.is_empty())
    }
}

/// Calendar scope narrowing which records are fetched
///
/// Components only count when non-zero and in year → month → date order;
/// see `filter::classify`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<u32>,
}

impl Filter {
    pub fn for_year(year: i32) -> Self {
        Self { year: Some(year), ..Self::default() }
    }

    pub fn for_month(year: i32, month: u32) -> Self {
        Self { year: Some(year), month: Some(month), date: None }
    }

    pub fn for_date(year: i32, month: u32, date: u32) -> Self {
        Self { year: Some(year), month: Some(month), date: Some(date) }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
