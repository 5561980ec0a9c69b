// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Date and date-time editor state.
//!
//! A date-time control edits a calendar date and an `HH:mm` time of day
//! independently. Every change to either part recomposes one UTC timestamp.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};

/// Time of day used until the user picks one.
pub const DEFAULT_TIME: &str = "12:00";
/// Wire format of date-only values.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a backend or control timestamp as UTC.
///
/// Accepts RFC 3339 (`2024-05-01T10:30:00.000Z`), NocoDB's
/// `2024-05-01 10:30:00+00:00`, and offset-less forms (read as UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Parse a date-only value, or the date part of a timestamp.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .or_else(|| parse_timestamp(value).map(|ts| ts.date_naive()))
}

/// `YYYY-MM-DD` for a picked date.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Split `HH:mm`. A part that does not parse, or is out of range, counts as 0.
fn hours_minutes(time: &str) -> (u32, u32) {
    let mut parts = time.split(':');
    let mut part = |max: u32| {
        parts
            .next()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|v| *v <= max)
            .unwrap_or(0)
    };
    let hours = part(23);
    let minutes = part(59);
    (hours, minutes)
}

/// State of a date-time control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeValue {
    date: Option<NaiveDate>,
    time: String,
}

impl Default for DateTimeValue {
    fn default() -> Self {
        Self {
            date: None,
            time: DEFAULT_TIME.to_string(),
        }
    }
}

impl DateTimeValue {
    /// Seed from a stored value. Unparsable input yields an empty control.
    pub fn parse(value: &str) -> Self {
        match parse_timestamp(value) {
            Some(ts) => Self {
                date: Some(ts.date_naive()),
                time: ts.format("%H:%M").to_string(),
            },
            None => Self::default(),
        }
    }

    /// Selected calendar date.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Time-of-day text as edited.
    pub fn time(&self) -> &str {
        &self.time
    }

    /// Pick a date; returns the recomposed timestamp.
    pub fn select_date(&mut self, date: NaiveDate) -> String {
        self.date = Some(date);
        compose(date, &self.time)
    }

    /// Edit the time of day. Returns the recomposed timestamp, or `None`
    /// while no date has been picked.
    pub fn set_time(&mut self, time: &str) -> Option<String> {
        self.time = time.to_string();
        self.timestamp()
    }

    /// Current timestamp, if a date is picked.
    pub fn timestamp(&self) -> Option<String> {
        self.date.map(|date| compose(date, &self.time))
    }
}

fn compose(date: NaiveDate, time: &str) -> String {
    let (hours, minutes) = hours_minutes(time);
    let time = NaiveTime::from_hms_opt(hours, minutes, 0).unwrap_or(NaiveTime::MIN);
    date.and_time(time)
        .and_utc()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn new_control_defaults_to_noon() {
        let mut value = DateTimeValue::parse("");
        assert_eq!(value.time(), DEFAULT_TIME);
        assert_eq!(value.set_time("09:15"), None);
        assert_eq!(value.select_date(day(2024, 5, 1)), "2024-05-01T09:15:00.000Z");
    }

    #[test]
    fn each_part_recomposes_the_timestamp() {
        let mut value = DateTimeValue::parse("2024-05-01T10:30:00.000Z");
        assert_eq!(value.date(), Some(day(2024, 5, 1)));
        assert_eq!(value.time(), "10:30");
        assert_eq!(
            value.set_time("18:05").as_deref(),
            Some("2024-05-01T18:05:00.000Z")
        );
        assert_eq!(value.select_date(day(2024, 6, 2)), "2024-06-02T18:05:00.000Z");
    }

    #[test]
    fn unparsable_time_parts_fall_back_to_zero() {
        let mut value = DateTimeValue::parse("2024-05-01 08:00:00+00:00");
        assert_eq!(
            value.set_time("xx:45").as_deref(),
            Some("2024-05-01T00:45:00.000Z")
        );
        assert_eq!(
            value.set_time("7").as_deref(),
            Some("2024-05-01T07:00:00.000Z")
        );
    }

    #[test]
    fn dates_accept_plain_and_timestamp_forms() {
        assert_eq!(parse_date("2024-02-29"), Some(day(2024, 2, 29)));
        assert_eq!(parse_date("2024-02-29T23:00:00Z"), Some(day(2024, 2, 29)));
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(format_date(day(2024, 1, 9)), "2024-01-09");
    }

    #[test]
    fn offsets_are_normalised_to_utc() {
        let ts = parse_timestamp("2024-05-01T02:00:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339_opts(SecondsFormat::Secs, true), "2024-05-01T00:00:00Z");
    }
}
