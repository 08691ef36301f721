//! Normalisation of loosely-typed date and time values.
//!
//! Plant data arrives as a mix of typed values and text in a handful of fixed
//! formats. The lenient functions here hand the input back untouched when it
//! cannot be converted, which legacy callers depend on. New call sites should
//! prefer the strict `parse_*` functions and the `into_*` methods on
//! [`TemporalValue`], which report [`Error::MalformedInput`].

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// `YYYY-MM-DD`
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// `h:mm AM/PM`
pub const MERIDIEM_TIME_FORMAT: &str = "%I:%M %p";
/// `HH:MM:SS`
pub const CLOCK_TIME_FORMAT: &str = "%H:%M:%S";
/// `YYYY-MM-DD HH:MM:SS`
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── TemporalValue ───────────────────────────────────────────────────────────

/// A value that is either already canonical or still raw text.
///
/// Deserialises untagged, so a JSON string in ISO 8601 form lands in a typed
/// variant and anything else is kept as [`TemporalValue::Text`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemporalValue {
  DateTime(NaiveDateTime),
  Date(NaiveDate),
  Time(NaiveTime),
  Text(String),
}

impl TemporalValue {
  /// Strict conversion to a calendar date.
  pub fn into_date(self) -> Result<NaiveDate> {
    match date_from_value(self) {
      Self::Date(d) => Ok(d),
      other => Err(other.malformed()),
    }
  }

  /// Strict conversion to a clock time. Date-times are truncated.
  pub fn into_time(self) -> Result<NaiveTime> {
    match time_from_value(self) {
      Self::Time(t) => Ok(t),
      other => Err(other.malformed()),
    }
  }

  /// Strict conversion to a date-time.
  pub fn into_datetime(self) -> Result<NaiveDateTime> {
    match datetime_from_value(self) {
      Self::DateTime(dt) => Ok(dt),
      other => Err(other.malformed()),
    }
  }

  fn malformed(&self) -> Error {
    let shown = match self {
      Self::Text(s) => s.clone(),
      Self::Date(d) => d.to_string(),
      Self::Time(t) => t.to_string(),
      Self::DateTime(dt) => dt.to_string(),
    };
    Error::MalformedInput(shown)
  }
}

impl From<&str> for TemporalValue {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<String> for TemporalValue {
  fn from(s: String) -> Self { Self::Text(s) }
}

impl From<NaiveDate> for TemporalValue {
  fn from(d: NaiveDate) -> Self { Self::Date(d) }
}

impl From<NaiveTime> for TemporalValue {
  fn from(t: NaiveTime) -> Self { Self::Time(t) }
}

impl From<NaiveDateTime> for TemporalValue {
  fn from(dt: NaiveDateTime) -> Self { Self::DateTime(dt) }
}

// ─── Strict parsers ──────────────────────────────────────────────────────────

pub fn parse_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
    .map_err(|_| Error::MalformedInput(s.to_owned()))
}

/// Parses `h:mm AM/PM` (any meridiem case), falling back to `HH:MM:SS`.
pub fn parse_time(s: &str) -> Result<NaiveTime> {
  let trimmed = s.trim();
  NaiveTime::parse_from_str(&trimmed.to_ascii_uppercase(), MERIDIEM_TIME_FORMAT)
    .or_else(|_| NaiveTime::parse_from_str(trimmed, CLOCK_TIME_FORMAT))
    .map_err(|_| Error::MalformedInput(s.to_owned()))
}

pub fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s.trim(), DATETIME_FORMAT)
    .map_err(|_| Error::MalformedInput(s.to_owned()))
}

// ─── Lenient converters ──────────────────────────────────────────────────────

/// Date-times are truncated to their date; text is parsed as `YYYY-MM-DD`.
/// Anything that cannot be converted is returned unchanged.
pub fn date_from_value(value: TemporalValue) -> TemporalValue {
  match value {
    TemporalValue::DateTime(dt) => TemporalValue::Date(dt.date()),
    TemporalValue::Text(s) => match parse_date(&s) {
      Ok(d) => TemporalValue::Date(d),
      Err(_) => TemporalValue::Text(s),
    },
    other => other,
  }
}

/// Date-times are truncated to their time; text is parsed with
/// [`parse_time`]. Anything that cannot be converted is returned unchanged.
pub fn time_from_value(value: TemporalValue) -> TemporalValue {
  match value {
    TemporalValue::DateTime(dt) => TemporalValue::Time(dt.time()),
    TemporalValue::Text(s) => match parse_time(&s) {
      Ok(t) => TemporalValue::Time(t),
      Err(_) => TemporalValue::Text(s),
    },
    other => other,
  }
}

/// Text is parsed as `YYYY-MM-DD HH:MM:SS`. Anything that cannot be converted
/// is returned unchanged.
pub fn datetime_from_value(value: TemporalValue) -> TemporalValue {
  match value {
    TemporalValue::Text(s) => match parse_datetime(&s) {
      Ok(dt) => TemporalValue::DateTime(dt),
      Err(_) => TemporalValue::Text(s),
    },
    other => other,
  }
}

/// Combine a clock time with `date` (today when `None`). Non-time input is
/// returned unchanged.
pub fn datetime_from_time(
  value: TemporalValue,
  date: Option<NaiveDate>,
) -> TemporalValue {
  match value {
    TemporalValue::Time(t) => {
      let date = date.unwrap_or_else(today);
      TemporalValue::DateTime(date.and_time(t))
    }
    other => other,
  }
}

/// Today's date on the plant clock.
pub fn today() -> NaiveDate { Local::now().date_naive() }

/// The current instant on the plant clock.
pub fn now() -> NaiveDateTime { Local::now().naive_local() }

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap()
  }

  #[test]
  fn date_from_text() {
    assert_eq!(
      date_from_value("2024-01-10".into()),
      TemporalValue::Date(date(2024, 1, 10))
    );
  }

  #[test]
  fn date_from_datetime_truncates() {
    let dt = date(2024, 1, 10).and_time(hms(23, 59, 0));
    assert_eq!(date_from_value(dt.into()), TemporalValue::Date(date(2024, 1, 10)));
  }

  #[test]
  fn date_passes_through_garbage_and_canonical_values() {
    assert_eq!(date_from_value("01/10/2024".into()), "01/10/2024".into());
    let d = TemporalValue::Date(date(2024, 1, 10));
    assert_eq!(date_from_value(d.clone()), d);
    let t = TemporalValue::Time(hms(7, 0, 0));
    assert_eq!(date_from_value(t.clone()), t);
  }

  #[test]
  fn time_accepts_meridiem_in_either_case() {
    assert_eq!(time_from_value("7:15 AM".into()), TemporalValue::Time(hms(7, 15, 0)));
    assert_eq!(time_from_value("11:30 pm".into()), TemporalValue::Time(hms(23, 30, 0)));
    assert_eq!(time_from_value("12:00 AM".into()), TemporalValue::Time(hms(0, 0, 0)));
  }

  #[test]
  fn time_falls_back_to_clock_format() {
    assert_eq!(time_from_value("21:05:30".into()), TemporalValue::Time(hms(21, 5, 30)));
  }

  #[test]
  fn time_from_datetime_truncates() {
    let dt = date(2024, 1, 10).and_time(hms(9, 15, 0));
    assert_eq!(time_from_value(dt.into()), TemporalValue::Time(hms(9, 15, 0)));
  }

  #[test]
  fn time_passes_through_garbage() {
    assert_eq!(time_from_value("quarter past".into()), "quarter past".into());
  }

  #[test]
  fn datetime_from_text_and_passthrough() {
    assert_eq!(
      datetime_from_value("2024-01-10 02:00:00".into()),
      TemporalValue::DateTime(date(2024, 1, 10).and_time(hms(2, 0, 0)))
    );
    assert_eq!(datetime_from_value("2024-01-10".into()), "2024-01-10".into());
  }

  #[test]
  fn datetime_from_time_uses_given_date() {
    let out = datetime_from_time(hms(8, 0, 0).into(), Some(date(2024, 1, 10)));
    assert_eq!(out, TemporalValue::DateTime(date(2024, 1, 10).and_time(hms(8, 0, 0))));
  }

  #[test]
  fn datetime_from_time_defaults_to_today() {
    match datetime_from_time(hms(8, 0, 0).into(), None) {
      TemporalValue::DateTime(dt) => assert_eq!(dt.time(), hms(8, 0, 0)),
      other => panic!("expected a date-time, got {other:?}"),
    }
  }

  #[test]
  fn datetime_from_time_passes_through_non_time() {
    let d = TemporalValue::Date(date(2024, 1, 10));
    assert_eq!(datetime_from_time(d.clone(), None), d);
  }

  #[test]
  fn strict_variants_fail_loudly() {
    assert!(matches!(parse_date("yesterday"), Err(Error::MalformedInput(_))));
    assert!(matches!(parse_time("25:00 AM"), Err(Error::MalformedInput(_))));
    assert!(matches!(
      TemporalValue::from("nope").into_datetime(),
      Err(Error::MalformedInput(s)) if s == "nope"
    ));
    assert_eq!(TemporalValue::from("2024-01-10").into_date().unwrap(), date(2024, 1, 10));
  }

  #[test]
  fn untagged_deserialisation_prefers_typed_variants() {
    let v: TemporalValue = serde_json::from_str("\"2024-01-10\"").unwrap();
    assert_eq!(v, TemporalValue::Date(date(2024, 1, 10)));
    let v: TemporalValue = serde_json::from_str("\"7:00 AM\"").unwrap();
    assert_eq!(v, TemporalValue::Text("7:00 AM".into()));
  }
}
