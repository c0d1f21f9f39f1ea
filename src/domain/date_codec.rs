//! Conversion between combined `YYYY-MM` values and split year/month fields.
//!
//! Stored rows may spell the same date as `startYear`/`startMonth`,
//! `start_year`/`start_month`, `startYM` or `start_ym`. Decoding accepts any of
//! them; encoding writes all of them, because the backends in front of the form
//! do not agree on a single convention.

use std::fmt;

use chrono::{Datelike, Utc};
use derive_more::Display;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::entities::education::DateFields;

static YM_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}$").expect("year-month pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum DateCodecError {
    #[display("Expected YYYY-MM, got {_0:?}")]
    Malformed(String),

    #[display("Month must be between 1 and 12, got {_0}")]
    MonthOutOfRange(i32),
}

impl std::error::Error for DateCodecError {}

/// A calendar month. Orders by year, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: i32) -> Result<Self, DateCodecError> {
        if !(1..=12).contains(&month) {
            return Err(DateCodecError::MonthOutOfRange(month));
        }
        Ok(YearMonth { year, month: month as u32 })
    }

    /// Parses a strict `YYYY-MM` value.
    pub fn parse(value: &str) -> Result<Self, DateCodecError> {
        if !is_combined(value) {
            return Err(DateCodecError::Malformed(value.to_string()));
        }
        let (year, month) = value
            .split_once('-')
            .ok_or_else(|| DateCodecError::Malformed(value.to_string()))?;
        let year = year.parse::<i32>().map_err(|_| DateCodecError::Malformed(value.to_string()))?;
        let month = month.parse::<i32>().map_err(|_| DateCodecError::Malformed(value.to_string()))?;
        YearMonth::new(year, month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Whether `value` has the combined `YYYY-MM` shape (month range not checked).
pub fn is_combined(value: &str) -> bool {
    YM_PATTERN.is_match(value)
}

/// Joins a picker selection. An incomplete pick yields an empty value.
pub fn join_year_month(year: Option<i32>, month: Option<u32>) -> String {
    match (year, month) {
        (Some(year), Some(month)) => format!("{:04}-{:02}", year, month),
        _ => String::new(),
    }
}

/// Loose split used on submit: each half is kept only if it reads as an
/// integer, and the month only if it lies in 1..=12.
pub fn split_year_month(value: &str) -> (Option<i32>, Option<u32>) {
    if value.is_empty() {
        return (None, None);
    }
    let mut parts = value.split('-');
    let year = parts.next().and_then(|y| y.trim().parse::<i32>().ok());
    let month = parts
        .next()
        .and_then(|m| m.trim().parse::<u32>().ok())
        .filter(|m| (1..=12).contains(m));
    (year, month)
}

// ───── Decode ───────────────────────────────────────────────────────

/// Form-side view of a stored row's dates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodedDates {
    #[serde(rename = "startYM")]
    pub start_ym: String,
    #[serde(rename = "endYM")]
    pub end_ym: String,
    pub current: bool,
}

fn combined_or_split(
    combined: Option<&str>,
    year: Option<i32>,
    month: Option<i32>,
) -> String {
    if let Some(value) = combined.filter(|v| is_combined(v)) {
        return value.to_string();
    }
    match (year.filter(|y| *y != 0), month.filter(|m| *m != 0)) {
        (Some(year), Some(month)) => format!("{:04}-{:02}", year, month),
        _ => String::new(),
    }
}

/// Reads stored dates. Camel-case keys win over snake-case ones, combined
/// values win over split ones, and a missing end year means the study is
/// still ongoing.
pub fn decode(fields: &DateFields) -> DecodedDates {
    let start_ym = combined_or_split(
        fields.start_ym.as_deref().or(fields.start_ym_snake.as_deref()),
        fields.start_year.or(fields.start_year_snake),
        fields.start_month.or(fields.start_month_snake),
    );

    let end_year = fields.end_year.or(fields.end_year_snake);
    let current = end_year.is_none();
    let end_ym = if current {
        String::new()
    } else {
        combined_or_split(
            fields.end_ym.as_deref().or(fields.end_ym_snake.as_deref()),
            end_year,
            fields.end_month.or(fields.end_month_snake),
        )
    };

    DecodedDates { start_ym, end_ym, current }
}

// ───── Encode ───────────────────────────────────────────────────────

/// Writes start and end under every supported key spelling.
/// `end = None` encodes "currently studying": every end key is null.
pub fn encode(start: YearMonth, end: Option<YearMonth>) -> DateFields {
    let start_year = Some(start.year);
    let start_month = Some(start.month as i32);
    let start_ym = Some(start.to_string());

    let end_year = end.map(|e| e.year);
    let end_month = end.map(|e| e.month as i32);
    let end_ym = end.map(|e| e.to_string());

    DateFields {
        start_year,
        start_month,
        start_ym: start_ym.clone(),
        start_year_snake: start_year,
        start_month_snake: start_month,
        start_ym_snake: start_ym,
        end_year,
        end_month,
        end_ym: end_ym.clone(),
        end_year_snake: end_year,
        end_month_snake: end_month,
        end_ym_snake: end_ym,
    }
}

// ───── Validation ───────────────────────────────────────────────────

pub const END_BEFORE_START: &str = "End date must be after start date.";

/// Live end-before-start check. Only runs when both values are well-formed
/// and the study is not ongoing; anything else reports no conflict.
pub fn date_order_error(start_ym: &str, end_ym: &str, current: bool) -> Option<&'static str> {
    if current {
        return None;
    }
    match (YearMonth::parse(start_ym), YearMonth::parse(end_ym)) {
        (Ok(start), Ok(end)) if end < start => Some(END_BEFORE_START),
        _ => None,
    }
}

/// Selectable year span of the month/year picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub min_year: i32,
    pub max_year: i32,
}

impl DateRange {
    pub fn new(min_year: i32, max_year: i32) -> Self {
        DateRange { min_year, max_year }
    }

    /// `min_year` through the current year plus `years_ahead`.
    pub fn from_now(min_year: i32, years_ahead: i32) -> Self {
        DateRange::new(min_year, Utc::now().year() + years_ahead)
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.min_year..=self.max_year).contains(&year)
    }

    /// Picker year options, newest first.
    pub fn years_desc(&self) -> Vec<i32> {
        (self.min_year..=self.max_year).rev().collect()
    }
}

impl Default for DateRange {
    fn default() -> Self {
        DateRange::from_now(1970, 10)
    }
}

pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Serialize)]
pub struct MonthOption {
    pub num: String,
    pub name: &'static str,
}

pub fn month_options() -> Vec<MonthOption> {
    MONTH_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| MonthOption { num: format!("{:02}", i + 1), name })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_month_in_range() {
        let range = DateRange::default();
        for year in range.min_year..=range.max_year {
            for month in 1..=12 {
                let ym = YearMonth::new(year, month).unwrap();
                let text = ym.to_string();
                assert!(is_combined(&text));
                assert_eq!(YearMonth::parse(&text).unwrap(), ym);
            }
        }
    }

    #[test]
    fn parse_rejects_bad_shapes() {
        assert!(YearMonth::parse("2020-9").is_err());
        assert!(YearMonth::parse("20-09").is_err());
        assert!(YearMonth::parse("2020-13").is_err());
        assert!(YearMonth::parse("2020-00").is_err());
        assert!(YearMonth::parse("").is_err());
    }

    #[test]
    fn decode_prefers_combined_then_split() {
        let fields = DateFields {
            start_ym: Some("2019-01".into()),
            start_year: Some(2018),
            start_month: Some(9),
            end_year_snake: Some(2022),
            end_month_snake: Some(6),
            ..Default::default()
        };
        let decoded = decode(&fields);
        assert_eq!(decoded.start_ym, "2019-01");
        assert_eq!(decoded.end_ym, "2022-06");
        assert!(!decoded.current);
    }

    #[test]
    fn decode_legacy_snake_case_open_ended() {
        let fields = DateFields {
            start_year_snake: Some(2018),
            start_month_snake: Some(9),
            ..Default::default()
        };
        let decoded = decode(&fields);
        assert_eq!(decoded.start_ym, "2018-09");
        assert_eq!(decoded.end_ym, "");
        assert!(decoded.current);
    }

    #[test]
    fn decode_ignores_malformed_combined_value() {
        let fields = DateFields {
            start_ym: Some("Sept 2018".into()),
            start_year: Some(2018),
            start_month: Some(9),
            end_year: Some(2020),
            ..Default::default()
        };
        let decoded = decode(&fields);
        assert_eq!(decoded.start_ym, "2018-09");
        // end year without month cannot be reconstructed
        assert_eq!(decoded.end_ym, "");
        assert!(!decoded.current);
    }

    #[test]
    fn decode_pads_short_years() {
        let fields = DateFields {
            start_year: Some(999),
            start_month: Some(1),
            ..Default::default()
        };
        assert_eq!(decode(&fields).start_ym, "0999-01");
    }

    #[test]
    fn encode_fills_every_spelling() {
        let start = YearMonth::new(2020, 9).unwrap();
        let end = YearMonth::new(2024, 6).unwrap();
        let fields = encode(start, Some(end));

        assert_eq!(fields.start_year, Some(2020));
        assert_eq!(fields.start_month_snake, Some(9));
        assert_eq!(fields.start_ym.as_deref(), Some("2020-09"));
        assert_eq!(fields.start_ym_snake.as_deref(), Some("2020-09"));
        assert_eq!(fields.end_year_snake, Some(2024));
        assert_eq!(fields.end_ym.as_deref(), Some("2024-06"));

        let decoded = decode(&fields);
        assert_eq!(decoded.start_ym, "2020-09");
        assert_eq!(decoded.end_ym, "2024-06");
    }

    #[test]
    fn encode_open_ended_nulls_all_end_keys() {
        let fields = encode(YearMonth::new(2020, 9).unwrap(), None);
        assert_eq!(fields.end_year, None);
        assert_eq!(fields.end_month_snake, None);
        assert_eq!(fields.end_ym_snake, None);
        assert!(decode(&fields).current);
    }

    #[test]
    fn end_before_start_is_flagged() {
        assert_eq!(date_order_error("2020-09", "2019-12", false), Some(END_BEFORE_START));
        assert_eq!(date_order_error("2020-09", "2020-08", false), Some(END_BEFORE_START));
        assert_eq!(date_order_error("2020-09", "2020-09", false), None);
        assert_eq!(date_order_error("2020-09", "2021-01", false), None);
        assert_eq!(date_order_error("2020-09", "2019-12", true), None);
        assert_eq!(date_order_error("2020-09", "", false), None);
    }

    #[test]
    fn split_is_loose() {
        assert_eq!(split_year_month("2020-09"), (Some(2020), Some(9)));
        assert_eq!(split_year_month("2020-13"), (Some(2020), None));
        assert_eq!(split_year_month("2020"), (Some(2020), None));
        assert_eq!(split_year_month(""), (None, None));
    }

    #[test]
    fn picker_options() {
        let range = DateRange::new(2000, 2003);
        assert_eq!(range.years_desc(), vec![2003, 2002, 2001, 2000]);
        assert_eq!(month_options()[8].num, "09");
        assert_eq!(join_year_month(Some(2020), None), "");
        assert_eq!(join_year_month(Some(2020), Some(3)), "2020-03");
    }
}
