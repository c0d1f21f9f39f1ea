use std::{borrow::Cow, fmt, str::FromStr};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

use crate::constants::{
    MAX_DEGREE_LENGTH, MAX_DESCRIPTION_LENGTH, MAX_DETAILS_LENGTH, MAX_FIELD_LENGTH,
    MAX_THESIS_LENGTH,
};

// ───── Identifiers ──────────────────────────────────────────────────

/// Record identifier. The remote API hands out strings, older rows and
/// hand-edited caches may carry numbers; both compare by their text form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl RecordId {
    pub fn matches(&self, other: &RecordId) -> bool {
        self.to_string() == other.to_string()
    }
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl Eq for RecordId {}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{n}"),
            RecordId::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        RecordId::Text(value)
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Number(value)
    }
}

// ───── Education level taxonomy ─────────────────────────────────────

/// Level taxonomy. Labels outside it are kept verbatim as `Custom` so a
/// round trip through the form never rewrites them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EducationLevel {
    PrimarySchool,
    SecondarySchool,
    HighSchool,
    DiplomaCertificate,
    Bachelor,
    Master,
    MPhil,
    PhD,
    Other,
    Custom(String),
}

impl EducationLevel {
    pub const ALL: [EducationLevel; 9] = [
        EducationLevel::PrimarySchool,
        EducationLevel::SecondarySchool,
        EducationLevel::HighSchool,
        EducationLevel::DiplomaCertificate,
        EducationLevel::Bachelor,
        EducationLevel::Master,
        EducationLevel::MPhil,
        EducationLevel::PhD,
        EducationLevel::Other,
    ];

    pub fn label(&self) -> &str {
        match self {
            EducationLevel::PrimarySchool => "Primary School",
            EducationLevel::SecondarySchool => "Secondary School",
            EducationLevel::HighSchool => "High School",
            EducationLevel::DiplomaCertificate => "Diploma/Certificate",
            EducationLevel::Bachelor => "Bachelor",
            EducationLevel::Master => "Master",
            EducationLevel::MPhil => "MPhil",
            EducationLevel::PhD => "PhD",
            EducationLevel::Other => "Other",
            EducationLevel::Custom(label) => label,
        }
    }

    /// Known label (case-insensitive) or the text as given.
    pub fn from_label(label: &str) -> Self {
        label
            .parse()
            .unwrap_or_else(|_| EducationLevel::Custom(label.to_string()))
    }
}

impl fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EducationLevel {
    type Err = String;

    /// Accepts taxonomy labels only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EducationLevel::ALL
            .iter()
            .find(|level| level.label().eq_ignore_ascii_case(s.trim()))
            .cloned()
            .ok_or_else(|| format!("Unknown education level: {}", s))
    }
}

impl From<String> for EducationLevel {
    fn from(label: String) -> Self {
        EducationLevel::from_label(&label)
    }
}

impl From<EducationLevel> for String {
    fn from(level: EducationLevel) -> Self {
        match level {
            EducationLevel::Custom(label) => label,
            known => known.label().to_string(),
        }
    }
}

// ───── Stored date fields ───────────────────────────────────────────

/// Every spelling the backends have used for the start/end dates.
///
/// Reading goes through `date_codec::decode`, writing through
/// `date_codec::encode`, which fills all of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateFields {
    #[serde(rename = "startYear", default, deserialize_with = "loose_int")]
    pub start_year: Option<i32>,
    #[serde(rename = "startMonth", default, deserialize_with = "loose_int")]
    pub start_month: Option<i32>,
    #[serde(rename = "startYM", default, deserialize_with = "loose_string")]
    pub start_ym: Option<String>,
    #[serde(rename = "start_year", default, deserialize_with = "loose_int")]
    pub start_year_snake: Option<i32>,
    #[serde(rename = "start_month", default, deserialize_with = "loose_int")]
    pub start_month_snake: Option<i32>,
    #[serde(rename = "start_ym", default, deserialize_with = "loose_string")]
    pub start_ym_snake: Option<String>,

    #[serde(rename = "endYear", default, deserialize_with = "loose_int")]
    pub end_year: Option<i32>,
    #[serde(rename = "endMonth", default, deserialize_with = "loose_int")]
    pub end_month: Option<i32>,
    #[serde(rename = "endYM", default, deserialize_with = "loose_string")]
    pub end_ym: Option<String>,
    #[serde(rename = "end_year", default, deserialize_with = "loose_int")]
    pub end_year_snake: Option<i32>,
    #[serde(rename = "end_month", default, deserialize_with = "loose_int")]
    pub end_month_snake: Option<i32>,
    #[serde(rename = "end_ym", default, deserialize_with = "loose_string")]
    pub end_ym_snake: Option<String>,
}

// ───── Records ──────────────────────────────────────────────────────

/// An education row as handed back by either store.
///
/// Keys this type does not know about are kept in `extra` so a local
/// update never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "loose_string")]
    pub school: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub level: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub degree: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub field: Option<String>,
    #[serde(default, deserialize_with = "loose_float")]
    pub gpa: Option<f64>,
    #[serde(default, deserialize_with = "loose_float", skip_serializing_if = "Option::is_none")]
    pub grade: Option<f64>,
    #[serde(default, deserialize_with = "loose_string")]
    pub thesis: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub details: Option<String>,
    #[serde(default, deserialize_with = "loose_timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "loose_timestamp", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub dates: DateFields,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EducationRecord {
    /// The record a write produced when the server echoes nothing back.
    pub fn from_payload(id: Option<RecordId>, payload: &EducationPayload) -> Result<Self, serde_json::Error> {
        let mut record: EducationRecord = serde_json::from_value(serde_json::to_value(payload)?)?;
        if id.is_some() {
            record.id = id;
        }
        Ok(record)
    }

    pub fn has_id(&self, id: &RecordId) -> bool {
        self.id.as_ref().is_some_and(|own| own.matches(id))
    }

    /// True when any of the optional long-text fields carries content.
    pub fn has_extended_fields(&self) -> bool {
        [&self.thesis, &self.details, &self.description]
            .iter()
            .any(|f| f.as_deref().is_some_and(|s| !s.is_empty()))
    }
}

/// Write body sent to `createEducation` / `updateEducation` and the local cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationPayload {
    pub school: String,
    pub level: Option<EducationLevel>,
    pub degree: Option<String>,
    pub field: Option<String>,
    #[serde(flatten)]
    pub dates: DateFields,
    pub gpa: Option<f64>,
    pub thesis: Option<String>,
    pub description: Option<String>,
    pub details: String,
}

// ───── Form state ───────────────────────────────────────────────────

/// In-progress form state. Dates are combined `YYYY-MM` strings, empty when unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EducationForm {
    #[validate(custom(function = "validate_school"))]
    pub school: String,

    /// Blank means "not chosen"; an unknown label is kept as typed.
    #[serde(deserialize_with = "loose_level")]
    pub level: Option<EducationLevel>,

    #[validate(length(max = MAX_DEGREE_LENGTH, message = "Degree must be at most 120 characters"))]
    pub degree: String,

    #[validate(length(max = MAX_FIELD_LENGTH, message = "Field of study must be at most 120 characters"))]
    pub field: String,

    #[serde(rename = "startYM")]
    pub start_ym: String,

    #[serde(rename = "endYM")]
    pub end_ym: String,

    pub gpa: String,

    #[validate(length(max = MAX_THESIS_LENGTH, message = "Thesis must be at most 200 characters"))]
    pub thesis: String,

    #[validate(length(max = MAX_DESCRIPTION_LENGTH, message = "Description must be at most 200 characters"))]
    pub description: String,

    #[validate(length(max = MAX_DETAILS_LENGTH, message = "Details must be at most 1000 characters"))]
    pub details: String,

    /// "Currently studying": the end date is ignored and stored as null.
    pub current: bool,
}

fn validate_school(school: &str) -> Result<(), ValidationError> {
    if school.trim().is_empty() {
        let mut err = ValidationError::new("school_required");
        err.message = Some(Cow::Borrowed("School is required"));
        return Err(err);
    }
    Ok(())
}

// ───── Lenient deserializers ────────────────────────────────────────
// Backends disagree on whether numbers arrive as numbers or numeric strings.

fn loose_int<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_i32))
}

fn loose_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    })
}

fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// RFC 3339, or a bare `YYYY-MM-DDTHH:MM:SS` read as UTC. Anything else is dropped.
fn loose_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::String(text)) = value else {
        return Ok(None);
    };
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    Ok(["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc()))
}

fn loose_level<'de, D>(deserializer: D) -> Result<Option<EducationLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .filter(|label| !label.trim().is_empty())
        .map(EducationLevel::from))
}

fn value_as_i32(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn timestamps_without_offset_read_as_utc() {
        let record: EducationRecord = serde_json::from_value(json!({
            "id": "r1",
            "createdAt": "2024-01-01T10:00:00",
            "updatedAt": "yesterday"
        }))
        .unwrap();
        assert_eq!(
            record.created_at.map(|t| t.to_rfc3339()),
            Some("2024-01-01T10:00:00+00:00".to_string())
        );
        assert_eq!(record.updated_at, None);

        let zoned: EducationRecord =
            serde_json::from_value(json!({ "createdAt": "2024-01-01T10:00:00+02:00" })).unwrap();
        assert_eq!(zoned.created_at.map(|t| t.to_rfc3339()), Some("2024-01-01T08:00:00+00:00".to_string()));
    }

    #[test]
    fn record_reads_both_spellings_and_keeps_unknown_keys() {
        let record: EducationRecord = serde_json::from_value(json!({
            "id": 7,
            "school": "MIT",
            "start_year": "2018",
            "startMonth": 9,
            "end_year": null,
            "sortOrder": 3
        }))
        .unwrap();

        assert_eq!(record.id, Some(RecordId::Text("7".into())));
        assert_eq!(record.dates.start_year_snake, Some(2018));
        assert_eq!(record.dates.start_month, Some(9));
        assert_eq!(record.dates.end_year_snake, None);
        assert_eq!(record.extra.get("sortOrder"), Some(&json!(3)));
    }

    #[test]
    fn level_parses_labels_case_insensitively() {
        assert_eq!("diploma/certificate".parse::<EducationLevel>(), Ok(EducationLevel::DiplomaCertificate));
        assert_eq!("PhD".parse::<EducationLevel>(), Ok(EducationLevel::PhD));
        assert!("Kindergarten".parse::<EducationLevel>().is_err());
    }

    #[test]
    fn payload_serializes_nulls_for_open_ended_study() {
        let payload = EducationPayload {
            school: "MIT".into(),
            level: Some(EducationLevel::Master),
            degree: None,
            field: None,
            dates: DateFields::default(),
            gpa: None,
            thesis: None,
            description: None,
            details: String::new(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["level"], json!("Master"));
        assert_eq!(value["endYear"], Value::Null);
        assert_eq!(value["end_ym"], Value::Null);
        assert_eq!(value["details"], json!(""));
    }

    #[test]
    fn form_level_accepts_blank_and_unknown_labels() {
        let form: EducationForm = serde_json::from_value(json!({ "school": "MIT", "level": "" })).unwrap();
        assert_eq!(form.level, None);
        let form: EducationForm = serde_json::from_value(json!({ "level": "Apprenticeship" })).unwrap();
        assert_eq!(form.level, Some(EducationLevel::Custom("Apprenticeship".into())));
        assert_eq!(serde_json::to_value(&form).unwrap()["level"], json!("Apprenticeship"));
        let form: EducationForm = serde_json::from_value(json!({ "level": "Master" })).unwrap();
        assert_eq!(form.level, Some(EducationLevel::Master));
    }

    #[test]
    fn form_requires_school_and_caps_lengths() {
        let form = EducationForm {
            school: "   ".into(),
            degree: "x".repeat(121),
            ..Default::default()
        };
        let errors = form.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("school"));
        assert!(fields.contains_key("degree"));
    }
}
