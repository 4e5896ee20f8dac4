//! Field descriptors and per-kind format checks.
//!
//! Every argument slot of a request schema is described by a [`FieldDescriptor`]:
//! a `required` flag, a `nullable` flag and a [`FieldKind`]. Validation of a single
//! slot always runs the same three steps:
//!
//! 1. absence is checked against `required`,
//! 2. emptiness is checked against `nullable`,
//! 3. the kind-specific format check runs on everything else.
//!
//! Only step 3 differs between kinds, so each kind owns just its format check.
use chrono::{Months, NaiveDate};
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::LazyLock;

/// Dates travel on the wire as `DD.MM.YYYY`.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Oldest accepted age for a birthday, in years.
pub const MAX_AGE_YEARS: u32 = 70;

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}\.\d{2}\.\d{4}$").expect("date pattern compiles"));

/// Closed set of argument kinds understood by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any JSON string.
    Char,
    /// JSON object with arbitrary values.
    Arguments,
    /// String containing `@`.
    Email,
    /// String or integer of 11 digits starting with `7`.
    Phone,
    /// `DD.MM.YYYY` calendar date.
    Date,
    /// Date no more than [`MAX_AGE_YEARS`] years in the past.
    BirthDay,
    /// Integer 0, 1 or 2.
    Gender,
    /// Non-empty list of integers.
    ClientIds,
}

/// Static metadata for one argument slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub kind: FieldKind,
    pub required: bool,
    pub nullable: bool,
}

impl FieldDescriptor {
    pub const fn new(kind: FieldKind, required: bool, nullable: bool) -> Self {
        Self {
            kind,
            required,
            nullable,
        }
    }
}

/// A value that passed its field check, converted to its typed form.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Present but empty (`null`, `""`, `[]` or `{}`) on a nullable field.
    Empty,
    Text(String),
    Arguments(Map<String, Value>),
    Date(NaiveDate),
    Gender(u8),
    ClientIds(Vec<i64>),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }
}

/// One violated constraint, keyed by the field (or schema) that violated it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

impl std::error::Error for FieldError {}

/// Validates one slot.
///
/// Returns `Ok(None)` when an optional field is absent, `Ok(Some(FieldValue::Empty))`
/// when a nullable field carries an empty value and `Ok(Some(value))` otherwise.
/// `today` anchors the birthday age window.
pub fn validate_field(
    name: &str,
    descriptor: &FieldDescriptor,
    raw: Option<&Value>,
    today: NaiveDate,
) -> Result<Option<FieldValue>, FieldError> {
    let Some(value) = raw else {
        if descriptor.required {
            return Err(FieldError::new(name, "field is required"));
        }
        return Ok(None);
    };

    if is_empty_value(descriptor.kind, value) {
        if descriptor.nullable {
            return Ok(Some(FieldValue::Empty));
        }
        return Err(FieldError::new(name, "field cannot be empty"));
    }

    check_format(descriptor.kind, value, today)
        .map(Some)
        .map_err(|reason| FieldError::new(name, reason))
}

/// Emptiness per kind: `null` always, otherwise the kind's own zero value
/// (`""` for string kinds, `{}` for arguments, `[]` for client ids).
/// Numbers are never empty, so gender `0` is a value.
pub fn is_empty_value(kind: FieldKind, value: &Value) -> bool {
    match (kind, value) {
        (_, Value::Null) => true,
        (
            FieldKind::Char
            | FieldKind::Email
            | FieldKind::Phone
            | FieldKind::Date
            | FieldKind::BirthDay,
            Value::String(s),
        ) => s.is_empty(),
        (FieldKind::Arguments, Value::Object(map)) => map.is_empty(),
        (FieldKind::ClientIds, Value::Array(items)) => items.is_empty(),
        _ => false,
    }
}

fn check_format(kind: FieldKind, value: &Value, today: NaiveDate) -> Result<FieldValue, String> {
    match kind {
        FieldKind::Char => check_char(value).map(FieldValue::Text),
        FieldKind::Arguments => check_arguments(value).map(FieldValue::Arguments),
        FieldKind::Email => check_email(value).map(FieldValue::Text),
        FieldKind::Phone => check_phone(value).map(FieldValue::Text),
        FieldKind::Date => check_date(value).map(FieldValue::Date),
        FieldKind::BirthDay => check_birthday(value, today).map(FieldValue::Date),
        FieldKind::Gender => check_gender(value).map(FieldValue::Gender),
        FieldKind::ClientIds => check_client_ids(value).map(FieldValue::ClientIds),
    }
}

fn check_char(value: &Value) -> Result<String, String> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| "must be a string".to_string())
}

fn check_arguments(value: &Value) -> Result<Map<String, Value>, String> {
    value
        .as_object()
        .cloned()
        .ok_or_else(|| "must be an object".to_string())
}

fn check_email(value: &Value) -> Result<String, String> {
    let email = check_char(value)?;
    if !email.contains('@') {
        return Err("must contain '@'".to_string());
    }
    Ok(email)
}

fn check_phone(value: &Value) -> Result<String, String> {
    let phone = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n
            .as_u64()
            .map(|n| n.to_string())
            .ok_or_else(|| "must be a string or a non-negative integer".to_string())?,
        _ => return Err("must be a string or a non-negative integer".to_string()),
    };

    if phone.len() != 11 || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err("must consist of exactly 11 digits".to_string());
    }
    if !phone.starts_with('7') {
        return Err("must start with 7".to_string());
    }
    Ok(phone)
}

fn check_date(value: &Value) -> Result<NaiveDate, String> {
    let raw = value
        .as_str()
        .ok_or_else(|| "must be a date string in DD.MM.YYYY format".to_string())?;
    parse_date(raw).ok_or_else(|| "must be a valid date in DD.MM.YYYY format".to_string())
}

fn check_birthday(value: &Value, today: NaiveDate) -> Result<NaiveDate, String> {
    let date = check_date(value)?;
    if date < earliest_birthday(today) {
        return Err(format!("age must not exceed {} years", MAX_AGE_YEARS));
    }
    Ok(date)
}

fn check_gender(value: &Value) -> Result<u8, String> {
    match value.as_i64() {
        Some(g @ 0..=2) => Ok(g as u8),
        _ => Err("must be one of 0, 1, 2".to_string()),
    }
}

fn check_client_ids(value: &Value) -> Result<Vec<i64>, String> {
    let items = value
        .as_array()
        .ok_or_else(|| "must be a list of integers".to_string())?;
    items
        .iter()
        .map(|item| item.as_i64().ok_or_else(|| "must be a list of integers".to_string()))
        .collect()
}

/// Parses a strict `DD.MM.YYYY` date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if !DATE_RE.is_match(raw) {
        return None;
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

/// First birthday that still falls inside the age window for `today`.
pub fn earliest_birthday(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_months(Months::new(MAX_AGE_YEARS * 12))
        .unwrap_or(NaiveDate::MIN)
}
