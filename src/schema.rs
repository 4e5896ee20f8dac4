//! Ordered schemas built from field descriptors plus cross-field rules.
use crate::fields::{validate_field, FieldDescriptor, FieldError, FieldValue};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::fmt;

/// A rule spanning several fields. Runs only after every field passed on its own.
pub type CrossFieldRule = fn(&ValidatedFields) -> Result<(), String>;

/// Every violation found while validating one input, in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub violations: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(violations: Vec<FieldError>) -> Self {
        Self { violations }
    }

    /// Names of the fields (or schemas, for cross-field rules) that failed.
    pub fn fields(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.field.as_str()).collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for violation in &self.violations {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}", violation)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl From<FieldError> for ValidationError {
    fn from(err: FieldError) -> Self {
        Self::new(vec![err])
    }
}

/// Named, ordered collection of field descriptors.
#[derive(Debug, Clone)]
pub struct Schema {
    name: &'static str,
    fields: Vec<(&'static str, FieldDescriptor)>,
    rules: Vec<CrossFieldRule>,
}

impl Schema {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
            rules: Vec::new(),
        }
    }

    /// Declares a field. Declaration order is validation order.
    pub fn field(mut self, name: &'static str, descriptor: FieldDescriptor) -> Self {
        self.fields.push((name, descriptor));
        self
    }

    pub fn rule(mut self, rule: CrossFieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Checks every declared field against `raw`, then the cross-field rules.
    ///
    /// All field failures are collected before returning. Cross-field rules are
    /// skipped when any field failed, since they assume well-typed input.
    pub fn validate(
        &self,
        raw: &Map<String, Value>,
        today: NaiveDate,
    ) -> Result<ValidatedFields, ValidationError> {
        let mut values = Vec::with_capacity(self.fields.len());
        let mut violations = Vec::new();

        for (name, descriptor) in &self.fields {
            match validate_field(name, descriptor, raw.get(*name), today) {
                Ok(value) => values.push((*name, value)),
                Err(err) => violations.push(err),
            }
        }

        if !violations.is_empty() {
            return Err(ValidationError::new(violations));
        }

        let validated = ValidatedFields { values };
        for rule in &self.rules {
            if let Err(reason) = rule(&validated) {
                violations.push(FieldError::new(self.name, reason));
            }
        }

        if violations.is_empty() {
            Ok(validated)
        } else {
            Err(ValidationError::new(violations))
        }
    }
}

/// Output of a successful [`Schema::validate`], in declared order.
///
/// Unset fields are kept as `None` so callers can tell "absent" from "empty".
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedFields {
    values: Vec<(&'static str, Option<FieldValue>)>,
}

impl ValidatedFields {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(field, _)| *field == name)
            .and_then(|(_, value)| value.as_ref())
    }

    /// True when the field was supplied with a non-empty value.
    pub fn is_filled(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_empty())
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(FieldValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        match self.get(name) {
            Some(FieldValue::Date(d)) => Some(*d),
            _ => None,
        }
    }

    pub fn gender(&self, name: &str) -> Option<u8> {
        match self.get(name) {
            Some(FieldValue::Gender(g)) => Some(*g),
            _ => None,
        }
    }

    pub fn client_ids(&self, name: &str) -> Option<&[i64]> {
        match self.get(name) {
            Some(FieldValue::ClientIds(ids)) => Some(ids.as_slice()),
            _ => None,
        }
    }

    pub fn arguments(&self, name: &str) -> Option<&Map<String, Value>> {
        match self.get(name) {
            Some(FieldValue::Arguments(map)) => Some(map),
            _ => None,
        }
    }

    /// Names of all fields carrying a non-empty value, in declared order.
    pub fn filled_names(&self) -> Vec<&'static str> {
        self.values
            .iter()
            .filter(|(_, value)| value.as_ref().is_some_and(|v| !v.is_empty()))
            .map(|(name, _)| *name)
            .collect()
    }
}
