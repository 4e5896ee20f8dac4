//! Request envelope and per-method argument schemas.
//!
//! Each schema is built once from an explicit ordered field list and reused
//! for every request.
use crate::fields::{FieldDescriptor, FieldKind};
use crate::schema::{Schema, ValidatedFields, ValidationError};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::sync::LazyLock;

pub const METHOD_ONLINE_SCORE: &str = "online_score";
pub const METHOD_CLIENTS_INTERESTS: &str = "clients_interests";

static METHOD_REQUEST_SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("request")
        .field("account", FieldDescriptor::new(FieldKind::Char, false, true))
        .field("login", FieldDescriptor::new(FieldKind::Char, true, true))
        .field("token", FieldDescriptor::new(FieldKind::Char, true, true))
        .field("arguments", FieldDescriptor::new(FieldKind::Arguments, true, true))
        .field("method", FieldDescriptor::new(FieldKind::Char, true, false))
});

static ONLINE_SCORE_SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(METHOD_ONLINE_SCORE)
        .field("first_name", FieldDescriptor::new(FieldKind::Char, false, true))
        .field("last_name", FieldDescriptor::new(FieldKind::Char, false, true))
        .field("email", FieldDescriptor::new(FieldKind::Email, false, true))
        .field("phone", FieldDescriptor::new(FieldKind::Phone, false, true))
        .field("birthday", FieldDescriptor::new(FieldKind::BirthDay, false, true))
        .field("gender", FieldDescriptor::new(FieldKind::Gender, false, true))
        .rule(has_scoring_pair)
});

static CLIENTS_INTERESTS_SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(METHOD_CLIENTS_INTERESTS)
        .field("client_ids", FieldDescriptor::new(FieldKind::ClientIds, true, false))
        .field("date", FieldDescriptor::new(FieldKind::Date, false, true))
});

/// Pairs of which at least one must be fully filled for online_score.
const SCORING_PAIRS: [(&str, &str); 3] = [
    ("phone", "email"),
    ("first_name", "last_name"),
    ("gender", "birthday"),
];

fn has_scoring_pair(fields: &ValidatedFields) -> Result<(), String> {
    if SCORING_PAIRS
        .iter()
        .any(|(a, b)| fields.is_filled(a) && fields.is_filled(b))
    {
        Ok(())
    } else {
        Err("at least one of the pairs phone/email, first_name/last_name, gender/birthday must be filled".to_string())
    }
}

/// Validated outer envelope of a call.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRequest {
    pub account: Option<String>,
    pub login: String,
    pub token: String,
    pub arguments: Map<String, Value>,
    pub method: String,
}

impl MethodRequest {
    pub fn schema() -> &'static Schema {
        &METHOD_REQUEST_SCHEMA
    }

    pub fn parse(raw: &Map<String, Value>, today: NaiveDate) -> Result<Self, ValidationError> {
        let fields = Self::schema().validate(raw, today)?;
        Ok(Self {
            account: fields.text("account").map(str::to_owned),
            login: fields.text("login").unwrap_or_default().to_owned(),
            token: fields.text("token").unwrap_or_default().to_owned(),
            arguments: fields.arguments("arguments").cloned().unwrap_or_default(),
            method: fields.text("method").unwrap_or_default().to_owned(),
        })
    }
}

/// Validated arguments of `online_score`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OnlineScoreArguments {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub gender: Option<u8>,
    /// Names of the fields that carried a non-empty value.
    pub filled: Vec<&'static str>,
}

impl OnlineScoreArguments {
    pub fn schema() -> &'static Schema {
        &ONLINE_SCORE_SCHEMA
    }

    pub fn parse(raw: &Map<String, Value>, today: NaiveDate) -> Result<Self, ValidationError> {
        let fields = Self::schema().validate(raw, today)?;
        Ok(Self {
            first_name: fields.text("first_name").map(str::to_owned),
            last_name: fields.text("last_name").map(str::to_owned),
            email: fields.text("email").map(str::to_owned),
            phone: fields.text("phone").map(str::to_owned),
            birthday: fields.date("birthday"),
            gender: fields.gender("gender"),
            filled: fields.filled_names(),
        })
    }
}

/// Validated arguments of `clients_interests`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientsInterestsArguments {
    pub client_ids: Vec<i64>,
    pub date: Option<NaiveDate>,
}

impl ClientsInterestsArguments {
    pub fn schema() -> &'static Schema {
        &CLIENTS_INTERESTS_SCHEMA
    }

    pub fn parse(raw: &Map<String, Value>, today: NaiveDate) -> Result<Self, ValidationError> {
        let fields = Self::schema().validate(raw, today)?;
        Ok(Self {
            client_ids: fields.client_ids("client_ids").unwrap_or_default().to_vec(),
            date: fields.date("date"),
        })
    }
}
