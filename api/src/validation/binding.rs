//! Declarative request binding
//!
//! A record declares, once, which of its fields come from the path, the
//! query string or the JSON body, what kind of value each holds and which
//! rules apply ([`Bindable::FIELDS`]). A single [`Binder`] walks that table
//! for every route instead of each handler parsing its own inputs.
//!
//! Binding happens per source. After each source is bound the whole record
//! is validated, so a record fed from several sources fails `Required` checks
//! until its last source has been bound; callers combining sources decide
//! which of those intermediate failures matter (see `extractors::Bound`).

use std::collections::HashMap;
use std::fmt;

use axum::response::{IntoResponse, Response};
use binder_shared::time::zero_time;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use super::extractors::{FieldError, ValidationError};
use super::validators::{
    validate_after, validate_length, validate_not_after, validate_required,
    validate_required_time,
};
use crate::error::ApiError;

/// Where a field's raw value is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Path,
    Query,
    Body,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path => write!(f, "path"),
            Source::Query => write!(f, "query"),
            Source::Body => write!(f, "body"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// RFC3339, normalized to UTC
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Present and non-empty (non-zero for timestamps)
    Required,
    /// Character count within `min..=max`
    Length { min: usize, max: usize },
    /// Strictly later than the named record field. Skipped while unset.
    After(&'static str),
    /// Not later than the evaluation time. Skipped while unset.
    NotAfterNow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    Presence,
    Bounds,
    CrossField,
}

const PHASES: [Phase; 3] = [Phase::Presence, Phase::Bounds, Phase::CrossField];

impl Rule {
    fn phase(&self) -> Phase {
        match self {
            Rule::Required => Phase::Presence,
            Rule::Length { .. } => Phase::Bounds,
            Rule::After(_) | Rule::NotAfterNow => Phase::CrossField,
        }
    }
}

/// One row of a binding table
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Name of the field in the record's serialized form
    pub field: &'static str,
    /// Name of the raw value in its source
    pub key: &'static str,
    pub source: Source,
    pub kind: FieldKind,
    pub rules: &'static [Rule],
}

impl FieldSpec {
    pub const fn text(field: &'static str, key: &'static str, source: Source) -> Self {
        Self {
            field,
            key,
            source,
            kind: FieldKind::Text,
            rules: &[],
        }
    }

    pub const fn timestamp(field: &'static str, key: &'static str, source: Source) -> Self {
        Self {
            field,
            key,
            source,
            kind: FieldKind::Timestamp,
            rules: &[],
        }
    }

    pub const fn with_rules(self, rules: &'static [Rule]) -> Self {
        Self {
            field: self.field,
            key: self.key,
            source: self.source,
            kind: self.kind,
            rules,
        }
    }
}

/// A record that can be produced by the [`Binder`]
pub trait Bindable: DeserializeOwned {
    const FIELDS: &'static [FieldSpec];
}

#[derive(Debug, Error)]
pub enum BindError {
    /// Input that could not be parsed at all
    #[error("malformed {origin} input: {message}")]
    Malformed { origin: Source, message: String },

    /// Well-formed input violating a field rule
    #[error("field '{}' {}", .0.field, .0.message)]
    Validation(FieldError),

    /// The binding table does not match the record type
    #[error("failed to assemble record: {0}")]
    Record(#[from] serde_json::Error),
}

impl BindError {
    pub fn malformed(origin: Source, message: impl Into<String>) -> Self {
        BindError::Malformed {
            origin,
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, BindError::Validation(_))
    }

    /// Label used for logging and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            BindError::Malformed { .. } => "bind",
            BindError::Validation(_) => "validation",
            BindError::Record(_) => "record",
        }
    }
}

impl IntoResponse for BindError {
    fn into_response(self) -> Response {
        match self {
            BindError::Malformed { origin, message } => {
                ApiError::bad_request("BindError", format!("Malformed {origin} input: {message}"))
                    .into_response()
            }
            BindError::Validation(FieldError { field, message }) => {
                ValidationError::single(field, message).into_response()
            }
            BindError::Record(err) => {
                tracing::error!(error = %err, "binding table does not match record");
                ApiError::internal("Failed to assemble request record").into_response()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FieldValue {
    Text(String),
    Timestamp(DateTime<Utc>),
}

/// Accumulates the fields of one record across its sources
#[derive(Debug)]
pub struct Binder {
    fields: &'static [FieldSpec],
    values: HashMap<&'static str, FieldValue>,
    now: DateTime<Utc>,
}

impl Binder {
    pub fn new(fields: &'static [FieldSpec], now: DateTime<Utc>) -> Self {
        Self {
            fields,
            values: HashMap::new(),
            now,
        }
    }

    pub fn for_record<T: Bindable>(now: DateTime<Utc>) -> Self {
        Self::new(T::FIELDS, now)
    }

    /// Bind path parameters, then validate the record.
    pub fn bind_path(&mut self, raw: &HashMap<String, String>) -> Result<(), BindError> {
        let fields = self.fields;
        for spec in fields.iter().filter(|f| f.source == Source::Path) {
            if let Some(value) = raw.get(spec.key) {
                self.assign(spec, value)?;
            }
        }
        self.validate()
    }

    /// Bind query pairs, then validate the record. The first occurrence of a
    /// repeated key wins.
    pub fn bind_query(&mut self, raw: &[(String, String)]) -> Result<(), BindError> {
        let fields = self.fields;
        for spec in fields.iter().filter(|f| f.source == Source::Query) {
            if let Some((_, value)) = raw.iter().find(|(key, _)| key == spec.key) {
                self.assign(spec, value)?;
            }
        }
        self.validate()
    }

    /// Bind a JSON object body, then validate the record. Undeclared keys are
    /// ignored.
    pub fn bind_body(&mut self, raw: &[u8]) -> Result<(), BindError> {
        let payload: Value = serde_json::from_slice(raw)
            .map_err(|e| BindError::malformed(Source::Body, format!("invalid JSON: {e}")))?;
        let Value::Object(object) = payload else {
            return Err(BindError::malformed(Source::Body, "expected a JSON object"));
        };

        let fields = self.fields;
        for spec in fields.iter().filter(|f| f.source == Source::Body) {
            match object.get(spec.key) {
                None | Some(Value::Null) => {}
                Some(Value::String(value)) => self.assign(spec, value)?,
                Some(other) => {
                    return Err(BindError::malformed(
                        Source::Body,
                        format!("field '{}' must be a string, got {}", spec.key, json_type(other)),
                    ));
                }
            }
        }
        self.validate()
    }

    /// Check every rule of the table, phase by phase, and report the first
    /// violation.
    pub fn validate(&self) -> Result<(), BindError> {
        for phase in PHASES {
            for spec in self.fields {
                for rule in spec.rules.iter().filter(|r| r.phase() == phase) {
                    self.check(spec, rule).map_err(|message| {
                        BindError::Validation(FieldError::new(spec.key, message))
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Assemble the typed record. Unbound fields are left to the record's
    /// serde defaults.
    pub fn finish<T: DeserializeOwned>(self) -> Result<T, BindError> {
        let mut object = Map::new();
        for (field, value) in self.values {
            let json = match value {
                FieldValue::Text(text) => Value::String(text),
                FieldValue::Timestamp(ts) => {
                    Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
                }
            };
            object.insert(field.to_string(), json);
        }
        Ok(serde_json::from_value(Value::Object(object))?)
    }

    fn assign(&mut self, spec: &FieldSpec, raw: &str) -> Result<(), BindError> {
        if raw.is_empty() {
            self.values.remove(spec.field);
            return Ok(());
        }
        let value = match spec.kind {
            FieldKind::Text => FieldValue::Text(raw.to_string()),
            FieldKind::Timestamp => {
                let parsed = DateTime::parse_from_rfc3339(raw).map_err(|e| {
                    BindError::malformed(
                        spec.source,
                        format!("field '{}' is not an RFC3339 timestamp: {e}", spec.key),
                    )
                })?;
                FieldValue::Timestamp(parsed.with_timezone(&Utc))
            }
        };
        self.values.insert(spec.field, value);
        Ok(())
    }

    fn check(&self, spec: &FieldSpec, rule: &Rule) -> Result<(), String> {
        match rule {
            Rule::Required => match spec.kind {
                FieldKind::Text => validate_required(self.text(spec.field)),
                FieldKind::Timestamp => {
                    validate_required_time(self.timestamp(spec.field).as_ref())
                }
            },
            Rule::Length { min, max } => {
                validate_length(self.text(spec.field).unwrap_or_default(), *min, *max)
            }
            Rule::After(other) => {
                let Some(value) = self.timestamp(spec.field) else {
                    return Ok(());
                };
                let other_value = self.timestamp(other).unwrap_or_else(zero_time);
                validate_after(&value, &other_value, self.key_of(other))
            }
            Rule::NotAfterNow => match self.timestamp(spec.field) {
                Some(value) => validate_not_after(&value, &self.now),
                None => Ok(()),
            },
        }
    }

    fn text(&self, field: &str) -> Option<&str> {
        match self.values.get(field) {
            Some(FieldValue::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        match self.values.get(field) {
            Some(FieldValue::Timestamp(ts)) => Some(*ts),
            _ => None,
        }
    }

    fn key_of<'a>(&self, field: &'a str) -> &'a str {
        self.fields
            .iter()
            .find(|spec| spec.field == field)
            .map(|spec| spec.key)
            .unwrap_or(field)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Bind a record whose fields all come from the path.
pub fn bind_path<T: Bindable>(
    raw: &HashMap<String, String>,
    now: DateTime<Utc>,
) -> Result<T, BindError> {
    let mut binder = Binder::for_record::<T>(now);
    binder.bind_path(raw)?;
    binder.finish()
}

/// Bind a record whose fields all come from the query string.
pub fn bind_query<T: Bindable>(
    raw: &[(String, String)],
    now: DateTime<Utc>,
) -> Result<T, BindError> {
    let mut binder = Binder::for_record::<T>(now);
    binder.bind_query(raw)?;
    binder.finish()
}

/// Bind a record whose fields all come from the JSON body.
pub fn bind_body<T: Bindable>(raw: &[u8], now: DateTime<Utc>) -> Result<T, BindError> {
    let mut binder = Binder::for_record::<T>(now);
    binder.bind_body(raw)?;
    binder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Window {
        #[serde(default)]
        label: String,
        #[serde(default = "zero_time")]
        from: DateTime<Utc>,
        #[serde(default = "zero_time")]
        to: DateTime<Utc>,
    }

    impl Bindable for Window {
        const FIELDS: &'static [FieldSpec] = &[
            FieldSpec::text("label", "label", Source::Query)
                .with_rules(&[Rule::Required, Rule::Length { min: 2, max: 4 }]),
            FieldSpec::timestamp("from", "from", Source::Query),
            FieldSpec::timestamp("to", "to", Source::Query)
                .with_rules(&[Rule::After("from"), Rule::NotAfterNow]),
        ];
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Mixed {
        #[serde(default)]
        id: String,
        #[serde(default)]
        note: String,
    }

    impl Bindable for Mixed {
        const FIELDS: &'static [FieldSpec] = &[
            FieldSpec::text("id", "id", Source::Path),
            FieldSpec::text("note", "note", Source::Body).with_rules(&[Rule::Required]),
        ];
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn field_of(err: BindError) -> String {
        match err {
            BindError::Validation(fe) => fe.field,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn binds_text_and_timestamps() {
        let raw = pairs(&[
            ("label", "abc"),
            ("from", "2024-06-01T10:00:00Z"),
            ("to", "2024-06-01T13:00:00+02:00"),
        ]);
        let window: Window = bind_query(&raw, now()).unwrap();
        assert_eq!(window.label, "abc");
        assert_eq!(window.from, Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap());
        assert_eq!(window.to, Utc.with_ymd_and_hms(2024, 6, 1, 11, 0, 0).unwrap());
    }

    #[test]
    fn absent_timestamps_fall_back_to_zero_time() {
        let window: Window = bind_query(&pairs(&[("label", "abc")]), now()).unwrap();
        assert_eq!(window.from, zero_time());
        assert_eq!(window.to, zero_time());
    }

    #[test]
    fn first_repeated_query_value_wins() {
        let raw = pairs(&[("label", "abc"), ("label", "toolong")]);
        let window: Window = bind_query(&raw, now()).unwrap();
        assert_eq!(window.label, "abc");
    }

    #[test]
    fn presence_is_checked_before_bounds() {
        let err = bind_query::<Window>(&pairs(&[]), now()).unwrap_err();
        match err {
            BindError::Validation(fe) => assert_eq!(fe.message, "is required"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bounds_are_checked_before_cross_field_rules() {
        let raw = pairs(&[("label", "a"), ("to", "2030-01-01T00:00:00Z")]);
        let err = bind_query::<Window>(&raw, now()).unwrap_err();
        assert_eq!(field_of(err), "label");
    }

    #[test]
    fn cross_field_rule_rejects_non_increasing_window() {
        let raw = pairs(&[
            ("label", "abc"),
            ("from", "2024-06-01T10:00:00Z"),
            ("to", "2024-06-01T10:00:00Z"),
        ]);
        let err = bind_query::<Window>(&raw, now()).unwrap_err();
        assert_eq!(field_of(err), "to");
    }

    #[test]
    fn not_after_now_is_inclusive() {
        let at_now = now().to_rfc3339();
        let ok = bind_query::<Window>(&pairs(&[("label", "abc"), ("to", &at_now)]), now());
        assert!(ok.is_ok());

        let later = (now() + Duration::seconds(1)).to_rfc3339();
        let err = bind_query::<Window>(&pairs(&[("label", "abc"), ("to", &later)]), now());
        assert!(err.unwrap_err().is_validation());
    }

    #[test]
    fn unparseable_timestamp_is_malformed() {
        let raw = pairs(&[("label", "abc"), ("from", "yesterday")]);
        let err = bind_query::<Window>(&raw, now()).unwrap_err();
        assert!(matches!(err, BindError::Malformed { origin: Source::Query, .. }));
    }

    #[test]
    fn body_must_be_a_json_object() {
        assert!(matches!(
            bind_body::<Mixed>(b"", now()).unwrap_err(),
            BindError::Malformed { origin: Source::Body, .. }
        ));
        assert!(matches!(
            bind_body::<Mixed>(b"[1,2]", now()).unwrap_err(),
            BindError::Malformed { .. }
        ));
        assert!(matches!(
            bind_body::<Mixed>(br#"{"note": 5}"#, now()).unwrap_err(),
            BindError::Malformed { .. }
        ));
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let err = bind_body::<Mixed>(br#"{"note": ""}"#, now()).unwrap_err();
        assert_eq!(field_of(err), "note");
    }

    #[tokio::test]
    async fn validation_failure_renders_one_field_error() {
        let err = bind_body::<Mixed>(br#"{"id": "1"}"#, now()).unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "ValidationError");
        assert_eq!(json["errors"].as_array().unwrap().len(), 1);
        assert_eq!(json["errors"][0]["field"], "note");
        assert_eq!(json["errors"][0]["message"], "is required");
    }

    #[test]
    fn sources_accumulate_into_one_record() {
        let mut binder = Binder::for_record::<Mixed>(now());
        let path = HashMap::from([("id".to_string(), "42".to_string())]);

        // The body-sourced field is still missing after the path stage
        assert!(binder.bind_path(&path).unwrap_err().is_validation());

        binder
            .bind_body(br#"{"note": "hello", "id": "ignored"}"#)
            .unwrap();
        let mixed: Mixed = binder.finish().unwrap();
        assert_eq!(
            mixed,
            Mixed {
                id: "42".into(),
                note: "hello".into()
            }
        );
    }
}
