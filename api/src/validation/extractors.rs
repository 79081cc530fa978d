//! Custom Axum extractors for bound input
//!
//! `ValidatedPath<T>`, `ValidatedQuery<T>` and `ValidatedJson<T>` bind a
//! record from a single source; `Bound<T>` binds path, query and body into
//! one record. All of them reject with a 400 when binding fails.

use std::collections::HashMap;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRef, FromRequest, FromRequestParts, Path, Query, Request},
    http::{request::Parts, StatusCode},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::binding::{BindError, Bindable, Binder, Source};
use crate::clock::Clock;
use crate::metrics;

/// A field-level validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validation error response body
#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    pub error: String,
    pub message: String,
    pub errors: Vec<FieldError>,
    pub code: u16,
    pub timestamp: String,
    pub correlation_id: String,
}

impl ValidationErrorResponse {
    pub fn new(errors: Vec<FieldError>) -> Self {
        let error_summary = if errors.len() == 1 {
            format!("Validation failed for field '{}'", errors[0].field)
        } else {
            format!("Validation failed for {} fields", errors.len())
        };

        Self {
            error: "ValidationError".to_string(),
            message: error_summary,
            errors,
            code: 400,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            correlation_id: Uuid::new_v4().to_string(),
        }
    }
}

/// Validation error that converts to an HTTP response
#[derive(Debug)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError::new(field, message)],
        }
    }
}

impl axum::response::IntoResponse for ValidationError {
    fn into_response(self) -> axum::response::Response {
        let response = ValidationErrorResponse::new(self.errors);
        (StatusCode::BAD_REQUEST, Json(response)).into_response()
    }
}

fn rejected(route: &str, err: BindError) -> BindError {
    tracing::warn!(route, kind = err.kind(), error = %err, "request binding failed");
    metrics::BINDING_FAILURES
        .with_label_values(&[err.kind()])
        .inc();
    err
}

async fn raw_path<S>(parts: &mut Parts, state: &S) -> Result<HashMap<String, String>, BindError>
where
    S: Send + Sync,
{
    Path::<HashMap<String, String>>::from_request_parts(parts, state)
        .await
        .map(|Path(raw)| raw)
        .map_err(|e| BindError::malformed(Source::Path, e.body_text()))
}

fn raw_query(parts: &Parts) -> Result<Vec<(String, String)>, BindError> {
    Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
        .map(|Query(raw)| raw)
        .map_err(|e| BindError::malformed(Source::Query, e.body_text()))
}

async fn raw_body<S>(req: Request, state: &S) -> Result<Bytes, BindError>
where
    S: Send + Sync,
{
    Bytes::from_request(req, state)
        .await
        .map_err(|e| BindError::malformed(Source::Body, e.body_text()))
}

/// Record bound from path parameters only
pub struct ValidatedPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidatedPath<T>
where
    T: Bindable + Send,
    S: Send + Sync,
    Clock: FromRef<S>,
{
    type Rejection = BindError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let route = parts.uri.path().to_string();
        let now = Clock::from_ref(state).now();
        let raw = raw_path(parts, state).await.map_err(|e| rejected(&route, e))?;
        super::binding::bind_path(&raw, now)
            .map(ValidatedPath)
            .map_err(|e| rejected(&route, e))
    }
}

/// Record bound from the query string only
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    T: Bindable + Send,
    S: Send + Sync,
    Clock: FromRef<S>,
{
    type Rejection = BindError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let route = parts.uri.path().to_string();
        let now = Clock::from_ref(state).now();
        let raw = raw_query(parts).map_err(|e| rejected(&route, e))?;
        super::binding::bind_query(&raw, now)
            .map(ValidatedQuery)
            .map_err(|e| rejected(&route, e))
    }
}

/// Record bound from the JSON body only
///
/// Unlike `axum::Json` this does not insist on a `Content-Type` header.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: Bindable + Send,
    S: Send + Sync,
    Clock: FromRef<S>,
{
    type Rejection = BindError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let route = req.uri().path().to_string();
        let now = Clock::from_ref(state).now();
        let body = raw_body(req, state).await.map_err(|e| rejected(&route, e))?;
        super::binding::bind_body(&body, now)
            .map(ValidatedJson)
            .map_err(|e| rejected(&route, e))
    }
}

/// Record bound from path, query and body, in that order
///
/// Rule violations after the path and query stages are expected while the
/// body-sourced fields are still missing; they are logged and binding goes
/// on. Malformed input at any stage, and any failure of the body stage,
/// rejects the request.
pub struct Bound<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Bound<T>
where
    T: Bindable + Send,
    S: Send + Sync,
    Clock: FromRef<S>,
{
    type Rejection = BindError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let route = req.uri().path().to_string();
        let mut binder = Binder::for_record::<T>(Clock::from_ref(state).now());
        let (mut parts, body) = req.into_parts();

        let path = raw_path(&mut parts, state)
            .await
            .map_err(|e| rejected(&route, e))?;
        tolerate_incomplete(&route, Source::Path, binder.bind_path(&path))?;

        let query = raw_query(&parts).map_err(|e| rejected(&route, e))?;
        tolerate_incomplete(&route, Source::Query, binder.bind_query(&query))?;

        let body = raw_body(Request::from_parts(parts, body), state)
            .await
            .map_err(|e| rejected(&route, e))?;
        binder.bind_body(&body).map_err(|e| rejected(&route, e))?;

        binder.finish().map(Bound).map_err(|e| rejected(&route, e))
    }
}

fn tolerate_incomplete(
    route: &str,
    stage: Source,
    result: Result<(), BindError>,
) -> Result<(), BindError> {
    match result {
        Err(err) if err.is_validation() => {
            tracing::debug!(route, %stage, error = %err, "record incomplete after stage");
            Ok(())
        }
        Err(err) => Err(rejected(route, err)),
        Ok(()) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error() {
        let error = FieldError::new("name", "is required");
        assert_eq!(error.field, "name");
        assert_eq!(error.message, "is required");
    }

    #[test]
    fn test_validation_error_response() {
        let errors = vec![
            FieldError::new("test", "is required"),
            FieldError::new("latest", "must not be in the future"),
        ];

        let response = ValidationErrorResponse::new(errors);

        assert_eq!(response.error, "ValidationError");
        assert_eq!(response.code, 400);
        assert_eq!(response.errors.len(), 2);
        assert!(response.message.contains("2 fields"));
    }

    #[test]
    fn test_single_error_response() {
        let response = ValidationErrorResponse::new(vec![FieldError::new("name", "is required")]);
        assert!(response.message.contains("field 'name'"));
    }

    #[test]
    fn test_tolerate_incomplete_only_swallows_rule_violations() {
        let incomplete = Err(BindError::Validation(FieldError::new("data", "is required")));
        assert!(tolerate_incomplete("/all/x", Source::Path, incomplete).is_ok());

        let malformed = Err(BindError::malformed(Source::Query, "bad"));
        assert!(tolerate_incomplete("/all/x", Source::Query, malformed).is_err());
    }
}
