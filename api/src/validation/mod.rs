//! Request binding and validation
//!
//! # Overview
//!
//! 1. **Binding** - declarative per-record tables (`FieldSpec`) evaluated by a
//!    single `Binder`, see [`binding`]
//! 2. **Extractors** - Axum extractors (`ValidatedPath`, `ValidatedQuery`,
//!    `ValidatedJson`, `Bound`) that run the binder against a request
//! 3. **Validators** - the rule predicates
//! 4. **Requests** - binding tables for the API's records
//!
//! # Rule evaluation
//!
//! Rules are checked phase by phase across the whole record: presence, then
//! length bounds, then cross-field and clock rules. Only the first violation
//! is reported:
//!
//! ```json
//! {
//!   "error": "ValidationError",
//!   "message": "Validation failed for field 'test'",
//!   "errors": [{"field": "test", "message": "must be at least 3 characters"}],
//!   "code": 400,
//!   "timestamp": "2026-02-20T10:30:00Z",
//!   "correlation_id": "uuid-here"
//! }
//! ```
//!
//! Input that cannot be parsed (invalid JSON, a non-RFC3339 timestamp) is a
//! `BindError::Malformed` and answers 400 with `"error": "BindError"`.

pub mod binding;
pub mod extractors;
pub mod requests;
pub mod validators;

pub use binding::{
    bind_body, bind_path, bind_query, BindError, Bindable, Binder, FieldSpec, Rule, Source,
};
pub use extractors::{
    Bound, FieldError, ValidatedJson, ValidatedPath, ValidatedQuery, ValidationError,
};
