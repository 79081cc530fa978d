use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use binder_shared::models::{
    AdminWrite, CombinedParams, NamedBody, ParentChildPath, Pong, QueryParams, UserLookup,
    WriteAck,
};
use chrono::SecondsFormat;
use serde_json::{json, Value};

use crate::{
    auth_middleware::AuthContext,
    error::ApiError,
    state::AppState,
    validation::{Bound, ValidatedJson, ValidatedPath, ValidatedQuery},
};

pub async fn ping() -> Json<Pong> {
    Json(Pong::new())
}

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let uptime = state.started_at.elapsed().as_secs();
    let now = state.clock.now().to_rfc3339_opts(SecondsFormat::Secs, true);

    tracing::debug!(uptime_secs = uptime, "health check passed");
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "uptime_secs": uptime,
            "timestamp": now,
        })),
    )
}

/// Echo a single raw path parameter as text.
pub async fn path_param(Path(param): Path<String>) -> String {
    format!("param: {param}")
}

pub async fn parent_child(
    ValidatedPath(path): ValidatedPath<ParentChildPath>,
) -> Json<ParentChildPath> {
    Json(path)
}

pub async fn echo_body(ValidatedJson(body): ValidatedJson<NamedBody>) -> Json<NamedBody> {
    Json(body)
}

/// Validated query window; an omitted `latest` becomes the current second.
pub async fn query_window(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<QueryParams>,
) -> Json<QueryParams> {
    Json(params.with_default_latest(state.clock.now()))
}

pub async fn combined(Bound(params): Bound<CombinedParams>) -> Json<CombinedParams> {
    tracing::debug!(path = %params.path, query = %params.query, "combined record bound");
    Json(params)
}

pub async fn get_user_value(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<UserLookup> {
    let value = state.store.read(&name);
    Json(UserLookup::from_entry(name, value))
}

/// Store a value under the authenticated principal. A body without `value`
/// is rejected with 400 and nothing is stored.
pub async fn admin_write(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<AdminWrite>,
) -> Json<WriteAck> {
    let replaced = state.store.write(&auth.principal, req.value).is_some();
    tracing::info!(principal = %auth.principal, replaced, "stored value");
    Json(WriteAck::ok())
}

pub async fn route_not_found() -> ApiError {
    ApiError::not_found("RouteNotFound", "Route not found")
}
