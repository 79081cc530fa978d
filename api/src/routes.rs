use axum::{
    extract::MatchedPath,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{
    auth_middleware::basic_auth_middleware, handlers, metrics, metrics_handler, state::AppState,
};

pub fn observability_routes() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_handler::metrics_endpoint))
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/health", get(handlers::health_check))
}

pub fn binding_routes() -> Router<AppState> {
    Router::new()
        .route("/path/:param", get(handlers::path_param))
        .route(
            "/parent/:parentId/children/:childId",
            get(handlers::parent_child),
        )
        .route("/body", post(handlers::echo_body))
        .route("/query", get(handlers::query_window))
        .route("/all/:id", put(handlers::combined))
}

pub fn user_routes(state: &AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/admin", post(handlers::admin_write))
        .route_layer(middleware::from_fn_with_state(
            state.accounts.clone(),
            basic_auth_middleware,
        ));

    Router::new()
        .route("/user/:name", get(handlers::get_user_value))
        .merge(admin)
}

/// The complete application router.
pub fn app(state: AppState) -> Router {
    let routes = Router::new()
        .merge(health_routes())
        .merge(binding_routes())
        .merge(user_routes(&state))
        .merge(observability_routes())
        .fallback(handlers::route_not_found);

    with_middleware(routes).with_state(state)
}

/// Panics are turned into 500s inside `request_logger`, so panicking
/// requests are still logged and counted.
fn with_middleware(routes: Router<AppState>) -> Router<AppState> {
    routes
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn(request_logger))
        .layer(TraceLayer::new_for_http())
}

async fn request_logger(
    req: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> axum::response::Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let start = std::time::Instant::now();

    metrics::HTTP_IN_FLIGHT.inc();
    let response = next.run(req).await;
    metrics::HTTP_IN_FLIGHT.dec();

    let elapsed = start.elapsed();
    let status = response.status().as_u16();

    metrics::observe_http(method.as_str(), &route, status, elapsed.as_secs_f64());
    tracing::info!("{method} {uri} {status} {}ms", elapsed.as_millis());

    response
}
