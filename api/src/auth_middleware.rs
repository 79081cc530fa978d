use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::error::ApiError;
use crate::metrics;

const REALM_CHALLENGE: &str = "Basic realm=\"Authorization Required\"";

/// Principal established by the Basic-Auth gate, available to handlers as a
/// request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub principal: String,
}

/// Accounts accepted by the gate, held as the exact `Authorization` header
/// value each one produces.
#[derive(Debug, Clone)]
pub struct BasicAuthAccounts {
    expected: Arc<Vec<(String, String)>>,
}

impl BasicAuthAccounts {
    pub fn new(accounts: &[(String, String)]) -> Self {
        let expected = accounts
            .iter()
            .map(|(user, password)| (authorization_header(user, password), user.clone()))
            .collect();
        Self {
            expected: Arc::new(expected),
        }
    }

    /// Return the principal whose credentials produce `header`.
    pub fn authenticate(&self, header: &str) -> Option<&str> {
        self.expected
            .iter()
            .find(|(expected, _)| constant_time_eq(expected.as_bytes(), header.as_bytes()))
            .map(|(_, user)| user.as_str())
    }
}

pub fn authorization_header(user: &str, password: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{user}:{password}")))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub async fn basic_auth_middleware(
    State(accounts): State<BasicAuthAccounts>,
    mut request: Request,
    next: Next,
) -> Response {
    let credentials = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let Some(credentials) = credentials else {
        return unauthorized("missing credentials");
    };

    let Some(principal) = accounts.authenticate(credentials).map(str::to_string) else {
        return unauthorized("invalid credentials");
    };

    tracing::debug!(%principal, "basic auth accepted");
    request.extensions_mut().insert(AuthContext { principal });

    next.run(request).await
}

fn unauthorized(reason: &'static str) -> Response {
    tracing::warn!(reason, "basic auth rejected");
    metrics::AUTH_REJECTIONS.inc();

    let mut response = ApiError::unauthorized(reason).into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static(REALM_CHALLENGE),
    );
    response
}
