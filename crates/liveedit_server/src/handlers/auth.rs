//! Admin gate for mutating endpoints.

use crate::error::HttpError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Reject requests without the configured bearer token.
///
/// Open when no `ADMIN_TOKEN` is configured.
pub(crate) async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.admin_token.as_deref() else {
        return next.run(request).await;
    };
    if bearer_token(request.headers()).is_some_and(|token| tokens_match(token, expected)) {
        return next.run(request).await;
    }

    tracing::warn!("Rejected unauthenticated {} {}", request.method(), request.uri().path());
    let mut response =
        HttpError::new(StatusCode::UNAUTHORIZED, "Live edit requires admin access").into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        header::HeaderValue::from_static("Bearer"),
    );
    response
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
}

fn tokens_match(presented: &str, expected: &str) -> bool {
    presented.len() == expected.len()
        && presented
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
