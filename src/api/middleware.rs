//! Bearer token gate
//!
//! Applied to every route except login and registration. Resolves the token
//! into an [`Identity`] stored in the request extensions, or rejects the
//! request with 401 before any handler runs.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::response::ApiError;
use crate::auth::{Identity, TokenError};
use crate::AppState;

pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&request) else {
        tracing::debug!(path = %request.uri().path(), "Rejected request without token");
        return ApiError::unauthorized("Authorization token is required").into_response();
    };

    let claims = match state.tokens.verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            match &e {
                TokenError::Expired => tracing::debug!("Rejected expired token"),
                TokenError::InvalidSignature => tracing::warn!("Rejected token with invalid signature"),
                e => tracing::warn!(error = %e, "Rejected malformed token"),
            }
            return ApiError::unauthorized(e.to_string()).into_response();
        }
    };

    let identity: Identity = claims.identity();
    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// The token from the `Authorization` header, with or without a `Bearer` scheme
fn bearer_token(request: &Request<Body>) -> Option<&str> {
    let value = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = match value.trim_start().split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest,
        _ => value,
    }
    .trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with(header: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/me");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_bearer_token_forms() {
        assert_eq!(bearer_token(&request_with(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&request_with(Some("abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&request_with(Some("bearer  abc.def "))), Some("abc.def"));
        assert_eq!(bearer_token(&request_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&request_with(Some("   "))), None);
        assert_eq!(bearer_token(&request_with(None)), None);
    }
}
