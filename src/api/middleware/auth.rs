use crate::AppState;
use crate::api::error::AppError;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header missing")]
    MissingHeader,

    #[error("Bearer token malformed")]
    Malformed,

    #[error("Invalid token")]
    InvalidToken,
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Unauthorized(e.to_string())
    }
}

/// Rejects the request before the handler runs (and before any file or
/// remote call) unless it carries `Authorization: Bearer <token>`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Err(e) = validate_bearer(req.headers(), &state.config.api_token) {
        tracing::warn!("🔒 Rejected {} {}: {}", req.method(), req.uri().path(), e);
        return Err(e.into());
    }

    Ok(next.run(req).await)
}

pub fn validate_bearer(headers: &HeaderMap, expected: &str) -> Result<(), AuthError> {
    let value = headers.get(AUTHORIZATION).ok_or(AuthError::MissingHeader)?;
    let value = value.to_str().map_err(|_| AuthError::Malformed)?;

    let (scheme, token) = value.trim().split_once(' ').ok_or(AuthError::Malformed)?;
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::Malformed);
    }

    // Any other scheme is a credential we do not accept
    if !scheme.eq_ignore_ascii_case("Bearer")
        || !constant_time_eq(token.as_bytes(), expected.as_bytes())
    {
        return Err(AuthError::InvalidToken);
    }

    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn test_valid_token() {
        assert_eq!(validate_bearer(&headers("Bearer s3cret"), "s3cret"), Ok(()));
        assert_eq!(validate_bearer(&headers("bearer s3cret"), "s3cret"), Ok(()));
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(
            validate_bearer(&HeaderMap::new(), "s3cret"),
            Err(AuthError::MissingHeader)
        );
    }

    #[test]
    fn test_malformed_header() {
        assert_eq!(
            validate_bearer(&headers("Bearer"), "s3cret"),
            Err(AuthError::Malformed)
        );
        assert_eq!(
            validate_bearer(&headers("s3cret"), "s3cret"),
            Err(AuthError::Malformed)
        );
        assert_eq!(
            validate_bearer(&headers("Bearer   "), "s3cret"),
            Err(AuthError::Malformed)
        );
    }

    #[test]
    fn test_wrong_token() {
        assert_eq!(
            validate_bearer(&headers("Bearer nope"), "s3cret"),
            Err(AuthError::InvalidToken)
        );
        assert_eq!(
            validate_bearer(&headers("Bearer s3cret2"), "s3cret"),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_other_scheme_is_invalid_token() {
        assert_eq!(
            validate_bearer(&headers("Basic s3cret"), "s3cret"),
            Err(AuthError::InvalidToken)
        );
        assert_eq!(
            validate_bearer(&headers("Token abc"), "s3cret"),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(AuthError::MissingHeader.to_string(), "Authorization header missing");
        assert_eq!(AuthError::Malformed.to_string(), "Bearer token malformed");
        assert_eq!(AuthError::InvalidToken.to_string(), "Invalid token");
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"hello", b"hell"));
    }
}
