//! Mapping dispatch results to HTTP responses.
//!
//! # Design Decisions
//! - Client faults (bad escaping, unknown route) are 4xx
//! - Handler failures are 500; an entry still populating is 503 with `Retry-After`
//! - Error bodies are the plain-text error message

use axum::http::header::{CONTENT_TYPE, RETRY_AFTER};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::error::CacheError;

/// Seconds a client should wait before retrying a `CacheEmpty` response.
pub const RETRY_AFTER_SECS: &str = "1";

/// Status code the transport uses for each error.
pub fn status_for(error: &CacheError) -> StatusCode {
    match error {
        CacheError::DecodeFailed { .. } => StatusCode::BAD_REQUEST,
        CacheError::NotFound { .. } => StatusCode::NOT_FOUND,
        CacheError::CacheEmpty { .. } => StatusCode::SERVICE_UNAVAILABLE,
        CacheError::HandlerFailed { .. } | CacheError::InvalidPattern { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let mut response = (
            status,
            [(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
            self.to_string(),
        )
            .into_response();

        if self.is_retryable() {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
        }
        response
    }
}

/// A 200 response carrying a cached body.
pub fn cached_body(body: Bytes, content_type: HeaderValue) -> Response {
    ([(CONTENT_TYPE, content_type)], body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CacheError::DecodeFailed { segment: "%zz".into() }, 400),
            (CacheError::NotFound { path: "/nope".into() }, 404),
            (CacheError::CacheEmpty { key: "/k".into() }, 503),
            (
                CacheError::HandlerFailed {
                    key: "/k".into(),
                    source: "boom".into(),
                },
                500,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(status_for(&error).as_u16(), expected, "{error}");
        }
    }

    #[test]
    fn test_retry_after_only_for_cache_empty() {
        let empty = CacheError::CacheEmpty { key: "/k".into() }.into_response();
        assert_eq!(empty.headers().get(RETRY_AFTER).unwrap(), RETRY_AFTER_SECS);

        let missing = CacheError::NotFound { path: "/k".into() }.into_response();
        assert!(missing.headers().get(RETRY_AFTER).is_none());
    }
}
