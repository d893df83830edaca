//! Responses the gateway produces itself.
//!
//! # Design Decisions
//! - No route matched → 404 with an empty body
//! - Upstream unreachable → 502
//! - Responses from backends are passed through untouched

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Terminal outcome when no route matches.
pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Body::empty()).into_response()
}

/// Returned by proxying backends when the upstream cannot be reached.
pub fn bad_gateway() -> Response {
    (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
}
