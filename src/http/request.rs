//! Request handling and transformation.
//!
//! # Responsibilities
//! - Record the client address the gateway attributes a request to
//! - Rewrite the URL path while preserving scheme, authority and query
//!
//! # Design Decisions
//! - The client address lives in request extensions so that middleware
//!   (proxy headers) can override it and backends (access log, reverse
//!   proxy) can read it
//! - A path stripped down to nothing becomes "/"

use axum::http::uri::PathAndQuery;
use axum::http::{Request, Uri};

/// Address of the client that sent a request, as seen by the gateway.
///
/// Holds an IP (with or without port) taken from the connection or, when
/// proxy headers are trusted, from forwarding headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddr(pub String);

/// Scheme the client used, as reported by a trusted upstream proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedScheme(pub String);

/// Replace the path component of the request URI.
pub fn set_path<B>(req: &mut Request<B>, path: &str) {
    let path = if path.is_empty() { "/" } else { path };
    let path_and_query = match req.uri().query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };

    let mut parts = req.uri().clone().into_parts();
    let rebuilt = PathAndQuery::try_from(path_and_query.as_str())
        .map_err(axum::http::Error::from)
        .and_then(|pq| {
            parts.path_and_query = Some(pq);
            Uri::from_parts(parts).map_err(axum::http::Error::from)
        });

    match rebuilt {
        Ok(uri) => *req.uri_mut() = uri,
        Err(e) => tracing::warn!(path, error = %e, "Could not rewrite request path"),
    }
}
