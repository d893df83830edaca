//! Reverse proxy backend.
//!
//! # Responsibilities
//! - Rotate through upstream targets (round-robin)
//! - Rebase the request URI onto the selected target
//! - Strip hop-by-hop headers in both directions
//! - Record the client in `X-Forwarded-For`
//!
//! # Design Decisions
//! - Only `http://` targets; TLS to upstreams is not supported
//! - Upstream transport failures become 502 responses, never errors

use std::sync::atomic::{AtomicUsize, Ordering};

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, Uri, Version};
use axum::response::Response;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::backend::{BackendError, Handler, HandlerFuture};
use crate::http::request::ClientAddr;
use crate::http::response;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Headers that only apply to a single connection.
const HOP_BY_HOP: [HeaderName; 9] = [
    header::CONNECTION,
    HeaderName::from_static("proxy-connection"),
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Forwards requests to a rotating set of upstream servers.
#[derive(Debug)]
pub struct ReverseProxy {
    targets: Vec<Url>,
    counter: AtomicUsize,
    client: Client<HttpConnector, Body>,
}

impl ReverseProxy {
    pub fn new(targets: &[String]) -> Result<Self, BackendError> {
        if targets.is_empty() {
            return Err(BackendError::NoTargets);
        }

        let targets = targets
            .iter()
            .map(|target| parse_target(target))
            .collect::<Result<Vec<_>, _>>()?;

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            targets,
            counter: AtomicUsize::new(0),
            client,
        })
    }

    /// Select the next target.
    pub fn next_target(&self) -> &Url {
        let index = self.counter.fetch_add(1, Ordering::Relaxed) % self.targets.len();
        &self.targets[index]
    }
}

fn parse_target(target: &str) -> Result<Url, BackendError> {
    let url = Url::parse(target).map_err(|e| BackendError::InvalidTarget {
        target: target.to_string(),
        reason: e.to_string(),
    })?;
    if url.scheme() != "http" {
        return Err(BackendError::UnsupportedScheme(target.to_string()));
    }
    if url.host_str().is_none() {
        return Err(BackendError::InvalidTarget {
            target: target.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(url)
}

/// Build the URI the upstream sees: target scheme and authority, target
/// base path joined with the request path, both queries merged.
pub fn upstream_uri(target: &Url, uri: &Uri) -> Result<Uri, axum::http::Error> {
    let host = target.host_str().unwrap_or_default();
    let authority = match target.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    let path = join_paths(target.path(), uri.path());
    let path_and_query = match (target.query().unwrap_or(""), uri.query().unwrap_or("")) {
        ("", "") => path,
        (base, "") => format!("{}?{}", path, base),
        ("", query) => format!("{}?{}", path, query),
        (base, query) => format!("{}?{}&{}", path, base, query),
    };

    Uri::builder()
        .scheme(target.scheme())
        .authority(authority)
        .path_and_query(path_and_query)
        .build()
}

fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

fn remove_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

fn append_forwarded_for(headers: &mut HeaderMap, client: &str) {
    let value = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(prior) => format!("{}, {}", prior, client),
        None => client.to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}

impl Handler for ReverseProxy {
    fn handle(&self, mut request: Request<Body>) -> HandlerFuture {
        let target = self.next_target();
        let uri = match upstream_uri(target, request.uri()) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(upstream = %target, error = %e, "Could not build upstream URI");
                return Box::pin(async { response::bad_gateway() });
            }
        };

        tracing::debug!(upstream = %uri, "Forwarding request");
        *request.uri_mut() = uri.clone();
        *request.version_mut() = Version::HTTP_11;

        let client_addr = request.extensions().get::<ClientAddr>().cloned();
        let headers = request.headers_mut();
        remove_hop_by_hop(headers);
        if let Some(ClientAddr(addr)) = client_addr {
            append_forwarded_for(headers, &addr);
        }

        let client = self.client.clone();
        Box::pin(async move {
            match client.request(request).await {
                Ok(upstream) => {
                    let (mut parts, body) = upstream.into_parts();
                    remove_hop_by_hop(&mut parts.headers);
                    Response::from_parts(parts, Body::new(body))
                }
                Err(e) => {
                    tracing::error!(upstream = %uri, error = %e, "Upstream error");
                    response::bad_gateway()
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_upstream_uri() {
        let uri: Uri = "/users?page=2".parse().unwrap();
        assert_eq!(
            upstream_uri(&url("http://127.0.0.1:3000"), &uri).unwrap().to_string(),
            "http://127.0.0.1:3000/users?page=2"
        );
        assert_eq!(
            upstream_uri(&url("http://backend/base/?v=1"), &uri).unwrap().to_string(),
            "http://backend/base/users?v=1&page=2"
        );
        assert_eq!(
            upstream_uri(&url("http://backend/base"), &"/x".parse().unwrap())
                .unwrap()
                .to_string(),
            "http://backend/base/x"
        );
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/", "/a"), "/a");
        assert_eq!(join_paths("/base", "a"), "/base/a");
        assert_eq!(join_paths("/base/", "a"), "/base/a");
    }

    #[test]
    fn test_target_validation() {
        assert!(matches!(
            ReverseProxy::new(&[]),
            Err(BackendError::NoTargets)
        ));
        assert!(matches!(
            ReverseProxy::new(&["https://secure".to_string()]),
            Err(BackendError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            ReverseProxy::new(&["not a url".to_string()]),
            Err(BackendError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn test_round_robin() {
        let proxy = ReverseProxy::new(&[
            "http://127.0.0.1:8080".to_string(),
            "http://127.0.0.1:8081".to_string(),
        ])
        .unwrap();

        assert_eq!(proxy.next_target().port(), Some(8080));
        assert_eq!(proxy.next_target().port(), Some(8081));
        assert_eq!(proxy.next_target().port(), Some(8080));
    }

    #[test]
    fn test_hop_by_hop_removed() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("close, x-private"));
        headers.insert("x-private", HeaderValue::from_static("1"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-kept", HeaderValue::from_static("1"));
        remove_hop_by_hop(&mut headers);
        assert!(headers.get("x-private").is_none());
        assert!(headers.get("keep-alive").is_none());
        assert!(headers.get(header::CONNECTION).is_none());
        assert!(headers.get("x-kept").is_some());
    }

    #[test]
    fn test_forwarded_for_appends() {
        let mut headers = HeaderMap::new();
        append_forwarded_for(&mut headers, "10.0.0.1");
        append_forwarded_for(&mut headers, "10.0.0.2");
        assert_eq!(headers.get(X_FORWARDED_FOR).unwrap(), "10.0.0.1, 10.0.0.2");
    }
}
