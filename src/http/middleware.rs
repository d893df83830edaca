//! Frontend middleware wrapped around route backends.
//!
//! # Responsibilities
//! - Access logging of every request handed to a backend
//! - Trusting client address, host and scheme reported by a fronting proxy
//!
//! # Design Decisions
//! - Middleware is applied per route at assembly time, so requests that
//!   match no route bypass it
//! - The access log wraps the backend first; proxy headers wrap outermost,
//!   so the log sees the rewritten client address
//! - Proxy headers are only honored when explicitly enabled

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request};

use crate::backend::{BackendHandle, Handler, HandlerFuture};
use crate::config::MiddlewareConfig;
use crate::http::request::{ClientAddr, ForwardedScheme};

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";
const X_FORWARDED_HOST: &str = "x-forwarded-host";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
const X_FORWARDED_SCHEME: &str = "x-forwarded-scheme";

/// Wrap a backend handle with the enabled middleware.
pub fn wrap(handle: BackendHandle, config: Option<&MiddlewareConfig>) -> BackendHandle {
    let Some(config) = config else {
        return handle;
    };

    let mut handle = handle;
    if config.logger {
        tracing::info!("Adding middleware logger");
        handle = Arc::new(AccessLog::new(handle));
    }
    if config.proxy_headers {
        tracing::info!("Adding middleware proxy headers");
        handle = Arc::new(ProxyHeaders::new(handle));
    }
    handle
}

/// Logs one line per request after the backend has responded.
pub struct AccessLog {
    inner: BackendHandle,
}

impl AccessLog {
    pub fn new(inner: BackendHandle) -> Self {
        Self { inner }
    }
}

impl Handler for AccessLog {
    fn handle(&self, request: Request<Body>) -> HandlerFuture {
        let start = Instant::now();
        let method = request.method().clone();
        let uri = request.uri().clone();
        let version = request.version();
        let client = request
            .extensions()
            .get::<ClientAddr>()
            .map(|ClientAddr(addr)| addr.clone())
            .unwrap_or_else(|| "-".to_string());
        let scheme = request
            .extensions()
            .get::<ForwardedScheme>()
            .map(|ForwardedScheme(scheme)| scheme.clone())
            .unwrap_or_else(|| "http".to_string());
        let user_agent = request
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        let response = self.inner.handle(request);
        Box::pin(async move {
            let response = response.await;
            tracing::info!(
                client = %client,
                method = %method,
                scheme = %scheme,
                uri = %uri,
                version = ?version,
                status = response.status().as_u16(),
                user_agent = %user_agent,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Request served"
            );
            response
        })
    }
}

/// Applies forwarding headers set by a trusted upstream proxy.
pub struct ProxyHeaders {
    inner: BackendHandle,
}

impl ProxyHeaders {
    pub fn new(inner: BackendHandle) -> Self {
        Self { inner }
    }
}

impl Handler for ProxyHeaders {
    fn handle(&self, mut request: Request<Body>) -> HandlerFuture {
        if let Some(addr) = client_addr(request.headers()) {
            request.extensions_mut().insert(ClientAddr(addr));
        }
        if let Some(scheme) = scheme(request.headers()) {
            request.extensions_mut().insert(ForwardedScheme(scheme));
        }
        if let Some(host) = request.headers().get(X_FORWARDED_HOST).cloned() {
            request.headers_mut().insert(header::HOST, host);
        }
        self.inner.handle(request)
    }
}

/// Value of the first `key=` pair in the first element of a `Forwarded`
/// header.
fn forwarded_param<'a>(forwarded: &'a str, key: &str) -> Option<&'a str> {
    let element = forwarded.split(',').next()?;
    element.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case(key)
            .then(|| value.trim().trim_matches('"'))
            .filter(|v| !v.is_empty())
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Client address from `X-Forwarded-For` (first hop), `X-Real-IP` or
/// `Forwarded: for=`, in that order.
pub fn client_addr(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = header_str(headers, X_FORWARDED_FOR) {
        let first = value.split(',').next().unwrap_or(value).trim();
        if !first.is_empty() {
            return Some(first.to_string());
        }
    }
    if let Some(value) = header_str(headers, X_REAL_IP) {
        return Some(value.to_string());
    }
    let forwarded = header_str(headers, header::FORWARDED.as_str())?;
    forwarded_param(forwarded, "for").map(str::to_string)
}

/// Scheme from `X-Forwarded-Proto`, `X-Forwarded-Scheme` or
/// `Forwarded: proto=`, lowercased.
pub fn scheme(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = header_str(headers, X_FORWARDED_PROTO) {
        return Some(value.to_lowercase());
    }
    if let Some(value) = header_str(headers, X_FORWARDED_SCHEME) {
        return Some(value.to_lowercase());
    }
    let forwarded = header_str(headers, header::FORWARDED.as_str())?;
    forwarded_param(forwarded, "proto").map(str::to_lowercase)
}
