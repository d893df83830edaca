//! Backend subsystem.
//!
//! # Data Flow
//! ```text
//! [[backends]] config
//!     → reverse_proxy.rs (round-robin forwarding to upstream targets)
//!     → file_server.rs (static files below a root directory)
//!     → prometheus.rs (metrics exposition)
//!     → wrapped with per-backend instrumentation
//!     → BackendTable (name → handle), resolved by routes at startup
//! ```
//!
//! # Design Decisions
//! - A backend is an opaque handle: request in, response out
//! - Backend failures are turned into responses by the backend itself;
//!   the router never retries or fails over
//! - The table is built once and only read afterwards

pub mod file_server;
pub mod prometheus;
pub mod reverse_proxy;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::BackendConfig;
use crate::observability::metrics;
use crate::routing::CompileError;

pub use file_server::FileServer;
pub use prometheus::PrometheusExporter;
pub use reverse_proxy::ReverseProxy;

/// Future returned by [`Handler::handle`].
pub type HandlerFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Anything that can serve a request.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: Request<Body>) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn handle(&self, request: Request<Body>) -> HandlerFuture {
        Box::pin(self(request))
    }
}

/// Shared handle to a request handler.
pub type BackendHandle = Arc<dyn Handler>;

/// Error type for backend construction.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("target '{0}' must use http")]
    UnsupportedScheme(String),

    #[error("no targets configured")]
    NoTargets,

    #[error("no backend kind configured")]
    MissingKind,

    #[error("metrics recorder is not installed")]
    MetricsUnavailable,
}

/// A named, instrumented request handler.
#[derive(Clone)]
pub struct Backend {
    name: String,
    handle: BackendHandle,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").field("name", &self.name).finish()
    }
}

impl Backend {
    /// Wrap a handler, counting and timing every request it serves.
    pub fn new(name: impl Into<String>, handler: impl Handler) -> Self {
        let name = name.into();
        let handle = Arc::new(Instrumented {
            name: name.clone(),
            inner: Arc::new(handler),
        });
        Self { name, handle }
    }

    /// Build a backend from its configuration.
    ///
    /// `metrics` is required only by the prometheus kind.
    pub fn from_config(
        config: &BackendConfig,
        metrics: Option<&PrometheusHandle>,
    ) -> Result<Self, BackendError> {
        if let Some(proxy) = &config.reverse_proxy {
            return Ok(Self::new(&config.name, ReverseProxy::new(&proxy.targets)?));
        }
        if let Some(files) = &config.file_server {
            return Ok(Self::new(&config.name, FileServer::new(&files.root)));
        }
        if config.prometheus.is_some() {
            let handle = metrics.ok_or(BackendError::MetricsUnavailable)?;
            return Ok(Self::new(&config.name, PrometheusExporter::new(handle.clone())));
        }
        Err(BackendError::MissingKind)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> BackendHandle {
        self.handle.clone()
    }
}

struct Instrumented {
    name: String,
    inner: BackendHandle,
}

impl Handler for Instrumented {
    fn handle(&self, request: Request<Body>) -> HandlerFuture {
        let name = self.name.clone();
        let start = Instant::now();
        metrics::record_backend_request(&name);
        let response = self.inner.handle(request);
        Box::pin(async move {
            let response = response.await;
            metrics::record_backend_duration(&name, start);
            response
        })
    }
}

/// Backends by name.
#[derive(Debug, Clone, Default)]
pub struct BackendTable {
    backends: HashMap<String, Backend>,
}

impl BackendTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every configured backend.
    ///
    /// The error carries the name of the backend that failed.
    pub fn from_config(
        configs: &[BackendConfig],
        metrics: Option<&PrometheusHandle>,
    ) -> Result<Self, (String, BackendError)> {
        let mut table = Self::new();
        for config in configs {
            tracing::info!(backend = %config.name, "Creating backend");
            let backend =
                Backend::from_config(config, metrics).map_err(|e| (config.name.clone(), e))?;
            table.insert(backend);
        }
        Ok(table)
    }

    pub fn insert(&mut self, backend: Backend) {
        self.backends.insert(backend.name.clone(), backend);
    }

    pub fn get(&self, name: &str) -> Option<&Backend> {
        self.backends.get(name)
    }

    /// Look up a backend referenced by a route.
    pub fn resolve(&self, name: &str) -> Result<&Backend, CompileError> {
        self.get(name)
            .ok_or_else(|| CompileError::BackendNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
