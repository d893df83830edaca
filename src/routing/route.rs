//! A single route: conditions, rewrites and the backend they lead to.

use axum::http::Request;

use crate::backend::{BackendHandle, BackendTable};
use crate::config::{MiddlewareConfig, RouteConfig};
use crate::http::middleware;
use crate::routing::{CompileError, FieldMatcher, FieldMutator};

/// A compiled route.
///
/// A route without matchers matches every request.
pub struct Route {
    name: String,
    backend_name: String,
    matchers: Vec<FieldMatcher>,
    mutators: Vec<FieldMutator>,
    backend: BackendHandle,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("backend", &self.backend_name)
            .field("matchers", &self.matchers)
            .field("mutators", &self.mutators)
            .finish()
    }
}

impl Route {
    /// Create a catch-all route without rewrites.
    pub fn new(
        name: impl Into<String>,
        backend_name: impl Into<String>,
        backend: BackendHandle,
    ) -> Self {
        Self {
            name: name.into(),
            backend_name: backend_name.into(),
            matchers: Vec::new(),
            mutators: Vec::new(),
            backend,
        }
    }

    pub fn with_matcher(mut self, matcher: FieldMatcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn with_mutator(mut self, mutator: FieldMutator) -> Self {
        self.mutators.push(mutator);
        self
    }

    /// Compile a route from its configuration.
    ///
    /// Header rules come before path rules, each in declaration order. The
    /// backend is resolved here and wrapped with the frontend middleware.
    pub fn from_config(
        config: &RouteConfig,
        backends: &BackendTable,
        middleware: Option<&MiddlewareConfig>,
    ) -> Result<Self, CompileError> {
        tracing::info!(route = %config.name, backend = %config.backend, "Creating route");
        let backend = backends.resolve(&config.backend)?;
        let handle = middleware::wrap(backend.handle(), middleware);

        let mut route = Route::new(&config.name, backend.name(), handle);

        if let Some(condition) = &config.condition {
            for header in &condition.header {
                route = route.with_matcher(FieldMatcher::header(header)?);
            }
            for path in &condition.path {
                route = route.with_matcher(FieldMatcher::path(path)?);
            }
        }

        if let Some(modification) = &config.modification {
            for header in &modification.header {
                route = route.with_mutator(FieldMutator::header(header)?);
            }
            for path in &modification.path {
                route = route.with_mutator(FieldMutator::path(path));
            }
        }

        Ok(route)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    pub fn backend(&self) -> &BackendHandle {
        &self.backend
    }

    /// True if every matcher matches. Stops at the first failure.
    pub fn matches<B>(&self, req: &Request<B>) -> bool {
        tracing::debug!(route = %self.name, "Checking route");
        let matched = self.matchers.iter().all(|m| m.matches(req));
        tracing::debug!(route = %self.name, matched, "Route checked");
        matched
    }

    /// Apply every mutator in declaration order.
    pub fn apply_mutations<B>(&self, req: &mut Request<B>) {
        for mutator in &self.mutators {
            mutator.apply(req);
        }
    }
}
