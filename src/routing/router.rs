//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes in declaration order
//! - Find the first route whose conditions all hold
//! - Rewrite the request and hand it to that route's backend
//! - Answer 404 when nothing matches
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) linear scan; no index, scoring or reordering
//! - First match wins; exactly zero or one backend is invoked per request
//! - Backend responses are returned unmodified

use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;

use crate::backend::BackendTable;
use crate::config::FrontendConfig;
use crate::http::response;
use crate::observability::metrics;
use crate::routing::{CompileError, Route};

/// Ordered route table of one frontend.
#[derive(Debug)]
pub struct Router {
    name: String,
    routes: Vec<Route>,
}

impl Router {
    /// Create an empty router. Every request is answered with 404.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routes: Vec::new(),
        }
    }

    /// Append a route; it is evaluated after all routes added before it.
    pub fn with_route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Compile all routes of a frontend.
    pub fn from_config(
        config: &FrontendConfig,
        backends: &BackendTable,
    ) -> Result<Self, CompileError> {
        let mut router = Router::new(&config.name);
        for route in &config.routes {
            router = router.with_route(Route::from_config(
                route,
                backends,
                config.middleware.as_ref(),
            )?);
        }
        Ok(router)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// The first route matching the request, if any.
    pub fn find<B>(&self, req: &Request<B>) -> Option<&Route> {
        self.routes.iter().find(|route| route.matches(req))
    }

    /// Route a request and return the backend's response.
    pub async fn dispatch(&self, mut req: Request<Body>) -> Response {
        let start = Instant::now();
        metrics::record_frontend_request(&self.name);

        let response = match self.find(&req) {
            Some(route) => {
                tracing::debug!(
                    frontend = %self.name,
                    route = %route.name(),
                    backend = %route.backend_name(),
                    "Route matched"
                );
                route.apply_mutations(&mut req);
                route.backend().handle(req).await
            }
            None => {
                tracing::debug!(
                    frontend = %self.name,
                    path = %req.uri().path(),
                    "No route matched"
                );
                response::not_found()
            }
        };

        metrics::record_frontend_duration(&self.name, start);
        response
    }
}
