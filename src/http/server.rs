//! Frontend listener.
//!
//! # Responsibilities
//! - Create the Axum app that hands every request to the frontend's router
//! - Attach the connection's peer address and scheme to each request
//! - Bind plain TCP or TLS and serve until shutdown is signalled
//! - Drain in-flight requests within the grace period on shutdown
//!
//! # Design Decisions
//! - A single fallback handler; all routing decisions belong to the router
//! - One task per frontend; frontends share nothing but backends

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    Router as AxumRouter,
};
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::backend::BackendTable;
use crate::config::FrontendConfig;
use crate::http::request::{ClientAddr, ForwardedScheme};
use crate::routing::{CompileError, Router};

/// Error type for frontend assembly.
#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    #[error("invalid bind address '{0}'")]
    InvalidBind(String),

    #[error(transparent)]
    Route(#[from] CompileError),
}

#[derive(Clone)]
struct FrontendState {
    router: Arc<Router>,
    scheme: &'static str,
}

/// A listening endpoint with its route table.
pub struct Frontend {
    name: String,
    addr: SocketAddr,
    tls: Option<RustlsConfig>,
    router: Arc<Router>,
}

impl Frontend {
    pub fn new(router: Router, addr: SocketAddr) -> Self {
        Self {
            name: router.name().to_string(),
            addr,
            tls: None,
            router: Arc::new(router),
        }
    }

    /// Serve over TLS with an already loaded certificate.
    pub fn with_tls(mut self, tls: RustlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Assemble a frontend and compile its routes.
    ///
    /// TLS material is loaded separately and attached with [`Frontend::with_tls`].
    pub fn from_config(
        config: &FrontendConfig,
        backends: &BackendTable,
    ) -> Result<Self, FrontendError> {
        tracing::info!(frontend = %config.name, "Creating frontend");
        let ip: IpAddr = config
            .bind
            .parse()
            .map_err(|_| FrontendError::InvalidBind(config.bind.clone()))?;
        let router = Router::from_config(config, backends)?;
        Ok(Self::new(router, SocketAddr::new(ip, config.port)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Build the Axum app for this frontend.
    pub fn app(&self) -> AxumRouter {
        let state = FrontendState {
            router: self.router.clone(),
            scheme: if self.tls.is_some() { "https" } else { "http" },
        };
        AxumRouter::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until a shutdown signal arrives, then drain for at most `grace`.
    pub async fn run(
        self,
        mut shutdown: broadcast::Receiver<()>,
        grace: Duration,
    ) -> io::Result<()> {
        let handle = Handle::new();
        let app = self
            .app()
            .into_make_service_with_connect_info::<SocketAddr>();

        let signal = handle.clone();
        let name = self.name.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!(frontend = %name, "Stopping frontend");
            signal.graceful_shutdown(Some(grace));
        });

        match &self.tls {
            Some(tls) => {
                tracing::info!(frontend = %self.name, address = %self.addr, "Starting frontend (TLS)");
                axum_server::bind_rustls(self.addr, tls.clone())
                    .handle(handle)
                    .serve(app)
                    .await?;
            }
            None => {
                tracing::info!(frontend = %self.name, address = %self.addr, "Starting frontend");
                axum_server::bind(self.addr).handle(handle).serve(app).await?;
            }
        }

        tracing::info!(frontend = %self.name, "Frontend stopped");
        Ok(())
    }
}

/// Hand the request to the router, after tagging it with the peer address
/// and the scheme it arrived on.
async fn dispatch_handler(
    State(state): State<FrontendState>,
    mut request: Request<Body>,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    if let Some(ip) = peer {
        request.extensions_mut().insert(ClientAddr(ip));
    }
    request
        .extensions_mut()
        .insert(ForwardedScheme(state.scheme.to_string()));

    state.router.dispatch(request).await
}
