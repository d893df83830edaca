//! Startup orchestration.
//!
//! # Responsibilities
//! - Build every backend, then every frontend against the backend table
//! - Load each frontend's TLS certificate and key before anything serves
//! - Start all frontends and keep them running until shutdown
//! - Stop all frontends together, draining within the grace period
//!
//! # Design Decisions
//! - Fail fast: any assembly error is fatal and nothing is started
//! - Backends initialize before frontends (routes resolve backend names)
//! - A frontend that stops on its own takes the whole gateway down

use std::future::Future;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusHandle};
use tokio::task::{JoinError, JoinSet};

use crate::backend::{BackendError, BackendTable};
use crate::config::{ConfigError, GatewayConfig};
use crate::http::{Frontend, FrontendError};
use crate::lifecycle::Shutdown;
use crate::net::tls::load_tls_config;

/// Error type for gateway startup and runtime.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to install metrics recorder: {0}")]
    Metrics(#[from] BuildError),

    #[error("backend '{name}': {source}")]
    Backend {
        name: String,
        #[source]
        source: BackendError,
    },

    #[error("frontend '{name}': {source}")]
    Frontend {
        name: String,
        #[source]
        source: FrontendError,
    },

    #[error("frontend '{name}': TLS: {source}")]
    Tls {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("frontend '{name}' failed: {source}")]
    Serve {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("frontend task failed: {0}")]
    Join(#[from] JoinError),
}

/// All frontends of a configuration, assembled and ready to serve.
pub struct Gateway {
    frontends: Vec<Frontend>,
    grace: Duration,
}

impl Gateway {
    /// Assemble backends and frontends from a validated configuration.
    ///
    /// `metrics` is required only when a prometheus backend is configured.
    pub async fn build(
        config: &GatewayConfig,
        metrics: Option<&PrometheusHandle>,
    ) -> Result<Self, StartupError> {
        let backends = BackendTable::from_config(&config.backends, metrics)
            .map_err(|(name, source)| StartupError::Backend { name, source })?;
        tracing::info!(count = backends.len(), "Backends created");

        let mut frontends = Vec::with_capacity(config.frontends.len());
        for fe in &config.frontends {
            let mut frontend =
                Frontend::from_config(fe, &backends).map_err(|source| StartupError::Frontend {
                    name: fe.name.clone(),
                    source,
                })?;
            if let Some(tls) = &fe.tls {
                let loaded = load_tls_config(tls)
                    .await
                    .map_err(|source| StartupError::Tls {
                        name: fe.name.clone(),
                        source,
                    })?;
                frontend = frontend.with_tls(loaded);
            }
            frontends.push(frontend);
        }

        Ok(Self {
            frontends,
            grace: Duration::from_secs(config.shutdown.grace_period_secs),
        })
    }

    pub fn frontends(&self) -> &[Frontend] {
        &self.frontends
    }

    /// Serve every frontend until `signal` resolves, then shut all of them
    /// down and wait for them to finish.
    pub async fn run_until<F>(self, signal: F) -> Result<(), StartupError>
    where
        F: Future<Output = ()>,
    {
        let shutdown = Shutdown::new();
        let mut tasks = JoinSet::new();
        for frontend in self.frontends {
            let name = frontend.name().to_string();
            let rx = shutdown.subscribe();
            let grace = self.grace;
            tasks.spawn(async move { (name, frontend.run(rx, grace).await) });
        }
        tracing::info!(count = tasks.len(), "Frontends started");

        let mut result = Ok(());
        tokio::select! {
            _ = signal => {}
            Some(joined) = tasks.join_next() => {
                tracing::error!("Frontend stopped unexpectedly");
                result = Self::outcome(joined);
            }
        }

        tracing::info!(grace_secs = self.grace.as_secs(), "Shutting down frontends");
        shutdown.trigger();
        while let Some(joined) = tasks.join_next().await {
            let outcome = Self::outcome(joined);
            if result.is_ok() {
                result = outcome;
            }
        }

        tracing::info!("Shutdown complete");
        result
    }

    fn outcome(
        joined: Result<(String, std::io::Result<()>), JoinError>,
    ) -> Result<(), StartupError> {
        match joined? {
            (_, Ok(())) => Ok(()),
            (name, Err(source)) => {
                tracing::error!(frontend = %name, error = %source, "Frontend failed");
                Err(StartupError::Serve { name, source })
            }
        }
    }
}
