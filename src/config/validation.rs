//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check naming uniqueness and listener conflicts
//! - Validate value ranges (ports, bind addresses, backend kinds)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Rule compilation (regex, header names, backend references) is left to
//!   route assembly, which reports the first failure

use std::collections::HashSet;
use std::net::IpAddr;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("duplicate frontend name '{0}'")]
    DuplicateFrontend(String),

    #[error("duplicate backend name '{0}'")]
    DuplicateBackend(String),

    #[error("frontend '{frontend}' listens on {address}, which is already in use by another frontend")]
    DuplicateListener { frontend: String, address: String },

    #[error("frontend '{frontend}' has invalid bind address '{bind}'")]
    InvalidBind { frontend: String, bind: String },

    #[error("frontend '{0}' must listen on a non-zero port")]
    InvalidPort(String),

    #[error("route '{route}' of frontend '{frontend}' does not name a backend")]
    MissingRouteBackend { frontend: String, route: String },

    #[error("backend '{name}' must configure exactly one of reverse_proxy, file_server, prometheus (found {found})")]
    BackendKind { name: String, found: usize },

    #[error("backend '{0}' has no reverse proxy targets")]
    NoTargets(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut frontend_names = HashSet::new();
    let mut listeners = HashSet::new();
    for frontend in &config.frontends {
        if !frontend_names.insert(frontend.name.as_str()) {
            errors.push(ValidationError::DuplicateFrontend(frontend.name.clone()));
        }

        match frontend.bind.parse::<IpAddr>() {
            Ok(ip) => {
                let address = format!("{}:{}", ip, frontend.port);
                if !listeners.insert(address.clone()) {
                    errors.push(ValidationError::DuplicateListener {
                        frontend: frontend.name.clone(),
                        address,
                    });
                }
            }
            Err(_) => errors.push(ValidationError::InvalidBind {
                frontend: frontend.name.clone(),
                bind: frontend.bind.clone(),
            }),
        }

        if frontend.port == 0 {
            errors.push(ValidationError::InvalidPort(frontend.name.clone()));
        }

        for route in &frontend.routes {
            if route.backend.is_empty() {
                errors.push(ValidationError::MissingRouteBackend {
                    frontend: frontend.name.clone(),
                    route: route.name.clone(),
                });
            }
        }
    }

    let mut backend_names = HashSet::new();
    for backend in &config.backends {
        if !backend_names.insert(backend.name.as_str()) {
            errors.push(ValidationError::DuplicateBackend(backend.name.clone()));
        }

        let found = backend.kind_count();
        if found != 1 {
            errors.push(ValidationError::BackendKind {
                name: backend.name.clone(),
                found,
            });
        }

        if let Some(proxy) = &backend.reverse_proxy {
            if proxy.targets.is_empty() {
                errors.push(ValidationError::NoTargets(backend.name.clone()));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
