//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → compiled into backends and frontends at startup
//! ```
//!
//! # Design Decisions
//! - Config is read once; the route table is never rebuilt while serving
//! - Optional fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    BackendConfig, FileServerConfig, FrontendConfig, GatewayConfig, HeaderMatchConfig,
    HeaderModifyConfig, MatchConfig, MiddlewareConfig, ModifyConfig, PathModifyConfig,
    PrometheusConfig, ReverseProxyConfig, RouteConfig, ShutdownConfig, StringMatchConfig,
    TlsConfig,
};
pub use validation::ValidationError;
