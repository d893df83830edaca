//! Config-driven HTTP gateway library.
//!
//! Frontends listen for requests, pick the first matching route, rewrite
//! the request and hand it to a named backend.

pub mod backend;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::GatewayConfig;
pub use http::Frontend;
pub use lifecycle::{Gateway, Shutdown};
pub use routing::Router;
