//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum app, peer address, graceful shutdown)
//!     → [routing layer picks a route and rewrites the request]
//!     → middleware.rs (proxy headers, access log) around the backend
//!     → request.rs (client address, path rewriting helpers)
//!     → response.rs (404 / 502 produced by the gateway itself)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{ClientAddr, ForwardedScheme};
pub use server::{Frontend, FrontendError};
