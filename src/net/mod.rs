//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Frontend with [frontends.tls]
//!     → tls.rs (load PEM certificate chain and key)
//!     → axum-server rustls acceptor
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - TLS is optional and configured per frontend
//! - Certificates are loaded once at startup; no rotation

pub mod tls;
