//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, headers)
//!     → router.rs (linear scan over routes in declaration order)
//!     → route.rs (all matchers must hold)
//!     → matcher.rs → predicate.rs (exact / prefix / suffix / regex sets)
//!     → mutator.rs (rewrite headers and path of the matched request)
//!     → Backend handle, or 404 when nothing matched
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Compile predicates (regexes compiled once)
//!     → Resolve backend names against the backend table
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins, in declaration order (no priority sorting)
//! - Any compile failure rejects the whole frontend

pub mod error;
pub mod matcher;
pub mod mutator;
pub mod predicate;
pub mod route;
pub mod router;

pub use error::CompileError;
pub use matcher::FieldMatcher;
pub use mutator::{FieldMutator, HeaderMutator, HeaderOperation, PathMutator};
pub use predicate::StringPredicate;
pub use route::Route;
pub use router::Router;
