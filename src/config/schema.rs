//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listening endpoints, each with its own ordered route list.
    pub frontends: Vec<FrontendConfig>,

    /// Named request handlers referenced by routes.
    pub backends: Vec<BackendConfig>,

    /// Graceful shutdown settings.
    pub shutdown: ShutdownConfig,
}

/// A listening endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FrontendConfig {
    /// Frontend identifier for logging/metrics.
    pub name: String,

    /// Bind address (e.g., "0.0.0.0").
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Listening port.
    pub port: u16,

    /// Optional TLS configuration.
    #[serde(default)]
    pub tls: Option<TlsConfig>,

    /// Routes, evaluated in declaration order.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,

    /// Middleware wrapped around every route's backend.
    #[serde(default)]
    pub middleware: Option<MiddlewareConfig>,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

/// TLS configuration for a frontend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert: String,

    /// Path to private key file (PEM).
    pub key: String,
}

/// Frontend middleware switches.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MiddlewareConfig {
    /// Emit an access log line for every request handed to a backend.
    pub logger: bool,

    /// Trust `X-Forwarded-*` / `Forwarded` headers from the client.
    pub proxy_headers: bool,
}

/// Route binding match rules and modifications to a backend.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging.
    pub name: String,

    /// Backend name to forward to.
    pub backend: String,

    /// Conditions that must all hold for the route to match.
    #[serde(default, rename = "match")]
    pub condition: Option<MatchConfig>,

    /// Rewrites applied before the backend sees the request.
    #[serde(default, rename = "modify")]
    pub modification: Option<ModifyConfig>,
}

/// The `match` block of a route.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MatchConfig {
    pub header: Vec<HeaderMatchConfig>,
    pub path: Vec<StringMatchConfig>,
}

/// Literal conditions over a single string value.
///
/// Single-valued and list-valued fields of the same kind are unioned.
/// Empty strings mean "not configured".
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StringMatchConfig {
    pub is: String,
    pub is_any: Vec<String>,
    pub has_prefix: String,
    pub has_any_prefix: Vec<String>,
    pub has_suffix: String,
    pub has_any_suffix: Vec<String>,
    pub matches: String,
    pub matches_any: Vec<String>,
}

impl StringMatchConfig {
    pub fn equals(&self) -> impl Iterator<Item = &str> {
        union(&self.is, &self.is_any)
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        union(&self.has_prefix, &self.has_any_prefix)
    }

    pub fn suffixes(&self) -> impl Iterator<Item = &str> {
        union(&self.has_suffix, &self.has_any_suffix)
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        union(&self.matches, &self.matches_any)
    }
}

fn union<'a>(single: &'a str, any: &'a [String]) -> impl Iterator<Item = &'a str> {
    std::iter::once(single)
        .chain(any.iter().map(String::as_str))
        .filter(|s| !s.is_empty())
}

/// Header condition: the string literals are checked against every
/// occurrence of `field`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HeaderMatchConfig {
    pub field: String,

    #[serde(flatten)]
    pub value: StringMatchConfig,
}

/// The `modify` block of a route.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ModifyConfig {
    pub header: Vec<HeaderModifyConfig>,
    pub path: Vec<PathModifyConfig>,
}

/// Header rewrite. Only one operation fires: set, then remove, then add.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HeaderModifyConfig {
    pub field: String,

    #[serde(default)]
    pub set: String,

    #[serde(default)]
    pub remove: bool,

    #[serde(default)]
    pub add: String,
}

/// Path rewrite.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PathModifyConfig {
    pub strip_prefix: Vec<String>,
    pub strip_suffix: Vec<String>,
}

/// Backend definition. Exactly one kind must be configured.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Unique backend identifier.
    pub name: String,

    #[serde(default)]
    pub reverse_proxy: Option<ReverseProxyConfig>,

    #[serde(default)]
    pub file_server: Option<FileServerConfig>,

    #[serde(default)]
    pub prometheus: Option<PrometheusConfig>,
}

impl BackendConfig {
    /// Number of backend kinds configured; valid configs have exactly one.
    pub fn kind_count(&self) -> usize {
        [
            self.reverse_proxy.is_some(),
            self.file_server.is_some(),
            self.prometheus.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

/// Forward requests to upstream HTTP servers.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReverseProxyConfig {
    /// Upstream base URLs (e.g., "http://127.0.0.1:3000").
    pub targets: Vec<String>,
}

/// Serve files from a directory.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FileServerConfig {
    pub root: String,
}

/// Expose the process metrics registry.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PrometheusConfig {}

/// Graceful shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Time in-flight requests get to finish after a shutdown signal.
    pub grace_period_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [[backends]]
        name = "web"
        [backends.reverse_proxy]
        targets = ["http://127.0.0.1:3000"]

        [[backends]]
        name = "metrics"
        [backends.prometheus]

        [[frontends]]
        name = "public"
        port = 8080
        [frontends.middleware]
        logger = true

        [[frontends.routes]]
        name = "debug"
        backend = "web"
        [[frontends.routes.match.header]]
        field = "X-Debug"
        is = "true"
        is_any = ["yes", ""]
        [[frontends.routes.match.path]]
        has_prefix = "/api"
        has_any_suffix = [".json"]
        [[frontends.routes.modify.path]]
        strip_prefix = ["/api"]
        [[frontends.routes.modify.header]]
        field = "X-Gateway"
        set = "frontdoor"

        [[frontends.routes]]
        name = "default"
        backend = "metrics"
    "#;

    #[test]
    fn test_parse_sample() {
        let config: GatewayConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.backends.len(), 2);
        assert!(config.backends[1].prometheus.is_some());
        assert_eq!(config.shutdown.grace_period_secs, 5);

        let frontend = &config.frontends[0];
        assert_eq!(frontend.bind, "0.0.0.0");
        assert!(frontend.middleware.as_ref().unwrap().logger);
        assert!(!frontend.middleware.as_ref().unwrap().proxy_headers);

        let route = &frontend.routes[0];
        let condition = route.condition.as_ref().unwrap();
        assert_eq!(condition.header[0].field, "X-Debug");
        assert_eq!(
            condition.header[0].value.equals().collect::<Vec<_>>(),
            vec!["true", "yes"]
        );
        assert_eq!(condition.path[0].prefixes().collect::<Vec<_>>(), vec!["/api"]);
        assert_eq!(condition.path[0].suffixes().collect::<Vec<_>>(), vec![".json"]);
        assert_eq!(condition.path[0].patterns().count(), 0);

        let modification = route.modification.as_ref().unwrap();
        assert_eq!(modification.path[0].strip_prefix, vec!["/api"]);
        assert_eq!(modification.header[0].set, "frontdoor");

        assert!(frontend.routes[1].condition.is_none());
    }

    #[test]
    fn test_kind_count() {
        let mut backend = BackendConfig {
            name: "b".into(),
            ..Default::default()
        };
        assert_eq!(backend.kind_count(), 0);
        backend.prometheus = Some(PrometheusConfig {});
        backend.file_server = Some(FileServerConfig { root: ".".into() });
        assert_eq!(backend.kind_count(), 2);
    }
}
