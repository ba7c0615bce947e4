//! Route lookup and composition.
//!
//! # Responsibilities
//! - Turn route configuration into rules over named backends
//! - Compile the rule table and reject colliding sockets
//! - Normalize an HTTP request into host + path segments
//! - Return the owning backend or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Composition fails fast; a Router that exists is always valid
//! - Explicit `None` when nothing matches and no default is configured

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::Request;
use serde::Serialize;

use crate::backends::{self, Backend, BackendSet};
use crate::config::{ProxyConfig, RouteConfig, SubdomainPolicy};
use crate::error::{RouterError, RouterResult};
use crate::routing::rule::{MatchClass, Rule};
use crate::routing::table::RuleTable;

/// Host and path of a request, normalized for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    pub host: String,
    pub segments: Vec<String>,
}

impl RequestTarget {
    pub fn new(host: &str, path: &str) -> Self {
        Self {
            host: normalize_host(host),
            segments: split_path(path),
        }
    }

    /// Uses the `Host` header, falling back to the URI authority.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let host = req
            .headers()
            .get("host")
            .and_then(|h| h.to_str().ok())
            .or_else(|| req.uri().host())
            .unwrap_or_default();
        Self::new(host, req.uri().path())
    }
}

/// Lowercase, trim, and drop any port and trailing dot.
pub fn normalize_host(raw: &str) -> String {
    let raw = raw.trim();
    let host = if raw.starts_with('[') {
        // IPv6 literal, keep the brackets
        raw.find(']').map_or(raw, |end| &raw[..=end])
    } else {
        match raw.rsplit_once(':') {
            Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
            _ => raw,
        }
    };
    host.trim_end_matches('.').to_ascii_lowercase()
}

/// Split a URL path into its non-empty segments.
pub fn split_path(path: &str) -> Vec<String> {
    path.split('/').filter(|s| !s.is_empty()).map(str::to_string).collect()
}

/// Serializable view of one compiled entry, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct RouteView {
    pub position: usize,
    pub declared: usize,
    pub class: MatchClass,
    pub rule: String,
    pub backend: String,
}

/// The currently published router, swapped whole on reload.
pub type SharedRouter = Arc<ArcSwap<Router>>;

/// The published routing state: compiled table plus its backends.
#[derive(Debug)]
pub struct Router {
    table: RuleTable<Arc<Backend>>,
}

impl Router {
    /// Wrap a compiled table after checking its backends' sockets.
    pub fn new(table: RuleTable<Arc<Backend>>) -> RouterResult<Self> {
        backends::validate(&table.targets())?;
        Ok(Self { table })
    }

    /// Compose a router from configuration.
    pub fn from_config(config: &ProxyConfig) -> RouterResult<Self> {
        let set = BackendSet::new(&config.backends)?;
        if set.is_empty() {
            tracing::warn!("No backends declared, every request will be unmatched");
        }

        let lookup = |route: &str, name: &str| {
            set.get(name).ok_or_else(|| RouterError::UnknownBackend {
                route: route.to_string(),
                backend: name.to_string(),
            })
        };

        let mut rules = Vec::with_capacity(config.routes.len());
        for route in &config.routes {
            let target = lookup(&route.name, &route.backend)?;
            rules.extend(rules_for(route, target));
        }

        let mut builder = RuleTable::builder()
            .rules(rules)
            .require_default(config.router.require_default);
        if let Some(name) = &config.router.default_backend {
            builder = builder.default_target(lookup("<default>", name)?);
        }

        let router = Self::new(builder.build()?)?;
        tracing::info!(
            rules = router.table.len(),
            backends = set.len(),
            default = ?config.router.default_backend,
            "Router compiled"
        );
        Ok(router)
    }

    /// Resolve a normalized host and path.
    pub fn resolve<S: AsRef<str>>(&self, host: &str, path: &[S]) -> Option<&Arc<Backend>> {
        self.table.resolve(host, path)
    }

    /// Find the backend owning an HTTP request.
    pub fn match_request<B>(&self, req: &Request<B>) -> Option<Arc<Backend>> {
        let target = RequestTarget::from_request(req);
        self.resolve(&target.host, &target.segments).cloned()
    }

    /// Publish this router for lock-free reads.
    pub fn into_shared(self) -> SharedRouter {
        Arc::new(ArcSwap::from_pointee(self))
    }

    pub fn table(&self) -> &RuleTable<Arc<Backend>> {
        &self.table
    }

    /// Compiled entries in evaluation order.
    pub fn routes(&self) -> Vec<RouteView> {
        self.table
            .entries()
            .iter()
            .enumerate()
            .map(|(position, entry)| RouteView {
                position,
                declared: entry.index,
                class: entry.class,
                rule: entry.rule.to_string(),
                backend: entry.rule.target.name.clone(),
            })
            .collect()
    }
}

fn rules_for(route: &RouteConfig, target: Arc<Backend>) -> Vec<Rule<Arc<Backend>>> {
    let rules = match (route.host_pattern(), route.subdomains) {
        (None, _) => vec![Rule::path(Vec::<String>::new(), target)],
        (Some(host), SubdomainPolicy::Exclude) => vec![Rule::domain(host, target)],
        (Some(host), SubdomainPolicy::Include) => vec![Rule::subdomains(host, target)],
        (Some(host), SubdomainPolicy::Both) => Rule::proxy_all(host, target).into(),
    };
    match route.path_segments() {
        Some(segments) => rules.into_iter().map(|r| r.with_path(segments.clone())).collect(),
        None => rules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendConfig, RouteConfig};
    use axum::body::Body;

    fn backend(name: &str, port: u16, sockets: &[&str]) -> BackendConfig {
        BackendConfig {
            name: name.into(),
            address: format!("127.0.0.1:{}", port),
            sockets: sockets.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn route(name: &str, backend: &str, host: Option<&str>, subdomains: SubdomainPolicy, path: Option<&str>) -> RouteConfig {
        RouteConfig {
            name: name.into(),
            backend: backend.into(),
            host: host.map(Into::into),
            subdomains,
            path_prefix: path.map(Into::into),
        }
    }

    fn config() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.backends = vec![
            backend("web", 4000, &["/socket"]),
            backend("api", 4001, &[]),
            backend("live", 4002, &["/live"]),
        ];
        config.routes = vec![
            route("ws", "live", None, SubdomainPolicy::Exclude, Some("/live")),
            route("site", "web", Some("example.com"), SubdomainPolicy::Both, None),
            route("api", "api", Some("example.com"), SubdomainPolicy::Exclude, Some("/api")),
        ];
        config.router.default_backend = Some("web".into());
        config
    }

    fn name(backend: Option<Arc<Backend>>) -> Option<String> {
        backend.map(|b| b.name.clone())
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("Example.COM:8080"), "example.com");
        assert_eq!(normalize_host(" example.com. "), "example.com");
        assert_eq!(normalize_host("[::1]:8080"), "[::1]");
        assert_eq!(normalize_host("localhost"), "localhost");
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("/v1//oauth/"), vec!["v1", "oauth"]);
        assert!(split_path("/").is_empty());
    }

    #[test]
    fn test_match_request() {
        let router = Router::from_config(&config()).unwrap();

        let req = |host: &str, path: &str| {
            Request::builder()
                .uri(path)
                .header("host", host)
                .body(Body::empty())
                .unwrap()
        };

        assert_eq!(name(router.match_request(&req("example.com", "/api/users"))), Some("api".into()));
        assert_eq!(name(router.match_request(&req("EXAMPLE.com:443", "/"))), Some("web".into()));
        assert_eq!(name(router.match_request(&req("www.example.com", "/api"))), Some("web".into()));
        assert_eq!(name(router.match_request(&req("other.org", "/live/x"))), Some("live".into()));
        assert_eq!(name(router.match_request(&req("other.org", "/"))), Some("web".into()));
    }

    #[test]
    fn test_match_request_uses_uri_authority_without_host_header() {
        let router = Router::from_config(&config()).unwrap();
        let req = Request::builder()
            .uri("http://example.com/api")
            .body(Body::empty())
            .unwrap();
        assert_eq!(name(router.match_request(&req)), Some("api".into()));
    }

    #[test]
    fn test_no_default_is_explicit_none() {
        let mut config = config();
        config.router.default_backend = None;
        let router = Router::from_config(&config).unwrap();
        assert!(router.resolve("other.org", &["x"]).is_none());
    }

    #[test]
    fn test_unknown_backend() {
        let mut config = config();
        config.routes.push(route("bad", "nope", Some("a.com"), SubdomainPolicy::Exclude, None));
        assert_eq!(
            Router::from_config(&config).unwrap_err(),
            RouterError::UnknownBackend { route: "bad".into(), backend: "nope".into() }
        );
    }

    #[test]
    fn test_conflicting_routes_fail_composition() {
        let mut config = config();
        config.routes.push(route("api2", "live", Some("example.com"), SubdomainPolicy::Exclude, Some("/api/")));
        let err = Router::from_config(&config).unwrap_err();
        assert!(matches!(err, RouterError::Configuration { index: 4, .. }));
    }

    #[test]
    fn test_socket_collision_fails_composition() {
        let mut config = config();
        config.backends[1].sockets.push("/socket".into());
        let err = Router::from_config(&config).unwrap_err();
        match err {
            RouterError::Collision(collision) => {
                assert_eq!(collision.collisions.len(), 1);
                assert_eq!(collision.collisions[0].key, "/socket");
                assert_eq!(collision.collisions[0].targets, vec!["web".to_string(), "api".to_string()]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_unreferenced_backends_are_not_checked() {
        let mut config = config();
        config.backends.push(backend("idle", 4003, &["/socket"]));
        assert!(Router::from_config(&config).is_ok());
    }

    #[test]
    fn test_routes_view_in_evaluation_order() {
        let router = Router::from_config(&config()).unwrap();
        let views: Vec<(String, String)> = router
            .routes()
            .into_iter()
            .map(|v| (v.rule, v.backend))
            .collect();
        assert_eq!(
            views,
            vec![
                ("example.com/api".to_string(), "api".to_string()),
                ("example.com".to_string(), "web".to_string()),
                ("*.example.com".to_string(), "web".to_string()),
                ("*/live".to_string(), "live".to_string()),
            ]
        );
    }
}
