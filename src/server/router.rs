// src/server/router.rs
use crate::config::DEFAULT_BASE_PATH;
use hyper::Method;

pub const METRICS_PATH: &str = "/metrics";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Status,
    Readiness,
    Liveness,
    Metrics,
    History,
}

/// Exact method + path table built from the configured base path.
#[derive(Debug, Clone)]
pub struct Router {
    base_path: String,
    routes: Vec<(Method, String, Route)>,
}

impl Router {
    pub fn new(base_path: &str) -> Self {
        let base_path = normalize_base_path(base_path);
        let routes = vec![
            (Method::GET, base_path.clone(), Route::Status),
            (Method::GET, format!("{}/ready", base_path), Route::Readiness),
            (Method::GET, format!("{}/live", base_path), Route::Liveness),
            (Method::GET, format!("{}/history", base_path), Route::History),
            (Method::GET, METRICS_PATH.to_string(), Route::Metrics),
        ];

        Self { base_path, routes }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn resolve(&self, method: &Method, path: &str) -> Option<Route> {
        let path = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };

        self.routes
            .iter()
            .find(|(m, p, _)| m == method && p == path)
            .map(|(_, _, route)| *route)
    }
}

/// Leading slash, no trailing slash; empty falls back to the default.
pub fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        DEFAULT_BASE_PATH.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_path() {
        assert_eq!(normalize_base_path("/health"), "/health");
        assert_eq!(normalize_base_path("health/"), "/health");
        assert_eq!(normalize_base_path("/api/status/"), "/api/status");
        assert_eq!(normalize_base_path(""), DEFAULT_BASE_PATH);
    }

    #[test]
    fn test_resolve_routes() {
        let router = Router::new("/health");

        assert_eq!(router.resolve(&Method::GET, "/health"), Some(Route::Status));
        assert_eq!(router.resolve(&Method::GET, "/health/"), Some(Route::Status));
        assert_eq!(
            router.resolve(&Method::GET, "/health/ready"),
            Some(Route::Readiness)
        );
        assert_eq!(
            router.resolve(&Method::GET, "/health/live"),
            Some(Route::Liveness)
        );
        assert_eq!(
            router.resolve(&Method::GET, "/health/history"),
            Some(Route::History)
        );
        assert_eq!(router.resolve(&Method::GET, "/metrics"), Some(Route::Metrics));
    }

    #[test]
    fn test_unknown_method_or_path() {
        let router = Router::new("/status");

        assert_eq!(router.resolve(&Method::POST, "/status"), None);
        assert_eq!(router.resolve(&Method::GET, "/health"), None);
        assert_eq!(router.resolve(&Method::GET, "/"), None);
        assert_eq!(router.base_path(), "/status");
    }
}
