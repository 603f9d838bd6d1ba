//! Test app builder that mirrors main.rs wiring with injectable deps/mocks.
//!
//! # Usage
//!
//! ```ignore
//! use crate::common::app_builder::TestAppBuilder;
//!
//! #[tokio::test]
//! async fn test_with_full_app() {
//!     let app = TestAppBuilder::with_memory_store()
//!         .with_cors(&["*"])
//!         .build();
//!
//!     // Use app.oneshot(...) to send requests
//! }
//! ```

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::get,
    Extension, Router,
};
use gatehouse_api::{
    accounts,
    accounts::store::{mock::MemoryStore, AccountStore},
    config::SecurityHeadersConfig,
    http::{build_security_headers, security_headers_middleware},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Health check handler (mirrors main.rs)
async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Builder for test applications that mirrors main.rs wiring.
///
/// The layer ordering matches production exactly: routes, store extension,
/// CORS layer, security headers middleware outermost.
pub struct TestAppBuilder {
    /// Whether to include the account routes
    include_accounts: bool,
    /// Whether to include the health check route
    include_health: bool,
    /// Account store injected into the account routes
    store: Option<Arc<dyn AccountStore>>,
    /// CORS allowed origins (None means no CORS layer)
    cors_origins: Option<Vec<String>>,
    /// Security headers config (None means disabled)
    security_headers: Option<SecurityHeadersConfig>,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppBuilder {
    /// Create a new empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            include_accounts: false,
            include_health: false,
            store: None,
            cors_origins: None,
            security_headers: None,
        }
    }

    /// Create a minimal app with only the health check endpoint.
    #[must_use]
    pub fn minimal() -> Self {
        Self::new().with_health()
    }

    /// Create a full app backed by an empty in-memory store.
    #[must_use]
    pub fn with_memory_store() -> Self {
        Self::new()
            .with_store(Arc::new(MemoryStore::new()))
            .with_health()
    }

    /// Include account routes backed by the given store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn AccountStore>) -> Self {
        self.include_accounts = true;
        self.store = Some(store);
        self
    }

    /// Include health check route (/health).
    #[must_use]
    pub fn with_health(mut self) -> Self {
        self.include_health = true;
        self
    }

    /// Configure CORS with specific allowed origins.
    ///
    /// Pass an empty slice to block all cross-origin requests.
    /// Pass `&["*"]` to allow any origin.
    #[must_use]
    pub fn with_cors(mut self, origins: &[&str]) -> Self {
        self.cors_origins = Some(origins.iter().map(|s| (*s).to_string()).collect());
        self
    }

    /// Enable security headers with default configuration.
    #[must_use]
    pub fn with_security_headers_default(mut self) -> Self {
        self.security_headers = Some(SecurityHeadersConfig::default());
        self
    }

    /// Build the Axum router.
    #[must_use]
    pub fn build(self) -> Router {
        let mut app = Router::new();

        if self.include_accounts {
            app = app.merge(accounts::http::router());
        }

        if self.include_health {
            app = app.route("/health", get(health_check));
        }

        if let Some(store) = self.store {
            app = app.layer(Extension(store));
        }

        // Add CORS layer if configured
        if let Some(origins) = self.cors_origins {
            let allow_origin: AllowOrigin = if origins.iter().any(|o| o == "*") {
                AllowOrigin::any()
            } else if origins.is_empty() {
                AllowOrigin::list(Vec::<HeaderValue>::new())
            } else {
                let header_values: Vec<HeaderValue> = origins
                    .iter()
                    .filter_map(|origin| origin.parse().ok())
                    .collect();
                AllowOrigin::list(header_values)
            };

            app = app.layer(
                CorsLayer::new()
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers(Any)
                    .allow_origin(allow_origin),
            );
        }

        // Add security headers middleware if configured
        if let Some(config) = self.security_headers {
            if config.enabled {
                let headers = build_security_headers(&config);
                app = app
                    .layer(middleware::from_fn(security_headers_middleware))
                    .layer(Extension(headers));
            }
        }

        app
    }
}
