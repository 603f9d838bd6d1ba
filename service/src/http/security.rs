//! Middleware that stamps protective headers on every response.

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY,
            X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS, X_XSS_PROTECTION,
        },
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::Response,
    Extension,
};

use crate::config::SecurityHeadersConfig;

/// Assemble the response header set from configuration.
///
/// Built once at startup and shared across requests via Axum's `Extension`
/// layer. Configured values that are not legal header values are skipped.
#[must_use]
pub fn build_security_headers(config: &SecurityHeadersConfig) -> Arc<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(6);

    // Fixed headers
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));

    // Operator-configured values
    for (name, raw) in [
        (X_FRAME_OPTIONS, config.frame_options.as_str()),
        (
            CONTENT_SECURITY_POLICY,
            config.content_security_policy.as_str(),
        ),
        (REFERRER_POLICY, config.referrer_policy.as_str()),
    ] {
        if let Ok(value) = HeaderValue::from_str(raw) {
            headers.insert(name, value);
        }
    }

    // HSTS only makes sense behind HTTPS, so it is opt-in
    if config.hsts_enabled {
        let mut hsts = format!("max-age={}", config.hsts_max_age);
        if config.hsts_include_subdomains {
            hsts.push_str("; includeSubDomains");
        }
        if let Ok(value) = HeaderValue::from_str(&hsts) {
            headers.insert(STRICT_TRANSPORT_SECURITY, value);
        }
    }

    Arc::new(headers)
}

/// Extend every response with the pre-built header set.
///
/// Add as the outermost layer so the headers reach all routes, including
/// error responses.
pub async fn security_headers_middleware(
    Extension(headers): Extension<Arc<HeaderMap>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    for (name, value) in headers.iter() {
        response.headers_mut().insert(name.clone(), value.clone());
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_sets_baseline_headers_without_hsts() {
        let headers = build_security_headers(&SecurityHeadersConfig::default());

        assert_eq!(
            headers.get(X_CONTENT_TYPE_OPTIONS),
            Some(&HeaderValue::from_static("nosniff"))
        );
        assert!(headers.contains_key(X_FRAME_OPTIONS));
        assert!(headers.contains_key(X_XSS_PROTECTION));
        assert!(headers.contains_key(CONTENT_SECURITY_POLICY));
        assert!(headers.contains_key(REFERRER_POLICY));
        assert!(!headers.contains_key(STRICT_TRANSPORT_SECURITY));
    }

    #[test]
    fn hsts_header_reflects_max_age_and_subdomain_settings() {
        let mut config = SecurityHeadersConfig::default();
        config.hsts_enabled = true;
        config.hsts_max_age = 86_400;
        config.hsts_include_subdomains = false;

        let headers = build_security_headers(&config);
        let hsts = headers
            .get(STRICT_TRANSPORT_SECURITY)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        assert_eq!(hsts, "max-age=86400");
    }

    #[test]
    fn hsts_header_includes_subdomains_when_enabled() {
        let mut config = SecurityHeadersConfig::default();
        config.hsts_enabled = true;
        config.hsts_include_subdomains = true;

        let headers = build_security_headers(&config);
        let hsts = headers
            .get(STRICT_TRANSPORT_SECURITY)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        assert!(hsts.ends_with("; includeSubDomains"));
    }

    #[test]
    fn custom_frame_options_are_honored() {
        let mut config = SecurityHeadersConfig::default();
        config.frame_options = "SAMEORIGIN".to_string();

        let headers = build_security_headers(&config);

        assert_eq!(
            headers.get(X_FRAME_OPTIONS),
            Some(&HeaderValue::from_static("SAMEORIGIN"))
        );
    }
}
