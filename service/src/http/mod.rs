//! HTTP utilities and middleware shared by the application server.

pub mod security;

pub use security::{build_security_headers, security_headers_middleware};
