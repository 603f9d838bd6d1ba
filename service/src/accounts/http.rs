//! HTTP handlers for account registration and login.

use std::sync::Arc;

use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use serde::{Deserialize, Serialize};

use super::store::{Account, AccountStore, AccountStoreError};
use crate::validation::validate_email_syntax;

/// Registration request payload.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: String,
    pub password: String,
}

/// Login request payload. Clients may send the full registration shape;
/// `name` is accepted and ignored.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration response.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
}

/// Login response.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: PublicAccount,
}

/// Account fields safe to echo back to a client. The password never appears
/// in any response.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicAccount {
    pub name: Option<String>,
    pub email: String,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Request-shape validation failures.
///
/// All variants map to 422 Unprocessable Entity; a malformed request never
/// reaches the store.
#[derive(Debug, PartialEq, Eq)]
enum CredentialsError {
    InvalidEmail,
    EmptyPassword,
}

impl std::fmt::Display for CredentialsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "email is not a valid address"),
            Self::EmptyPassword => write!(f, "password is required"),
        }
    }
}

impl IntoResponse for CredentialsError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Validate the credential fields shared by both routes. The original service
/// applies one schema to register and login alike, so both get the same
/// checks.
fn validate_credentials(email: &str, password: &str) -> Result<(), CredentialsError> {
    validate_email_syntax(email).map_err(|_| CredentialsError::InvalidEmail)?;
    if password.is_empty() {
        return Err(CredentialsError::EmptyPassword);
    }
    Ok(())
}

/// Create the account router.
pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Handle registration: append the candidate account if its email is unused.
async fn register(
    Extension(store): Extension<Arc<dyn AccountStore>>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    if let Err(e) = validate_credentials(&req.email, &req.password) {
        return e.into_response();
    }

    let candidate = Account {
        name: req.name,
        email: req.email,
        password: req.password,
    };

    match store.register(candidate).await {
        Ok(()) => (
            StatusCode::OK,
            Json(RegisterResponse {
                message: "account created".to_string(),
            }),
        )
            .into_response(),
        Err(AccountStoreError::DuplicateEmail) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                detail: "email already registered".to_string(),
            }),
        )
            .into_response(),
        Err(AccountStoreError::InvalidCredentials) => {
            // Unreachable from the register path
            tracing::error!("unexpected InvalidCredentials from register");
            internal_error()
        }
        Err(e) => storage_error_response(&e),
    }
}

/// Handle login: match the submitted credentials against stored accounts.
async fn login(
    Extension(store): Extension<Arc<dyn AccountStore>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    if let Err(e) = validate_credentials(&req.email, &req.password) {
        return e.into_response();
    }

    match store.authenticate(&req.email, &req.password).await {
        Ok(account) => (
            StatusCode::OK,
            Json(LoginResponse {
                message: "login successful".to_string(),
                user: PublicAccount {
                    name: account.name,
                    email: account.email,
                },
            }),
        )
            .into_response(),
        // One response for unknown email and wrong password alike, so the
        // endpoint cannot be used to enumerate accounts.
        Err(AccountStoreError::InvalidCredentials) => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                detail: "incorrect email or password".to_string(),
            }),
        )
            .into_response(),
        Err(AccountStoreError::DuplicateEmail) => {
            // Unreachable from the login path
            tracing::error!("unexpected DuplicateEmail from authenticate");
            internal_error()
        }
        Err(e) => storage_error_response(&e),
    }
}

fn internal_error() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            detail: "internal server error".to_string(),
        }),
    )
        .into_response()
}

fn storage_error_response(e: &AccountStoreError) -> axum::response::Response {
    tracing::error!("account store unavailable: {e}");
    internal_error()
}
