//! Bearer-credential authentication module.
//!
//! Resolves `Authorization: Bearer <token>` to a caller identity and role.
//! The configured superuser token is recognized with a constant-time
//! comparison and never touches the store; all other tokens are opaque
//! session ids looked up in the database.

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::errors::{codes, ErrorDetails, ErrorResponse};
use crate::models::{Role, User, ADMIN_FULL_NAME, ADMIN_USER_ID};
use crate::AppState;

/// Caller context attached to every protected request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The synthetic identity behind the hardcoded superuser credential.
    pub fn superuser(email: &str) -> Self {
        Self {
            id: ADMIN_USER_ID.to_string(),
            full_name: ADMIN_FULL_NAME.to_string(),
            email: email.to_string(),
            phone: None,
            role: Role::Admin,
        }
    }
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            phone: Some(user.phone),
            role: user.role,
        }
    }
}

/// Authentication layer for all protected routes. Absence or invalidity of
/// the bearer credential is a hard 401; there is no anonymous fallback.
pub async fn auth_layer(state: AppState, request: Request, next: Next) -> Response {
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string());

    let Some(token) = bearer else {
        return unauthorized_response("Not authorized, no token");
    };

    // Superuser token bypasses the store entirely.
    if constant_time_compare(&token, &state.config.admin_token) {
        let admin = AuthUser::superuser(&state.config.admin_email);
        let mut request = request;
        request.extensions_mut().insert(admin);
        return next.run(request).await;
    }

    match state.repo.get_session_user(&token).await {
        Ok(Some(user)) => {
            let mut request = request;
            request.extensions_mut().insert(AuthUser::from(user));
            next.run(request).await
        }
        Ok(None) => unauthorized_response("Not authorized, token failed"),
        Err(e) => {
            tracing::error!("Session lookup failed: {}", e);
            unauthorized_response("Not authorized, token failed")
        }
    }
}

/// Guard clause for admin-only operations.
pub fn require_admin(caller: &AuthUser) -> Result<(), crate::errors::AppError> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(crate::errors::AppError::Forbidden(
            "Admin access required".to_string(),
        ))
    }
}

/// Perform constant-time string comparison.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Hash a password with a fresh random salt. Stored as `salt$digest`, hex.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt_hex = hex::encode(salt);
    format!("{}${}", salt_hex, digest_with_salt(&salt_hex, password))
}

/// Verify a password against a stored `salt$digest` value.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest)) = stored.split_once('$') else {
        return false;
    };
    constant_time_compare(&digest_with_salt(salt_hex, password), digest)
}

fn digest_with_salt(salt_hex: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt_hex.as_bytes());
    hasher.update(b"$");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Create an unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    let body = ErrorResponse {
        success: false,
        error: ErrorDetails {
            code: codes::UNAUTHORIZED.to_string(),
            message: message.to_string(),
        },
    };

    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
