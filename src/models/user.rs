//! User identity and role model.

use serde::{Deserialize, Serialize};

use super::GeoPoint;

/// Sentinel id used for the hardcoded superuser, which never exists in the store.
pub const ADMIN_USER_ID: &str = "0000-ADMIN-ID";

/// Display name for the hardcoded superuser.
pub const ADMIN_FULL_NAME: &str = "System Administrator";

/// Caller role. Users may switch between the first three at login;
/// admin is never assigned or removed through self-service paths.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Victim,
    Volunteer,
    Donor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Victim => "victim",
            Role::Volunteer => "volunteer",
            Role::Donor => "donor",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "victim" => Some(Role::Victim),
            "volunteer" => Some(Role::Volunteer),
            "donor" => Some(Role::Donor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Roles a user may switch to at login or via profile update.
    pub fn is_switchable(&self) -> bool {
        !matches!(self, Role::Admin)
    }
}

/// A registered user. The password digest never leaves the repository layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub location: GeoPoint,
    pub created_at: String,
    pub updated_at: String,
}

/// Minimal user projection attached to enriched read responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Body returned by register/login/profile endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    pub token: String,
}

/// Request body for POST /api/auth/register.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Request body for POST /api/auth/login. A supplied role is a switch request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Request body for PUT /api/auth/profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Request body for PUT /api/auth/users/:id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRoleRequest {
    pub role: String,
}

/// Request body for POST /api/auth/forgot-password.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Request body for POST /api/auth/reset-password.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}
