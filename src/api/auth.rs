//! Authentication and user management endpoints.

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::{success, success_with_message, ApiResult};
use crate::auth::{
    constant_time_compare, hash_password, require_admin, verify_password, AuthUser,
};
use crate::errors::AppError;
use crate::models::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    Role, UpdateProfileRequest, UpdateUserRoleRequest, User, UserSummary, ADMIN_FULL_NAME,
    ADMIN_USER_ID,
};
use crate::notify::NotificationIntent;
use crate::AppState;

/// POST /api/auth/register - Register a new user.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    if request.full_name.trim().is_empty()
        || request.email.trim().is_empty()
        || request.phone.trim().is_empty()
        || request.password.is_empty()
    {
        return Err(AppError::Validation(
            "Full name, email, phone and password are required".to_string(),
        ));
    }

    let role = match request.role.as_deref() {
        None => Role::Victim,
        Some(raw) => match Role::parse(raw) {
            Some(role) if role.is_switchable() => role,
            Some(_) => {
                return Err(AppError::Validation(
                    "Cannot self-register as admin".to_string(),
                ))
            }
            None => return Err(AppError::Validation(format!("Invalid role '{}'", raw))),
        },
    };

    let password_hash = hash_password(&request.password);
    let user = state
        .repo
        .create_user(
            request.full_name.trim(),
            request.email.trim(),
            request.phone.trim(),
            &password_hash,
            role,
        )
        .await?;

    let token = state.repo.create_session(&user.id).await?;
    success(auth_response(user, token))
}

/// POST /api/auth/login - Login, optionally switching the caller's role.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    // Superuser credentials bypass the store.
    if is_superuser_credentials(&state, &request.email, &request.password) {
        return success(superuser_response(&state));
    }

    let Some((mut user, password_hash)) = state.repo.get_user_auth(request.email.trim()).await?
    else {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    };

    if !verify_password(&request.password, &password_hash) {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    // Role switch on login: victims/volunteers/donors may move between those
    // roles; an admin account is never downgraded by this path.
    if let Some(requested) = request.role.as_deref().and_then(Role::parse) {
        if requested.is_switchable() && user.role != Role::Admin && user.role != requested {
            tracing::info!(
                "Switching role for {}: {} -> {}",
                user.email,
                user.role.as_str(),
                requested.as_str()
            );
            user = state
                .repo
                .update_user_profile(&user.id, None, None, Some(requested))
                .await?;
        } else if user.role == Role::Admin && requested != Role::Admin {
            tracing::warn!("Blocked attempt to downgrade admin {}", user.email);
        }
    }

    let token = state.repo.create_session(&user.id).await?;
    success(auth_response(user, token))
}

/// POST /api/auth/admin-login - Superuser login only.
pub async fn admin_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    if is_superuser_credentials(&state, &request.email, &request.password) {
        success(superuser_response(&state))
    } else {
        Err(AppError::Unauthorized(
            "Invalid admin credentials".to_string(),
        ))
    }
}

/// PUT /api/auth/profile - Update the caller's own profile.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<AuthResponse> {
    if caller.id == ADMIN_USER_ID {
        return Err(AppError::Forbidden(
            "The superuser profile is fixed".to_string(),
        ));
    }

    let role = match request.role.as_deref() {
        None => None,
        Some(raw) => {
            let requested = Role::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("Invalid role '{}'", raw)))?;
            if caller.role == Role::Admin && requested != Role::Admin {
                return Err(AppError::Forbidden(
                    "Admin accounts cannot be downgraded".to_string(),
                ));
            }
            if requested == Role::Admin && caller.role != Role::Admin {
                return Err(AppError::Forbidden(
                    "Cannot self-promote to admin".to_string(),
                ));
            }
            Some(requested)
        }
    };

    let user = state
        .repo
        .update_user_profile(
            &caller.id,
            request.full_name.as_deref().map(str::trim),
            request.phone.as_deref().map(str::trim),
            role,
        )
        .await?;

    let token = state.repo.create_session(&user.id).await?;
    success(auth_response(user, token))
}

/// GET /api/auth/users - List all users (admin).
pub async fn list_users(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Vec<User>> {
    require_admin(&caller)?;
    success(state.repo.list_users().await?)
}

/// PUT /api/auth/users/:id - Change a user's role (admin).
pub async fn set_user_role(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateUserRoleRequest>,
) -> ApiResult<User> {
    require_admin(&caller)?;

    let role = Role::parse(&request.role)
        .ok_or_else(|| AppError::Validation(format!("Invalid role '{}'", request.role)))?;

    let user = state
        .repo
        .update_user_profile(&id, None, None, Some(role))
        .await?;
    success(user)
}

/// DELETE /api/auth/users/:id - Remove a user (admin).
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    require_admin(&caller)?;
    state.repo.delete_user(&id).await?;
    success_with_message((), "User removed")
}

/// GET /api/sos/volunteers-list - Users holding the volunteer role (admin).
pub async fn list_volunteers(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Vec<UserSummary>> {
    require_admin(&caller)?;
    success(state.repo.list_volunteers().await?)
}

/// POST /api/auth/forgot-password - Request a password reset.
///
/// Always answers the same way so the endpoint cannot be used to probe
/// which emails are registered.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> ApiResult<()> {
    if request.email.trim().is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }

    let token = uuid::Uuid::new_v4().to_string();
    if let Some(user) = state.repo.set_reset_token(request.email.trim(), &token).await? {
        state.notifier.dispatch(NotificationIntent::PasswordReset {
            user_id: user.id,
            email: user.email,
            token,
        });
    }

    success_with_message((), "If that email is registered, a reset link has been sent")
}

/// POST /api/auth/reset-password - Consume a reset token.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> ApiResult<()> {
    if request.token.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Token and new password are required".to_string(),
        ));
    }

    let password_hash = hash_password(&request.password);
    state
        .repo
        .reset_password(request.token.trim(), &password_hash)
        .await?;

    success_with_message((), "Password updated")
}

fn is_superuser_credentials(state: &AppState, email: &str, password: &str) -> bool {
    // Both comparisons run unconditionally to keep timing uniform.
    let email_ok = constant_time_compare(email.trim(), &state.config.admin_email);
    let password_ok = constant_time_compare(password, &state.config.admin_password);
    email_ok && password_ok
}

fn superuser_response(state: &AppState) -> AuthResponse {
    AuthResponse {
        id: ADMIN_USER_ID.to_string(),
        full_name: ADMIN_FULL_NAME.to_string(),
        email: state.config.admin_email.clone(),
        phone: None,
        role: Role::Admin,
        token: state.config.admin_token.clone(),
    }
}

fn auth_response(user: User, token: String) -> AuthResponse {
    AuthResponse {
        id: user.id,
        full_name: user.full_name,
        email: user.email,
        phone: Some(user.phone),
        role: user.role,
        token,
    }
}
