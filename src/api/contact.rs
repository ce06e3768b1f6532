//! Contact/inquiry endpoints.

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::{success, success_with_message, ApiResult};
use crate::auth::{require_admin, AuthUser};
use crate::errors::AppError;
use crate::models::{ContactMessage, SubmitContactRequest, UpdateContactStatusRequest};
use crate::AppState;

/// POST /api/contact - Submit an inquiry. Public, no auth required.
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(request): Json<SubmitContactRequest>,
) -> ApiResult<ContactMessage> {
    if request.first_name.trim().is_empty()
        || request.email.trim().is_empty()
        || request.message.trim().is_empty()
    {
        return Err(AppError::Validation(
            "Please fill in all required fields".to_string(),
        ));
    }

    let subject = request
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("General Inquiry");

    let message = state
        .repo
        .create_contact_message(
            request.first_name.trim(),
            request.last_name.trim(),
            request.email.trim(),
            subject,
            request.message.trim(),
        )
        .await?;

    success_with_message(message, "Message sent successfully")
}

/// GET /api/contact - List all inquiries (admin).
pub async fn list_contact_messages(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Vec<ContactMessage>> {
    require_admin(&caller)?;
    success(state.repo.list_contact_messages().await?)
}

/// PUT /api/contact/:id/status - Update an inquiry's triage status (admin).
pub async fn update_contact_status(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateContactStatusRequest>,
) -> ApiResult<ContactMessage> {
    require_admin(&caller)?;
    success(state.repo.update_contact_status(&id, request.status).await?)
}
