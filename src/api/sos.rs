//! SOS lifecycle endpoints.

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::{success, success_with_message, ApiResult};
use crate::auth::{require_admin, AuthUser};
use crate::errors::AppError;
use crate::models::{
    AssignTaskRequest, CreateSosRequest, GeoPoint, SosAnalytics, SosRequest, SosView,
    UpdateSosStatusRequest,
};
use crate::notify::NotificationIntent;
use crate::AppState;

/// POST /api/sos - Broadcast a new SOS alert.
pub async fn create_sos(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(request): Json<CreateSosRequest>,
) -> ApiResult<SosRequest> {
    let Some(location) = request.location.as_ref() else {
        return Err(AppError::Validation("GPS location is mandatory".to_string()));
    };
    let sos_type = match request.emergency_type.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Err(AppError::Validation("Emergency type is required".to_string())),
    };

    let point = GeoPoint::from(location);
    let sos = state
        .repo
        .create_sos(
            &caller.id,
            sos_type,
            request.description.as_deref(),
            request.image.as_deref(),
            &request.required_items,
            &point,
        )
        .await?;

    // Keep the reporter's last known location current. Best effort; the SOS
    // itself already carries the point.
    if let Err(e) = state.repo.update_user_location(&caller.id, &point).await {
        tracing::warn!("Failed to update reporter location: {}", e);
    }

    // Broadcast to everyone else. Fire-and-forget: dispatch failures never
    // fail or roll back the SOS creation.
    match state.repo.list_user_ids_except(&caller.id).await {
        Ok(recipients) => state.notifier.dispatch(NotificationIntent::SosBroadcast {
            sos_id: sos.id.clone(),
            sos_type: sos.sos_type.clone(),
            reporter_name: caller.full_name.clone(),
            recipients,
        }),
        Err(e) => tracing::warn!("Failed to resolve broadcast recipients: {}", e),
    }

    success_with_message(sos, "SOS broadcast successfully")
}

/// GET /api/sos - All SOS not yet resolved, for the dashboard and map.
pub async fn list_open_sos(
    State(state): State<AppState>,
    Extension(_caller): Extension<AuthUser>,
) -> ApiResult<Vec<SosView>> {
    success(state.repo.list_open_sos().await?)
}

/// GET /api/sos/my - The caller's own SOS requests.
pub async fn list_my_sos(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Vec<SosView>> {
    success(state.repo.list_sos_by_owner(&caller.id).await?)
}

/// GET /api/sos/history - Missions where the caller is the assigned volunteer.
pub async fn volunteer_history(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Vec<SosView>> {
    success(state.repo.list_volunteer_history(&caller.id).await?)
}

/// GET /api/sos/analytics - Full dataset projection for reporting.
pub async fn sos_analytics(
    State(state): State<AppState>,
    Extension(_caller): Extension<AuthUser>,
) -> ApiResult<Vec<SosAnalytics>> {
    success(state.repo.list_sos_analytics().await?)
}

/// PUT /api/sos/:id/accept - Volunteer claims an unassigned mission.
/// At-most-once: a concurrent second accept gets 409.
pub async fn accept_task(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<SosRequest> {
    let sos = state.repo.accept_sos(&id, &caller.id).await?;
    success(sos)
}

/// PUT /api/sos/:id/status - Overwrite an SOS status.
pub async fn update_sos_status(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSosStatusRequest>,
) -> ApiResult<SosRequest> {
    let sos = state
        .repo
        .update_sos_status(&id, request.status, &caller.id)
        .await?;
    success(sos)
}

/// PUT /api/sos/assign - Admin assigns a volunteer to a mission.
pub async fn assign_task(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(request): Json<AssignTaskRequest>,
) -> ApiResult<SosRequest> {
    require_admin(&caller)?;

    let sos = state
        .repo
        .assign_sos(&request.sos_id, &request.volunteer_id)
        .await?;

    state.notifier.dispatch(NotificationIntent::TaskAssigned {
        sos_id: sos.id.clone(),
        volunteer_id: request.volunteer_id,
    });

    success_with_message(sos, "Task assigned successfully")
}
