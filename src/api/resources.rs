//! Resource request lifecycle endpoints.

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::{success, success_with_message, ApiResult};
use crate::auth::{require_admin, AuthUser};
use crate::errors::AppError;
use crate::models::{
    CreateResourceRequest, RequestKind, ResourceRequest, ResourceView,
    UpdateResourceStatusRequest, Urgency,
};
use crate::AppState;

/// POST /api/resources - Create a supply request.
pub async fn create_resource(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(request): Json<CreateResourceRequest>,
) -> ApiResult<ResourceRequest> {
    if request.items.is_empty() {
        return Err(AppError::Validation(
            "Please add at least one item".to_string(),
        ));
    }
    if request
        .items
        .iter()
        .any(|item| item.item_category.trim().is_empty())
    {
        return Err(AppError::Validation(
            "Every item needs a category".to_string(),
        ));
    }

    // Snapshot the requester's last known location. The synthetic admin has
    // no stored location; it falls back to the origin point.
    let location = state
        .repo
        .get_user(&caller.id)
        .await?
        .map(|user| user.location)
        .unwrap_or_default();

    let created = state
        .repo
        .create_resource(
            &caller.id,
            request.kind.unwrap_or(RequestKind::Need),
            &request.items,
            request.urgency.unwrap_or(Urgency::Medium),
            request.notes.as_deref(),
            request.sos_id.as_deref(),
            &location,
        )
        .await?;

    success(created)
}

/// GET /api/resources - All pending requests, most urgent first.
pub async fn list_pending_resources(
    State(state): State<AppState>,
    Extension(_caller): Extension<AuthUser>,
) -> ApiResult<Vec<ResourceView>> {
    success(state.repo.list_pending_resources().await?)
}

/// GET /api/resources/my - The caller's own requests.
pub async fn list_my_resources(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Vec<ResourceRequest>> {
    success(state.repo.list_resources_by_user(&caller.id).await?)
}

/// GET /api/resources/donations - Pledges made by the caller as donor.
pub async fn list_my_donations(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Vec<ResourceView>> {
    success(state.repo.list_donations_by_donor(&caller.id).await?)
}

/// GET /api/resources/logistics - In-flight logistics queue.
pub async fn list_logistics_tasks(
    State(state): State<AppState>,
    Extension(_caller): Extension<AuthUser>,
) -> ApiResult<Vec<ResourceView>> {
    success(state.repo.list_logistics_tasks().await?)
}

/// GET /api/resources/distribution-history - Audit trail (admin).
pub async fn distribution_history(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Vec<ResourceView>> {
    require_admin(&caller)?;
    success(state.repo.list_distribution_history().await?)
}

/// PUT /api/resources/:id/fulfill - Donor pledges against a pending request.
pub async fn fulfill_resource(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<ResourceRequest> {
    let request = state.repo.fulfill_resource(&id, &caller.id).await?;
    success_with_message(request, "Pledge recorded")
}

/// PUT /api/resources/:id/status - Progress the logistics status.
pub async fn update_resource_status(
    State(state): State<AppState>,
    Extension(_caller): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateResourceStatusRequest>,
) -> ApiResult<ResourceRequest> {
    let updated = state.repo.update_resource_status(&id, request.status).await?;
    success(updated)
}

/// PUT /api/resources/:id/approve - Admin approves a restock request,
/// deducting the requested quantities from inventory.
pub async fn approve_resource(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<ResourceRequest> {
    require_admin(&caller)?;
    let request = state.repo.approve_resource(&id).await?;
    success_with_message(request, "Approved and stock deducted")
}

/// PUT /api/resources/:id/reject - Admin declines a pending request.
pub async fn reject_resource(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<ResourceRequest> {
    require_admin(&caller)?;
    let request = state.repo.reject_resource(&id).await?;
    success_with_message(request, "Request rejected")
}

/// PUT /api/resources/:id/absorb - Admin confirms physical receipt of a
/// fulfilled donation, adding its items to inventory.
pub async fn absorb_donation(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<ResourceRequest> {
    require_admin(&caller)?;
    let request = state.repo.absorb_donation(&id).await?;
    success_with_message(request, "Donation absorbed into inventory")
}
