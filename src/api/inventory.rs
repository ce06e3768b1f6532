//! Inventory ledger endpoints.

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::{success, success_with_message, ApiResult};
use crate::auth::{require_admin, AuthUser};
use crate::errors::AppError;
use crate::models::{CreateInventoryItemRequest, InventoryItem, ItemCategory, UpdateStockRequest};
use crate::AppState;

/// GET /api/inventory - List all stock lines, newest first.
pub async fn list_inventory(
    State(state): State<AppState>,
    Extension(_caller): Extension<AuthUser>,
) -> ApiResult<Vec<InventoryItem>> {
    success(state.repo.list_inventory().await?)
}

/// POST /api/inventory - Add a stock line (admin).
pub async fn add_inventory_item(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(request): Json<CreateInventoryItemRequest>,
) -> ApiResult<InventoryItem> {
    require_admin(&caller)?;

    if request.item_name.trim().is_empty() {
        return Err(AppError::Validation("Item name is required".to_string()));
    }
    let category = ItemCategory::parse(request.category.trim()).ok_or_else(|| {
        AppError::Validation(format!("Invalid category '{}'", request.category))
    })?;
    if request.quantity < 0 {
        return Err(AppError::Validation(
            "Quantity must be a non-negative integer".to_string(),
        ));
    }
    if request.unit.trim().is_empty() {
        return Err(AppError::Validation("Unit label is required".to_string()));
    }

    let item = state
        .repo
        .add_inventory_item(
            request.item_name.trim(),
            category,
            request.quantity,
            request.unit.trim(),
        )
        .await?;
    success(item)
}

/// PUT /api/inventory/:id - Overwrite quantity, or adjust it by a delta.
pub async fn update_stock(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStockRequest>,
) -> ApiResult<InventoryItem> {
    require_admin(&caller)?;

    let item = match (request.quantity, request.delta) {
        (Some(quantity), _) => {
            if quantity < 0 {
                return Err(AppError::Validation(
                    "Quantity must be a non-negative integer".to_string(),
                ));
            }
            state.repo.set_inventory_quantity(&id, quantity).await?
        }
        (None, Some(delta)) => state.repo.adjust_inventory_quantity(&id, delta).await?,
        (None, None) => {
            return Err(AppError::Validation(
                "Provide either quantity or delta".to_string(),
            ))
        }
    };

    success(item)
}

/// DELETE /api/inventory/:id - Remove a stock line (admin). Idempotent.
pub async fn remove_inventory_item(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    require_admin(&caller)?;
    state.repo.remove_inventory_item(&id).await?;
    success_with_message((), "Item removed")
}
