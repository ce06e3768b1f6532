//! REST API module.
//!
//! Contains all API routes and handlers following the frontend contract.

mod auth;
mod contact;
mod inventory;
mod resources;
mod sos;

pub use auth::*;
pub use contact::*;
pub use inventory::*;
pub use resources::*;
pub use sos::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, crate::errors::AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Create a successful API response with a human-readable message.
pub fn success_with_message<T: Serialize>(data: T, message: &str) -> ApiResult<T> {
    Ok(ApiResponse {
        success: true,
        data,
        message: Some(message.to_string()),
    })
}
