//! SOS incident model and lifecycle types.

use serde::{Deserialize, Serialize};

use super::{GeoPoint, LocationInput, RequestedItem, ResourceRequest, UserSummary};

/// SOS lifecycle status. `resolved` and `cancelled` are terminal by
/// convention; transitions are not enforced (see updateStatus).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SosStatus {
    Pending,
    Accepted,
    Resolved,
    Cancelled,
}

impl SosStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SosStatus::Pending => "pending",
            SosStatus::Accepted => "accepted",
            SosStatus::Resolved => "resolved",
            SosStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SosStatus::Pending),
            "accepted" => Some(SosStatus::Accepted),
            "resolved" => Some(SosStatus::Resolved),
            "cancelled" => Some(SosStatus::Cancelled),
            _ => None,
        }
    }
}

/// An emergency incident reported by a victim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosRequest {
    pub id: String,
    /// Reporting user (owner, immutable).
    pub user_id: String,
    /// Incident category (Medical, Fire, Flood, ...). Free-form.
    #[serde(rename = "type")]
    pub sos_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional image payload (data URI).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub required_items: Vec<RequestedItem>,
    pub location: GeoPoint,
    pub status: SosStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_volunteer: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Read-path projection of an SOS enriched with related entities.
/// `linked_resources` is recomputed from the store on every read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SosView {
    #[serde(flatten)]
    pub sos: SosRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volunteer: Option<UserSummary>,
    pub linked_resources: Vec<ResourceRequest>,
}

/// Minimal projection for aggregate reporting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SosAnalytics {
    pub id: String,
    #[serde(rename = "type")]
    pub sos_type: String,
    pub status: SosStatus,
    pub created_at: String,
    pub location: GeoPoint,
}

/// Request body for POST /api/sos.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSosRequest {
    pub location: Option<LocationInput>,
    pub emergency_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub required_items: Vec<RequestedItem>,
}

/// Request body for PUT /api/sos/:id/status.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSosStatusRequest {
    pub status: SosStatus,
}

/// Request body for PUT /api/sos/assign.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignTaskRequest {
    pub sos_id: String,
    pub volunteer_id: String,
}
