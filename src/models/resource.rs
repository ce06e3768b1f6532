//! Resource (supply) request model and lifecycle types.

use serde::{Deserialize, Serialize};

use super::{GeoPoint, RequestedItem, UserSummary};

/// Urgency of a supply request, used for triage ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "Low",
            Urgency::Medium => "Medium",
            Urgency::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Low" => Some(Urgency::Low),
            "Medium" => Some(Urgency::Medium),
            "High" => Some(Urgency::High),
            _ => None,
        }
    }
}

/// Discriminates the two request flavors that share a status vocabulary:
/// a `need` is victim-initiated and fulfilled by a donor pledge, while a
/// `restock` is volunteer-initiated against global inventory and moves
/// stock on admin approval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Need,
    Restock,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Need => "need",
            RequestKind::Restock => "restock",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "need" => Some(RequestKind::Need),
            "restock" => Some(RequestKind::Restock),
            _ => None,
        }
    }
}

/// Resource request lifecycle status.
///
/// Donor path: pending -> fulfilled -> collected -> delivered.
/// Restock path: pending -> dispatched -> collected -> delivered.
/// Either path may terminate at rejected while still pending.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    Pending,
    Fulfilled,
    Dispatched,
    Collected,
    Delivered,
    Rejected,
}

impl ResourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceStatus::Pending => "pending",
            ResourceStatus::Fulfilled => "fulfilled",
            ResourceStatus::Dispatched => "dispatched",
            ResourceStatus::Collected => "collected",
            ResourceStatus::Delivered => "delivered",
            ResourceStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ResourceStatus::Pending),
            "fulfilled" => Some(ResourceStatus::Fulfilled),
            "dispatched" => Some(ResourceStatus::Dispatched),
            "collected" => Some(ResourceStatus::Collected),
            "delivered" => Some(ResourceStatus::Delivered),
            "rejected" => Some(ResourceStatus::Rejected),
            _ => None,
        }
    }
}

/// A supply request, optionally tied to an SOS via `sos_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequest {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sos_id: Option<String>,
    pub kind: RequestKind,
    pub items: Vec<RequestedItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor_id: Option<String>,
    pub urgency: Urgency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: ResourceStatus,
    /// Snapshot of the requester's last known location at creation time.
    pub location: GeoPoint,
    pub created_at: String,
    pub updated_at: String,
}

/// Read-path projection of a resource request enriched with user summaries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceView {
    #[serde(flatten)]
    pub request: ResourceRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor: Option<UserSummary>,
}

/// Request body for POST /api/resources.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResourceRequest {
    #[serde(default)]
    pub items: Vec<RequestedItem>,
    #[serde(default)]
    pub urgency: Option<Urgency>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub sos_id: Option<String>,
    #[serde(default)]
    pub kind: Option<RequestKind>,
}

/// Request body for PUT /api/resources/:id/status.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResourceStatusRequest {
    pub status: ResourceStatus,
}
