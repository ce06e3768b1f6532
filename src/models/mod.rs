//! Data models for the ResQ-Link disaster relief platform.
//!
//! Wire shapes match the frontend contract: camelCase field names and
//! GeoJSON-style longitude-first coordinates throughout.

mod contact;
mod inventory;
mod resource;
mod sos;
mod user;

pub use contact::*;
pub use inventory::*;
pub use resource::*;
pub use sos::*;
pub use user::*;

use serde::{Deserialize, Serialize};

/// GeoJSON-style point. Coordinates are always `[longitude, latitude]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type", default = "point_type")]
    pub kind: String,
    pub coordinates: [f64; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

fn point_type() -> String {
    "Point".to_string()
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: point_type(),
            coordinates: [longitude, latitude],
            accuracy: None,
        }
    }

    /// Default location for users who never reported one.
    pub fn origin() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }
}

impl Default for GeoPoint {
    fn default() -> Self {
        Self::origin()
    }
}

/// Client-side location input, latitude/longitude as named fields.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationInput {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
}

impl From<&LocationInput> for GeoPoint {
    fn from(input: &LocationInput) -> Self {
        Self {
            kind: point_type(),
            coordinates: [input.lng, input.lat],
            accuracy: input.accuracy,
        }
    }
}

/// A single requested supply line. Quantity is free-form text
/// ("2 boxes", "50") and is only parsed when stock moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedItem {
    pub item_category: String,
    pub quantity: String,
}
