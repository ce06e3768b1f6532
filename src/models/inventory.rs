//! Inventory ledger model.

use serde::{Deserialize, Serialize};

/// Stock category for an inventory line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ItemCategory {
    Food,
    Water,
    Medical,
    Clothing,
    Equipment,
    Other,
}

impl ItemCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCategory::Food => "Food",
            ItemCategory::Water => "Water",
            ItemCategory::Medical => "Medical",
            ItemCategory::Clothing => "Clothing",
            ItemCategory::Equipment => "Equipment",
            ItemCategory::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Food" => Some(ItemCategory::Food),
            "Water" => Some(ItemCategory::Water),
            "Medical" => Some(ItemCategory::Medical),
            "Clothing" => Some(ItemCategory::Clothing),
            "Equipment" => Some(ItemCategory::Equipment),
            "Other" => Some(ItemCategory::Other),
            _ => None,
        }
    }
}

/// Stock level derived purely from quantity; never set independently.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StockStatus {
    #[serde(rename = "In Stock")]
    InStock,
    #[serde(rename = "Low Stock")]
    LowStock,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl StockStatus {
    /// 0 is out of stock, 1..=9 is low, 10 and above is in stock.
    pub fn for_quantity(quantity: i64) -> Self {
        if quantity <= 0 {
            StockStatus::OutOfStock
        } else if quantity < 10 {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "In Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::OutOfStock => "Out of Stock",
        }
    }
}

/// A named, categorized stock line in the global inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub item_name: String,
    pub category: ItemCategory,
    pub quantity: i64,
    /// Unit label, e.g. "kg", "liters", "boxes".
    pub unit: String,
    pub status: StockStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for POST /api/inventory. Category arrives as a string so
/// out-of-set values surface as a validation error rather than a parse failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInventoryItemRequest {
    pub item_name: String,
    pub category: String,
    pub quantity: i64,
    pub unit: String,
}

/// Request body for PUT /api/inventory/:id. Either an absolute quantity
/// or a delta for the increment/decrement controls.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStockRequest {
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub delta: Option<i64>,
}
