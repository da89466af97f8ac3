use crate::model::nullable;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical product record as the product catalog stores it at
/// `products/{productId}`.
///
/// Missing or `null` fields default the way the admin console always treated
/// them: empty strings, zero amounts and `isActive = true`. Timestamps are kept raw so
/// the snapshot capture can validate them strictly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub price: f64,
    #[serde(default)]
    pub mrp: Option<f64>,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub discount_price: f64,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub image: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub stock: i64,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub category_id: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub subcategory_id: String,
    #[serde(default = "default_active", deserialize_with = "nullable::or_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Value>,
}

fn default_active() -> bool {
    true
}
