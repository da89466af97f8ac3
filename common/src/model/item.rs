//! Ranked section items and the product snapshot they embed.

use crate::model::category::SectionDescriptor;
use crate::model::nullable;
use crate::time::{lenient, lenient_option, now};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time copy of the product fields a section listing renders.
///
/// It is not refreshed automatically; `fingerprint` lets the service detect
/// drift against the live product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub product_id: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
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
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "lenient_option::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_option::deserialize")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub fingerprint: String,
}

impl ProductSnapshot {
    /// Selling price: the discount price when it is a real discount.
    pub fn selling_price(&self) -> f64 {
        if self.discount_price > 0.0 && self.discount_price < self.price {
            self.discount_price
        } else {
            self.price
        }
    }
}

/// One product's ranked entry in a category section. Stored at
/// `categories/{categoryId}/sections/{sectionId}/items/{productId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionItem {
    /// Empty on legacy documents; the store fills it from the document id.
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub product_id: String,
    pub rank: i64,
    #[serde(default)]
    pub product: ProductSnapshot,
    #[serde(deserialize_with = "lenient::deserialize", default = "now")]
    pub added_at: DateTime<Utc>,
    #[serde(deserialize_with = "lenient::deserialize", default = "now")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "lenient::deserialize", default = "now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_override: Option<f64>,
}

impl SectionItem {
    /// Price shown in the section. An override only counts while the owning
    /// section still allows overrides.
    pub fn effective_price(&self, section: &SectionDescriptor) -> f64 {
        match self.price_override {
            Some(price) if section.allows_price_override() => price,
            _ => self.product.selling_price(),
        }
    }
}

/// Partial update of a [`SectionItem`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionItemPatch {
    #[serde(default)]
    pub rank: Option<i64>,
    #[serde(default)]
    pub price_override: Option<f64>,
}

impl SectionItemPatch {
    pub fn is_empty(&self) -> bool {
        self.rank.is_none() && self.price_override.is_none()
    }
}
