//! Category documents and the section registry embedded in them.

use crate::time::{lenient, now};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Section type that historically unlocked per-item price overrides.
///
/// Only consulted for descriptors written before the explicit
/// `allowsPriceOverride` flag existed.
pub const FLASH_SALE_TYPE: &str = "flashSale";

/// Top-level record for one category: identity, display title and the ordered
/// registry of its sections. Stored at `categories/{categoryId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDocument {
    pub category_id: String,
    pub title: String,
    /// Insertion order is display order.
    #[serde(default)]
    pub sections: Vec<SectionDescriptor>,
    #[serde(deserialize_with = "lenient::deserialize", default = "now")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "lenient::deserialize", default = "now")]
    pub updated_at: DateTime<Utc>,
}

impl CategoryDocument {
    pub fn new(category_id: impl Into<String>, title: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            category_id: category_id.into(),
            title: title.into(),
            sections: Vec::new(),
            created_at: at,
            updated_at: at,
        }
    }

    pub fn section(&self, section_id: &str) -> Option<&SectionDescriptor> {
        self.sections.iter().find(|s| s.section_id == section_id)
    }

    pub fn has_section(&self, section_id: &str) -> bool {
        self.section(section_id).is_some()
    }

    pub fn section_ids(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.section_id.clone()).collect()
    }
}

/// Registry entry describing one named section of a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDescriptor {
    pub section_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub section_type: String,
    /// Explicit capability flag. `None` on legacy descriptors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allows_price_override: Option<bool>,
    #[serde(deserialize_with = "lenient::deserialize", default = "now")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "lenient::deserialize", default = "now")]
    pub updated_at: DateTime<Utc>,
}

impl SectionDescriptor {
    pub fn new(
        section_id: impl Into<String>,
        title: impl Into<String>,
        section_type: impl Into<String>,
        allows_price_override: Option<bool>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            section_id: section_id.into(),
            title: title.into(),
            section_type: section_type.into(),
            allows_price_override,
            created_at: at,
            updated_at: at,
        }
    }

    /// Whether items of this section may carry a price override.
    pub fn allows_price_override(&self) -> bool {
        self.allows_price_override
            .unwrap_or(self.section_type == FLASH_SALE_TYPE)
    }
}

/// Partial update of a [`SectionDescriptor`]. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDescriptorPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub section_type: Option<String>,
    #[serde(default)]
    pub allows_price_override: Option<bool>,
}

impl SectionDescriptorPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.section_type.is_none() && self.allows_price_override.is_none()
    }

    pub fn apply(&self, descriptor: &mut SectionDescriptor, at: DateTime<Utc>) {
        if let Some(title) = &self.title {
            descriptor.title = title.trim().to_string();
        }
        if let Some(section_type) = &self.section_type {
            descriptor.section_type = section_type.trim().to_string();
        }
        if let Some(allows) = self.allows_price_override {
            descriptor.allows_price_override = Some(allows);
        }
        descriptor.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_flash_sale_descriptor_allows_override() {
        let descriptor: SectionDescriptor = serde_json::from_value(json!({
            "sectionId": "flashSale",
            "title": "Flash Sale",
            "type": "flashSale",
            "createdAt": {"_seconds": 1_700_000_000, "_nanoseconds": 0},
        }))
        .unwrap();

        assert_eq!(descriptor.allows_price_override, None);
        assert!(descriptor.allows_price_override());
        assert_eq!(descriptor.created_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn explicit_flag_wins_over_type() {
        let at = now();
        let revoked = SectionDescriptor::new("flashSale", "Flash Sale", FLASH_SALE_TYPE, Some(false), at);
        assert!(!revoked.allows_price_override());

        let granted = SectionDescriptor::new("clearance", "Clearance", "clearance", Some(true), at);
        assert!(granted.allows_price_override());

        let plain = SectionDescriptor::new("bestSellers", "Best Sellers", "bestSellers", None, at);
        assert!(!plain.allows_price_override());
    }

    #[test]
    fn serialized_descriptor_uses_type_key() {
        let descriptor = SectionDescriptor::new("popular", "Popular", "popular", None, now());
        let value = serde_json::to_value(&descriptor).unwrap();

        assert_eq!(value["type"], "popular");
        assert_eq!(value["sectionId"], "popular");
        assert!(value.get("allowsPriceOverride").is_none());
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let created = now();
        let mut descriptor = SectionDescriptor::new("popular", "Popular", "popular", None, created);
        let patch = SectionDescriptorPatch {
            title: Some("  Most Popular ".into()),
            ..Default::default()
        };

        let later = created + chrono::Duration::seconds(5);
        patch.apply(&mut descriptor, later);

        assert_eq!(descriptor.title, "Most Popular");
        assert_eq!(descriptor.section_type, "popular");
        assert_eq!(descriptor.created_at, created);
        assert_eq!(descriptor.updated_at, later);
    }

    #[test]
    fn category_without_sections_field_reads_as_empty() {
        let category: CategoryDocument =
            serde_json::from_value(json!({"categoryId": "toys", "title": "Toys"})).unwrap();
        assert!(category.sections.is_empty());
        assert!(!category.has_section("flashSale"));
    }
}
