//! Read models produced by discovery, cascade deletion and snapshot checks.

use crate::model::category::{CategoryDocument, SectionDescriptor};
use crate::model::item::SectionItem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What the registry says versus what the item collections hold for one
/// category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryReport {
    pub category_id: String,
    /// Section ids from the registry, in display order.
    pub registered: Vec<String>,
    /// Probed section ids that hold at least one item.
    pub with_items: Vec<String>,
    /// Sections with items but no descriptor.
    pub orphaned: Vec<String>,
    /// Registered sections without any items.
    pub empty: Vec<String>,
    /// Descriptors written by a reconcile run.
    #[serde(default)]
    pub repaired: Vec<String>,
}

impl DiscoveryReport {
    /// Every section holding items has a descriptor.
    pub fn is_consistent(&self) -> bool {
        self.orphaned.is_empty()
    }
}

/// A section item together with the price the home page shows for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedItem {
    #[serde(flatten)]
    pub item: SectionItem,
    pub effective_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionListing {
    pub section_id: String,
    /// `None` for an orphaned section found by probing.
    pub descriptor: Option<SectionDescriptor>,
    pub items: Vec<ListedItem>,
}

/// Everything the home page needs for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryListing {
    pub category_id: String,
    pub category: Option<CategoryDocument>,
    pub sections: Vec<SectionListing>,
}

/// Outcome of a cascade section deletion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeReport {
    pub category_id: String,
    pub section_id: String,
    pub deleted_items: usize,
    pub chunks: usize,
    /// Resume cursor: last item id whose deletion was committed.
    pub last_deleted_id: Option<String>,
    pub descriptor_removed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StaleReason {
    /// The live product differs from the embedded snapshot.
    Drifted,
    /// The product no longer exists in the catalog.
    ProductMissing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaleItem {
    pub product_id: String,
    pub reason: StaleReason,
}

/// Summary a finished reconcile-all job reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSummary {
    pub categories: usize,
    pub failed: usize,
    /// category id -> section ids whose descriptors were restored
    pub repaired: BTreeMap<String, Vec<String>>,
}

/// Per-product outcome of a bulk add.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemResult {
    pub id: String,
    pub success: bool,
    pub message: String,
}

/// `{totalProcessed, successCount, failedCount, results}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAddReport {
    pub total_processed: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub results: Vec<BulkItemResult>,
}

impl BulkAddReport {
    pub fn record(&mut self, id: impl Into<String>, success: bool, message: impl Into<String>) {
        if success {
            self.success_count += 1;
        } else {
            self.failed_count += 1;
        }
        self.results.push(BulkItemResult {
            id: id.into(),
            success,
            message: message.into(),
        });
    }
}
