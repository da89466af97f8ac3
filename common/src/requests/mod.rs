//! Request payloads accepted by the home-section API.

use serde::{Deserialize, Serialize};

pub use crate::model::category::SectionDescriptorPatch as UpdateSectionRequest;
pub use crate::model::item::SectionItemPatch as UpdateItemRequest;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnsureCategoryRequest {
    /// Display title used only when the category has to be created.
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSectionRequest {
    pub section_id: String,
    pub title: String,
    /// Defaults to the section id.
    #[serde(default, rename = "type")]
    pub section_type: Option<String>,
    #[serde(default)]
    pub allows_price_override: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
    pub rank: i64,
    #[serde(default)]
    pub price_override: Option<f64>,
}

/// Products appended after the current last rank, in the order given.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAddItemsRequest {
    pub product_ids: Vec<String>,
    /// Applied to every added item; the section must accept overrides.
    #[serde(default)]
    pub price_override: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSectionQuery {
    #[serde(default)]
    pub resume_after: Option<String>,
}

/// `?probe=flashSale,bestSellers`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeQuery {
    #[serde(default)]
    pub probe: Option<String>,
}

impl ProbeQuery {
    /// Caller-supplied probe candidates, or `None` to use the configured list.
    pub fn candidates(&self) -> Option<Vec<String>> {
        self.probe.as_ref().map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileRequest {
    #[serde(default)]
    pub candidates: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStarted {
    pub job_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_query_splits_and_trims() {
        let query = ProbeQuery {
            probe: Some(" flashSale, ,bestSellers ".into()),
        };
        assert_eq!(
            query.candidates(),
            Some(vec!["flashSale".to_string(), "bestSellers".to_string()])
        );
        assert_eq!(ProbeQuery::default().candidates(), None);
    }
}
