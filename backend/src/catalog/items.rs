//! Per-(category, section) item collections.

use crate::catalog::snapshot::{self, ProductSnapshotResolver};
use crate::error::{CatalogError, Result};
use crate::store::{
    CollectionPath, DocumentPath, DocumentStore, Query, StoredDocument, WriteBatch, MAX_BATCH_OPERATIONS,
};
use catalog_common::model::category::SectionDescriptor;
use catalog_common::model::item::{ProductSnapshot, SectionItem, SectionItemPatch};
use catalog_common::model::report::{StaleItem, StaleReason};
use catalog_common::time::now;
use log::{debug, info, warn};
use serde_json::{json, Map};
use std::sync::Arc;

#[derive(Clone)]
pub struct SectionItemStore {
    store: Arc<dyn DocumentStore>,
    resolver: Arc<dyn ProductSnapshotResolver>,
}

impl SectionItemStore {
    pub fn new(store: Arc<dyn DocumentStore>, resolver: Arc<dyn ProductSnapshotResolver>) -> Self {
        Self { store, resolver }
    }

    pub fn get_item(&self, category_id: &str, section_id: &str, product_id: &str) -> Result<Option<SectionItem>> {
        let path = DocumentPath::item(category_id, section_id, product_id)?;
        match self.store.get_document(&path)? {
            Some(doc) => decode_item(&doc).map(Some),
            None => Ok(None),
        }
    }

    /// Validates a new item, captures its product snapshot and queues the
    /// create-if-absent write. Nothing is written until `batch` is committed.
    pub fn stage_add(
        &self,
        batch: &mut WriteBatch,
        category_id: &str,
        section: &SectionDescriptor,
        product_id: &str,
        rank: i64,
        price_override: Option<f64>,
    ) -> Result<SectionItem> {
        check_price_override(section, price_override)?;
        let path = DocumentPath::item(category_id, &section.section_id, product_id)?;

        if self.store.get_document(&path)?.is_some() {
            return Err(CatalogError::Conflict(format!(
                "Product {} already exists in section {}",
                product_id, section.section_id
            )));
        }

        let product = self
            .resolver
            .get_product(product_id)?
            .ok_or_else(|| CatalogError::NotFound(format!("Product {} not found", product_id)))?;
        let snapshot = snapshot::capture(product_id, &product)?;

        let at = now();
        let item = SectionItem {
            product_id: product_id.to_string(),
            rank,
            product: snapshot,
            added_at: at,
            created_at: at,
            updated_at: at,
            price_override,
        };
        batch.create(path, serde_json::to_value(&item)?);
        Ok(item)
    }

    /// Adds an item on its own, without touching the registry.
    pub fn add_item(
        &self,
        category_id: &str,
        section: &SectionDescriptor,
        product_id: &str,
        rank: i64,
        price_override: Option<f64>,
    ) -> Result<SectionItem> {
        let mut batch = WriteBatch::new();
        let item = self.stage_add(&mut batch, category_id, section, product_id, rank, price_override)?;
        self.store.commit(batch)?;
        info!("Added {} to {}/{}", product_id, category_id, section.section_id);
        Ok(item)
    }

    /// Delete-if-exists.
    pub fn remove_item(&self, category_id: &str, section_id: &str, product_id: &str) -> Result<()> {
        let path = DocumentPath::item(category_id, section_id, product_id)?;
        self.store.delete_document(&path)?;
        info!("Removed {} from {}/{}", product_id, category_id, section_id);
        Ok(())
    }

    /// Merges the supplied fields; `updatedAt` is refreshed even for an empty patch.
    pub fn update_item(
        &self,
        category_id: &str,
        section: &SectionDescriptor,
        product_id: &str,
        patch: &SectionItemPatch,
    ) -> Result<SectionItem> {
        check_price_override(section, patch.price_override)?;
        let path = DocumentPath::item(category_id, &section.section_id, product_id)?;

        let mut fields = Map::new();
        if let Some(rank) = patch.rank {
            fields.insert("rank".to_string(), json!(rank));
        }
        if let Some(price) = patch.price_override {
            fields.insert("priceOverride".to_string(), json!(price));
        }
        fields.insert("updatedAt".to_string(), serde_json::to_value(now())?);

        self.store.update_document(&path, fields).map_err(|e| match e {
            CatalogError::NotFound(_) => CatalogError::NotFound(format!(
                "Product {} is not in section {}",
                product_id, section.section_id
            )),
            other => other,
        })?;

        self.get_item(category_id, &section.section_id, product_id)?
            .ok_or_else(|| CatalogError::NotFound(format!("Product {} vanished during update", product_id)))
    }

    /// Items in display order: rank, then time added, then product id.
    ///
    /// A document that cannot be read as an item is logged and left out, so
    /// one bad record does not hide the rest of the section.
    pub fn list_items(&self, category_id: &str, section_id: &str) -> Result<Vec<SectionItem>> {
        let path = CollectionPath::section_items(category_id, section_id)?;
        let mut items: Vec<SectionItem> = self
            .store
            .list_collection(&path, &Query::new().order_by("rank"))?
            .iter()
            .filter_map(|doc| match decode_item(doc) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("Skipping item {} in {}: {}", doc.id, path, e);
                    None
                }
            })
            .collect();
        sort_for_display(&mut items);
        Ok(items)
    }

    /// Number of item documents, readable or not.
    pub fn count_items(&self, category_id: &str, section_id: &str) -> Result<usize> {
        let path = CollectionPath::section_items(category_id, section_id)?;
        Ok(self.store.list_collection(&path, &Query::new())?.len())
    }

    pub fn has_items(&self, category_id: &str, section_id: &str) -> Result<bool> {
        let path = CollectionPath::section_items(category_id, section_id)?;
        Ok(!self.store.list_collection(&path, &Query::new().limit(1))?.is_empty())
    }

    /// Up to `limit` item paths in id order, strictly after `after`.
    pub fn item_paths_after(
        &self,
        category_id: &str,
        section_id: &str,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<DocumentPath>> {
        let collection = CollectionPath::section_items(category_id, section_id)?;
        let mut query = Query::new().limit(limit);
        if let Some(cursor) = after {
            query = query.start_after(cursor);
        }
        self.store
            .list_collection(&collection, &query)?
            .iter()
            .map(|doc| collection.doc(&doc.id))
            .collect()
    }

    /// Items whose snapshot no longer matches the live product.
    pub fn stale_items(&self, category_id: &str, section_id: &str) -> Result<Vec<StaleItem>> {
        Ok(self
            .drift(category_id, section_id)?
            .into_iter()
            .map(|(item, fresh)| StaleItem {
                reason: match fresh {
                    Some(_) => StaleReason::Drifted,
                    None => StaleReason::ProductMissing,
                },
                product_id: item.product_id,
            })
            .collect())
    }

    /// Rewrites drifted snapshots and returns the refreshed product ids.
    ///
    /// Items whose product is gone are left as they are.
    pub fn refresh_snapshots(&self, category_id: &str, section_id: &str) -> Result<Vec<String>> {
        let mut refreshed = Vec::new();
        let mut batch = WriteBatch::new();

        for (item, fresh) in self.drift(category_id, section_id)? {
            let Some(fresh) = fresh else { continue };
            let mut fields = Map::new();
            fields.insert("product".to_string(), serde_json::to_value(&fresh)?);
            fields.insert("updatedAt".to_string(), serde_json::to_value(now())?);
            batch.update(DocumentPath::item(category_id, section_id, &item.product_id)?, fields);
            refreshed.push(item.product_id);

            if batch.len() == MAX_BATCH_OPERATIONS {
                self.store.commit(std::mem::take(&mut batch))?;
            }
        }
        self.store.commit(batch)?;

        if !refreshed.is_empty() {
            info!(
                "Refreshed {} snapshot(s) in {}/{}",
                refreshed.len(),
                category_id,
                section_id
            );
        }
        Ok(refreshed)
    }

    /// Pairs every out-of-date item with its fresh snapshot (`None` when the
    /// product no longer exists).
    fn drift(
        &self,
        category_id: &str,
        section_id: &str,
    ) -> Result<Vec<(SectionItem, Option<ProductSnapshot>)>> {
        let mut stale = Vec::new();
        for item in self.list_items(category_id, section_id)? {
            match self.resolver.get_product(&item.product_id)? {
                None => stale.push((item, None)),
                Some(product) => {
                    let fresh = snapshot::capture(&item.product_id, &product)?;
                    if fresh.fingerprint != item.product.fingerprint {
                        debug!("Snapshot of {} drifted", item.product_id);
                        stale.push((item, Some(fresh)));
                    }
                }
            }
        }
        Ok(stale)
    }
}

/// Legacy writers left the ids out when the product could not be read; the
/// document id is the product id.
fn decode_item(doc: &StoredDocument) -> Result<SectionItem> {
    let mut item: SectionItem = doc.decode()?;
    if item.product_id.is_empty() {
        item.product_id = doc.id.clone();
    }
    if item.product.product_id.is_empty() {
        item.product.product_id = item.product_id.clone();
    }
    Ok(item)
}

/// Overrides are only written for sections that accept them.
pub fn check_price_override(section: &SectionDescriptor, price_override: Option<f64>) -> Result<()> {
    let Some(price) = price_override else {
        return Ok(());
    };
    if !section.allows_price_override() {
        return Err(CatalogError::Validation(format!(
            "Section {} does not accept price overrides",
            section.section_id
        )));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(CatalogError::Validation(format!(
            "Price override must be a non-negative amount, got {}",
            price
        )));
    }
    Ok(())
}

pub fn sort_for_display(items: &mut [SectionItem]) {
    items.sort_by(|a, b| {
        a.rank
            .cmp(&b.rank)
            .then_with(|| a.added_at.cmp(&b.added_at))
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
}
