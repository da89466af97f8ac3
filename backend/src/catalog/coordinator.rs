//! Multi-document write flows that keep the registry and the item
//! collections in step, plus the cache notification after each write.

use crate::catalog::cascade::CascadeDeleter;
use crate::catalog::invalidation::{notify, CacheInvalidator, InvalidationScope};
use crate::catalog::items::{self, SectionItemStore};
use crate::catalog::registry::{self, CategorySectionRegistry, VersionedCategory};
use crate::catalog::snapshot::ProductSnapshotResolver;
use crate::catalog::titles;
use crate::error::{CatalogError, Result};
use crate::store::{validate_segment, DocumentPath, DocumentStore, WriteBatch, MAX_BATCH_OPERATIONS};
use catalog_common::model::category::{CategoryDocument, SectionDescriptor, SectionDescriptorPatch};
use catalog_common::model::item::{SectionItem, SectionItemPatch};
use catalog_common::model::report::{BulkAddReport, CascadeReport};
use catalog_common::time::now;
use log::info;
use std::collections::HashSet;
use std::sync::Arc;

/// Descriptor written when items show up in a section nobody registered:
/// the title is derived from the id and the type is the id itself.
pub fn synthesize_descriptor(section_id: &str) -> Result<SectionDescriptor> {
    Ok(SectionDescriptor::new(
        section_id,
        titles::section_title(section_id)?,
        section_id,
        None,
        now(),
    ))
}

#[derive(Clone)]
pub struct ConsistencyCoordinator {
    store: Arc<dyn DocumentStore>,
    registry: CategorySectionRegistry,
    items: SectionItemStore,
    cascade: CascadeDeleter,
    invalidator: Arc<dyn CacheInvalidator>,
}

impl ConsistencyCoordinator {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        resolver: Arc<dyn ProductSnapshotResolver>,
        invalidator: Arc<dyn CacheInvalidator>,
        delete_batch_size: usize,
    ) -> Self {
        let registry = CategorySectionRegistry::new(store.clone());
        let items = SectionItemStore::new(store.clone(), resolver);
        let cascade = CascadeDeleter::new(store.clone(), registry.clone(), items.clone(), delete_batch_size);
        Self {
            store,
            registry,
            items,
            cascade,
            invalidator,
        }
    }

    pub fn registry(&self) -> &CategorySectionRegistry {
        &self.registry
    }

    pub fn items(&self) -> &SectionItemStore {
        &self.items
    }

    pub(crate) fn invalidate(&self, scope: InvalidationScope) {
        notify(self.invalidator.as_ref(), scope);
    }

    pub fn ensure_category(&self, category_id: &str, title_hint: Option<&str>) -> Result<CategoryDocument> {
        validate_segment("categoryId", category_id)?;
        let existed = self.registry.get_category(category_id)?.is_some();
        let category = self.registry.ensure_category(category_id, title_hint)?;
        if !existed {
            self.invalidate(InvalidationScope::category(category_id));
        }
        Ok(category)
    }

    /// Adds a product to a section, registering the section on first use.
    ///
    /// The item create and the registry rewrite are committed in one batch:
    /// either both land or neither does. A concurrent registry change makes the
    /// batch fail with `Conflict` rather than losing a descriptor.
    pub fn add_item(
        &self,
        category_id: &str,
        section_id: &str,
        product_id: &str,
        rank: i64,
        price_override: Option<f64>,
    ) -> Result<SectionItem> {
        DocumentPath::item(category_id, section_id, product_id)?;
        self.ensure_category(category_id, None)?;

        let mut current = self
            .registry
            .read(category_id)?
            .ok_or_else(|| CatalogError::NotFound(format!("Category {} not found", category_id)))?;
        let registered = current.category.section(section_id).cloned();
        let item = match registered {
            Some(descriptor) => {
                self.items
                    .add_item(category_id, &descriptor, product_id, rank, price_override)?
            }
            None => {
                let descriptor = synthesize_descriptor(section_id)?;
                let mut batch = WriteBatch::new();
                let item = self.items.stage_add(
                    &mut batch,
                    category_id,
                    &descriptor,
                    product_id,
                    rank,
                    price_override,
                )?;
                registry::append_descriptor(&mut current.category, descriptor)?;
                self.registry
                    .stage_write(&mut batch, &current.category, Some(current.version))?;
                self.store.commit(batch)?;

                info!("Added {} to {}/{} at rank {}", product_id, category_id, section_id, rank);
                info!("Registered section {}/{} on first item", category_id, section_id);
                self.invalidate(InvalidationScope::category(category_id));
                item
            }
        };

        self.invalidate(InvalidationScope::section(category_id, section_id));
        Ok(item)
    }

    /// Appends many products to a section in the order given.
    ///
    /// Ranks continue after the current item count. Products that are missing,
    /// already in the section or repeated in the request are reported and
    /// skipped. Items go out in batches of at most `MAX_BATCH_OPERATIONS`; the
    /// first batch also registers the section when it is new.
    pub fn bulk_add_items(
        &self,
        category_id: &str,
        section_id: &str,
        product_ids: &[String],
        price_override: Option<f64>,
    ) -> Result<BulkAddReport> {
        validate_segment("categoryId", category_id)?;
        validate_segment("sectionId", section_id)?;
        if product_ids.is_empty() {
            return Err(CatalogError::Validation("No products supplied".to_string()));
        }
        self.ensure_category(category_id, None)?;

        let mut current = self
            .registry
            .read(category_id)?
            .ok_or_else(|| CatalogError::NotFound(format!("Category {} not found", category_id)))?;
        let (descriptor, mut registration) = match current.category.section(section_id).cloned() {
            Some(descriptor) => (descriptor, None),
            None => {
                let descriptor = synthesize_descriptor(section_id)?;
                registry::append_descriptor(&mut current.category, descriptor.clone())?;
                (descriptor, Some(current))
            }
        };
        let registers_section = registration.is_some();
        items::check_price_override(&descriptor, price_override)?;

        let mut next_rank = self.items.count_items(category_id, section_id)? as i64 + 1;
        let mut report = BulkAddReport {
            total_processed: product_ids.len(),
            ..Default::default()
        };
        let mut seen = HashSet::new();
        let mut batch = WriteBatch::new();
        let mut committed = 0;

        for product_id in product_ids.iter().map(|id| id.trim()) {
            if !seen.insert(product_id) {
                report.record(product_id, false, "Duplicate in request");
                continue;
            }
            match self.items.stage_add(
                &mut batch,
                category_id,
                &descriptor,
                product_id,
                next_rank,
                price_override,
            ) {
                Ok(_) => {
                    next_rank += 1;
                    report.record(product_id, true, "Added");
                }
                Err(CatalogError::Conflict(_)) => report.record(product_id, false, "Already in section"),
                Err(CatalogError::NotFound(_)) => report.record(product_id, false, "Product not found"),
                Err(CatalogError::Validation(message)) => report.record(product_id, false, message),
                Err(e) => return Err(bulk_interrupted(e, committed)),
            }

            // One slot stays free for the registry rewrite.
            if batch.len() == MAX_BATCH_OPERATIONS - 1 {
                committed += self
                    .commit_bulk_chunk(&mut batch, &mut registration)
                    .map_err(|e| bulk_interrupted(e, committed))?;
            }
        }
        committed += self
            .commit_bulk_chunk(&mut batch, &mut registration)
            .map_err(|e| bulk_interrupted(e, committed))?;

        info!(
            "Bulk added {} of {} product(s) to {}/{}",
            committed, report.total_processed, category_id, section_id
        );
        if committed > 0 {
            if registers_section {
                info!("Registered section {}/{} on first item", category_id, section_id);
                self.invalidate(InvalidationScope::category(category_id));
            }
            self.invalidate(InvalidationScope::section(category_id, section_id));
        }
        Ok(report)
    }

    /// Commits the staged items, with the pending registry rewrite if any.
    /// Returns the number of items written.
    fn commit_bulk_chunk(
        &self,
        batch: &mut WriteBatch,
        registration: &mut Option<VersionedCategory>,
    ) -> Result<usize> {
        if batch.is_empty() {
            return Ok(0);
        }
        let mut chunk = std::mem::take(batch);
        let staged = chunk.len();
        if let Some(current) = registration.take() {
            self.registry
                .stage_write(&mut chunk, &current.category, Some(current.version))?;
        }
        self.store.commit(chunk)?;
        Ok(staged)
    }

    /// Registers an empty section. `section_type` defaults to the section id.
    pub fn create_section(
        &self,
        category_id: &str,
        section_id: &str,
        title: &str,
        section_type: Option<&str>,
        allows_price_override: Option<bool>,
    ) -> Result<SectionDescriptor> {
        let section_id = section_id.trim();
        validate_segment("categoryId", category_id)?;
        validate_segment("sectionId", section_id)?;
        if title.trim().is_empty() {
            return Err(CatalogError::Validation("Section title must not be blank".to_string()));
        }
        let section_type = section_type
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(section_id);

        self.ensure_category(category_id, None)?;
        let descriptor = self.registry.add_section_descriptor(
            category_id,
            section_id,
            title,
            section_type,
            allows_price_override,
        )?;
        self.invalidate(InvalidationScope::category(category_id));
        Ok(descriptor)
    }

    pub fn update_section(
        &self,
        category_id: &str,
        section_id: &str,
        patch: &SectionDescriptorPatch,
    ) -> Result<SectionDescriptor> {
        if patch.is_empty() {
            return Err(CatalogError::Validation("Nothing to update".to_string()));
        }
        let descriptor = self
            .registry
            .update_section_descriptor(category_id, section_id, patch)?;
        info!("Updated section {}/{}", category_id, section_id);
        self.invalidate(InvalidationScope::category(category_id));
        self.invalidate(InvalidationScope::section(category_id, section_id));
        Ok(descriptor)
    }

    pub fn delete_section(
        &self,
        category_id: &str,
        section_id: &str,
        resume_after: Option<&str>,
    ) -> Result<CascadeReport> {
        let report = self.cascade.delete_section(category_id, section_id, resume_after)?;
        self.invalidate(InvalidationScope::category(category_id));
        self.invalidate(InvalidationScope::section(category_id, section_id));
        Ok(report)
    }

    pub fn remove_item(&self, category_id: &str, section_id: &str, product_id: &str) -> Result<()> {
        self.items.remove_item(category_id, section_id, product_id)?;
        self.invalidate(InvalidationScope::section(category_id, section_id));
        Ok(())
    }

    /// Price overrides are checked against the registered descriptor, or the
    /// default one the section would get when it has none.
    pub fn update_item(
        &self,
        category_id: &str,
        section_id: &str,
        product_id: &str,
        patch: &SectionItemPatch,
    ) -> Result<SectionItem> {
        if patch.is_empty() {
            return Err(CatalogError::Validation("Nothing to update".to_string()));
        }
        let descriptor = match self
            .registry
            .get_category(category_id)?
            .and_then(|c| c.section(section_id).cloned())
        {
            Some(descriptor) => descriptor,
            None => synthesize_descriptor(section_id)?,
        };

        let item = self
            .items
            .update_item(category_id, &descriptor, product_id, patch)?;
        info!("Updated {} in {}/{}", product_id, category_id, section_id);
        self.invalidate(InvalidationScope::section(category_id, section_id));
        Ok(item)
    }

    /// Writes synthesized descriptors for sections that hold items but are
    /// missing from the registry, creating the category if needed. Returns the
    /// ids actually added; already registered ids are skipped.
    pub fn register_sections(&self, category_id: &str, section_ids: &[String]) -> Result<Vec<String>> {
        if section_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_category(category_id, None)?;

        let mut current = self
            .registry
            .read(category_id)?
            .ok_or_else(|| CatalogError::NotFound(format!("Category {} not found", category_id)))?;
        let mut added = Vec::new();
        for section_id in section_ids {
            if current.category.has_section(section_id) {
                continue;
            }
            registry::append_descriptor(&mut current.category, synthesize_descriptor(section_id)?)?;
            added.push(section_id.clone());
        }
        if added.is_empty() {
            return Ok(added);
        }

        let mut batch = WriteBatch::new();
        self.registry
            .stage_write(&mut batch, &current.category, Some(current.version))?;
        self.store.commit(batch)?;

        info!("Restored descriptors for {}: {}", category_id, added.join(", "));
        self.invalidate(InvalidationScope::category(category_id));
        Ok(added)
    }

    pub fn refresh_snapshots(&self, category_id: &str, section_id: &str) -> Result<Vec<String>> {
        let refreshed = self.items.refresh_snapshots(category_id, section_id)?;
        if !refreshed.is_empty() {
            self.invalidate(InvalidationScope::section(category_id, section_id));
        }
        Ok(refreshed)
    }
}

fn bulk_interrupted(err: CatalogError, committed: usize) -> CatalogError {
    if committed == 0 {
        return err;
    }
    err.map_message(|m| format!("{}; {} product(s) were already added", m, committed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::invalidation::testing::RecordingInvalidator;
    use crate::catalog::snapshot::StoreProductResolver;
    use crate::catalog::testing::{memory_store, seed_product};
    use crate::store::{CollectionPath, Query, StoredDocument};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn coordinator_over(
        store: Arc<dyn DocumentStore>,
        invalidator: Arc<RecordingInvalidator>,
    ) -> ConsistencyCoordinator {
        for (id, name, price) in [("p1", "Phone", 999.0), ("p2", "Laptop", 1999.0)] {
            seed_product(store.as_ref(), id, name, price);
        }
        let resolver = Arc::new(StoreProductResolver::new(store.clone()));
        ConsistencyCoordinator::new(store, resolver, invalidator, 450)
    }

    fn coordinator() -> (ConsistencyCoordinator, Arc<RecordingInvalidator>) {
        let invalidator = Arc::new(RecordingInvalidator::default());
        (coordinator_over(memory_store(), invalidator.clone()), invalidator)
    }

    #[test]
    fn first_item_registers_flash_sale_section() {
        let (catalog, _) = coordinator();
        catalog.ensure_category("electronics", None).unwrap();

        let item = catalog
            .add_item("electronics", "flashSale", "p1", 1, Some(499.0))
            .unwrap();

        let sections = catalog.registry().list_sections("electronics").unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].section_id, "flashSale");
        assert_eq!(sections[0].title, "Flash Sale");
        assert_eq!(sections[0].section_type, "flashSale");

        let items = catalog.items().list_items("electronics", "flashSale").unwrap();
        assert_eq!(items, vec![item]);
        assert_eq!(items[0].rank, 1);
        assert_eq!(items[0].price_override, Some(499.0));
    }

    #[test]
    fn best_sellers_list_in_rank_order() {
        let (catalog, _) = coordinator();
        catalog.add_item("home", "bestSellers", "p1", 2, None).unwrap();
        catalog.add_item("home", "bestSellers", "p2", 1, None).unwrap();

        let ids: Vec<_> = catalog
            .items()
            .list_items("home", "bestSellers")
            .unwrap()
            .into_iter()
            .map(|i| i.product_id)
            .collect();
        assert_eq!(ids, ["p2", "p1"]);

        let category = catalog.registry().get_category("home").unwrap().unwrap();
        assert_eq!(category.title, "Home");
        assert_eq!(category.section_ids(), ["bestSellers"]);
    }

    #[test]
    fn duplicate_add_fails_before_touching_registry() {
        let (catalog, _) = coordinator();
        catalog.add_item("home", "popular", "p1", 1, None).unwrap();
        let before = catalog.registry().read("home").unwrap().unwrap();

        let err = catalog.add_item("home", "popular", "p1", 9, None).unwrap_err();

        assert!(matches!(err, CatalogError::Conflict(_)));
        let after = catalog.registry().read("home").unwrap().unwrap();
        assert_eq!(after.version, before.version);
        assert_eq!(
            catalog.items().get_item("home", "popular", "p1").unwrap().unwrap().rank,
            1
        );
    }

    #[test]
    fn override_outside_flash_sale_leaves_nothing_behind() {
        let (catalog, _) = coordinator();
        let err = catalog
            .add_item("home", "bestSellers", "p1", 1, Some(10.0))
            .unwrap_err();

        assert!(matches!(err, CatalogError::Validation(_)));
        assert!(catalog.items().list_items("home", "bestSellers").unwrap().is_empty());
        assert!(catalog.registry().list_sections("home").unwrap().is_empty());
    }

    /// Rewrites the category behind the coordinator's back right before the
    /// first commit, like a concurrent admin request would.
    struct RacingStore {
        inner: Arc<dyn DocumentStore>,
        raced: AtomicBool,
    }

    impl DocumentStore for RacingStore {
        fn get_document(&self, path: &DocumentPath) -> Result<Option<StoredDocument>> {
            self.inner.get_document(path)
        }

        fn list_collection(&self, path: &CollectionPath, query: &Query) -> Result<Vec<StoredDocument>> {
            self.inner.list_collection(path, query)
        }

        fn commit(&self, batch: WriteBatch) -> Result<()> {
            let touches_category = batch
                .clone()
                .into_ops()
                .iter()
                .any(|op| op.path().collection() == &CollectionPath::categories());
            if touches_category && !self.raced.swap(true, Ordering::SeqCst) {
                let path = DocumentPath::category("home")?;
                let version = self.inner.get_document(&path)?.map_or(0, |doc| doc.version);
                let mut rival = WriteBatch::new();
                rival.set_if_version(
                    path,
                    json!({"categoryId": "home", "title": "Home", "sections": [
                        {"sectionId": "popular", "title": "Popular", "type": "popular"}
                    ]}),
                    version,
                );
                self.inner.commit(rival)?;
            }
            self.inner.commit(batch)
        }
    }

    #[test]
    fn concurrent_registry_change_rolls_back_the_item() {
        let inner = memory_store();
        CategorySectionRegistry::new(inner.clone())
            .ensure_category("home", None)
            .unwrap();
        let racing: Arc<dyn DocumentStore> = Arc::new(RacingStore {
            inner: inner.clone(),
            raced: AtomicBool::new(false),
        });
        let invalidator = Arc::new(RecordingInvalidator::default());
        let catalog = coordinator_over(racing, invalidator);

        let err = catalog.add_item("home", "bestSellers", "p1", 1, None).unwrap_err();

        assert!(matches!(err, CatalogError::Conflict(_)));
        assert!(catalog.items().get_item("home", "bestSellers", "p1").unwrap().is_none());
        let ids = catalog.registry().get_category("home").unwrap().unwrap().section_ids();
        assert_eq!(ids, ["popular"]);

        catalog.add_item("home", "bestSellers", "p1", 1, None).unwrap();
        let ids = catalog.registry().get_category("home").unwrap().unwrap().section_ids();
        assert_eq!(ids, ["popular", "bestSellers"]);
    }

    #[test]
    fn create_section_defaults_type_and_rejects_duplicates() {
        let (catalog, _) = coordinator();
        let created = catalog
            .create_section("garden", " seasonal ", " Seasonal Picks ", None, None)
            .unwrap();
        assert_eq!(created.section_id, "seasonal");
        assert_eq!(created.section_type, "seasonal");
        assert_eq!(created.title, "Seasonal Picks");

        let err = catalog
            .create_section("garden", "seasonal", "Again", None, None)
            .unwrap_err();
        assert!(matches!(err, CatalogError::Conflict(_)));

        let blank = catalog.create_section("garden", "", "Title", None, None).unwrap_err();
        assert!(matches!(blank, CatalogError::Validation(_)));
    }

    #[test]
    fn granted_capability_unlocks_overrides_in_any_section() {
        let (catalog, _) = coordinator();
        catalog
            .create_section("home", "clearance", "Clearance", None, Some(true))
            .unwrap();
        let item = catalog.add_item("home", "clearance", "p1", 1, Some(5.0)).unwrap();
        assert_eq!(item.price_override, Some(5.0));

        let revoke = SectionDescriptorPatch {
            allows_price_override: Some(false),
            ..Default::default()
        };
        catalog.update_section("home", "clearance", &revoke).unwrap();

        let patch = SectionItemPatch {
            price_override: Some(4.0),
            ..Default::default()
        };
        let err = catalog.update_item("home", "clearance", "p1", &patch).unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));

        let rerank = SectionItemPatch {
            rank: Some(3),
            ..Default::default()
        };
        assert_eq!(catalog.update_item("home", "clearance", "p1", &rerank).unwrap().rank, 3);
    }

    #[test]
    fn delete_section_clears_registry_and_items() {
        let (catalog, _) = coordinator();
        catalog.add_item("home", "popular", "p1", 1, None).unwrap();
        catalog.add_item("home", "popular", "p2", 2, None).unwrap();

        let report = catalog.delete_section("home", "popular", None).unwrap();

        assert_eq!(report.deleted_items, 2);
        assert!(catalog.registry().list_sections("home").unwrap().is_empty());
        assert!(catalog.items().list_items("home", "popular").unwrap().is_empty());
    }

    #[test]
    fn writes_announce_stale_listings() {
        let (catalog, invalidator) = coordinator();
        catalog.add_item("home", "popular", "p1", 1, None).unwrap();
        catalog.remove_item("home", "popular", "p1").unwrap();

        let scopes: Vec<_> = invalidator.recorded().iter().map(|s| s.to_string()).collect();
        assert_eq!(scopes, ["home", "home", "home/popular", "home/popular"]);
    }

    #[test]
    fn failing_invalidation_does_not_fail_the_write() {
        let invalidator = Arc::new(RecordingInvalidator::failing());
        let catalog = coordinator_over(memory_store(), invalidator.clone());

        catalog.add_item("home", "popular", "p1", 1, None).unwrap();

        assert!(!invalidator.recorded().is_empty());
        assert_eq!(catalog.items().list_items("home", "popular").unwrap().len(), 1);
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn bulk_add_mixes_successes_and_failures() {
        let (catalog, invalidator) = coordinator();
        catalog.add_item("home", "popular", "p1", 1, None).unwrap();

        let report = catalog
            .bulk_add_items("home", "popular", &ids(&["p2", "p1", "ghost", "p2"]), None)
            .unwrap();

        assert_eq!(report.total_processed, 4);
        assert_eq!(report.success_count, 1);
        assert_eq!(report.failed_count, 3);
        let messages: Vec<_> = report.results.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(
            messages,
            ["Added", "Already in section", "Product not found", "Duplicate in request"]
        );
        assert_eq!(catalog.items().get_item("home", "popular", "p2").unwrap().unwrap().rank, 2);
        assert_eq!(invalidator.recorded().last().unwrap().to_string(), "home/popular");
    }

    #[test]
    fn bulk_add_ranks_after_existing_items_across_chunks() {
        let store = memory_store();
        let catalog = coordinator_over(store.clone(), Arc::new(RecordingInvalidator::default()));
        let count = MAX_BATCH_OPERATIONS + 20;
        let product_ids: Vec<String> = (0..count).map(|n| format!("b{:04}", n)).collect();
        for id in &product_ids {
            seed_product(store.as_ref(), id, "Item", 1.0);
        }
        catalog.add_item("home", "deals", "p1", 1, None).unwrap();

        let report = catalog
            .bulk_add_items("home", "deals", &product_ids, None)
            .unwrap();

        assert_eq!(report.success_count, count);
        let listed = catalog.items().list_items("home", "deals").unwrap();
        assert_eq!(listed.len(), count + 1);
        let ranks: Vec<i64> = listed.iter().map(|i| i.rank).collect();
        assert_eq!(ranks, (1..=(count as i64 + 1)).collect::<Vec<_>>());
        assert_eq!(listed[1].product_id, "b0000");
        assert_eq!(catalog.registry().list_sections("home").unwrap().len(), 1);
    }

    #[test]
    fn bulk_add_registers_new_section_once() {
        let (catalog, _) = coordinator();

        let report = catalog
            .bulk_add_items("home", "flashSale", &ids(&["p1", "p2"]), Some(9.0))
            .unwrap();

        assert_eq!(report.success_count, 2);
        let sections = catalog.registry().list_sections("home").unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].section_id, "flashSale");

        let rejected = catalog
            .bulk_add_items("home", "popular", &ids(&["p1"]), Some(9.0))
            .unwrap_err();
        assert!(matches!(rejected, CatalogError::Validation(_)));
        let none = catalog.bulk_add_items("home", "popular", &[], None).unwrap_err();
        assert!(matches!(none, CatalogError::Validation(_)));
        assert_eq!(catalog.registry().list_sections("home").unwrap().len(), 1);
    }

    #[test]
    fn empty_patches_are_rejected() {
        let (catalog, _) = coordinator();
        catalog.add_item("home", "popular", "p1", 1, None).unwrap();

        let item = catalog
            .update_item("home", "popular", "p1", &SectionItemPatch::default())
            .unwrap_err();
        assert!(matches!(item, CatalogError::Validation(_)));

        let section = catalog
            .update_section("home", "popular", &SectionDescriptorPatch::default())
            .unwrap_err();
        assert!(matches!(section, CatalogError::Validation(_)));
    }
}
