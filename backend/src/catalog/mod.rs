//! The curated home-section catalog.
//!
//! [`HomeCatalog`] is the public boundary: every operation returns an
//! [`ApiResult`] envelope and no error escapes it. Underneath, the registry,
//! the item store, the cascade and discovery return `Result<_, CatalogError>`.

pub mod cascade;
pub mod coordinator;
pub mod discovery;
pub mod invalidation;
pub mod items;
pub mod registry;
pub mod snapshot;
pub mod titles;

use crate::catalog::coordinator::ConsistencyCoordinator;
use crate::catalog::discovery::SubcollectionDiscovery;
use crate::catalog::invalidation::CacheInvalidator;
use crate::catalog::snapshot::{ProductSnapshotResolver, StoreProductResolver};
use crate::config::AppConfig;
use crate::error::{respond, CatalogError, Result};
use crate::store::DocumentStore;
use catalog_common::model::category::{CategoryDocument, SectionDescriptor};
use catalog_common::model::item::SectionItem;
use catalog_common::model::report::{
    BulkAddReport, CascadeReport, CategoryListing, DiscoveryReport, ReconcileSummary, StaleItem,
};
use catalog_common::requests::{
    AddItemRequest, BulkAddItemsRequest, CreateSectionRequest, UpdateItemRequest, UpdateSectionRequest,
};
use catalog_common::response::ApiResult;
use std::sync::Arc;

#[derive(Clone)]
pub struct HomeCatalog {
    coordinator: ConsistencyCoordinator,
    discovery: SubcollectionDiscovery,
}

impl HomeCatalog {
    /// Products are resolved from the same store the catalog lives in.
    pub fn new(store: Arc<dyn DocumentStore>, invalidator: Arc<dyn CacheInvalidator>, config: &AppConfig) -> Self {
        let resolver = Arc::new(StoreProductResolver::new(store.clone()));
        Self::with_resolver(store, resolver, invalidator, config)
    }

    pub fn with_resolver(
        store: Arc<dyn DocumentStore>,
        resolver: Arc<dyn ProductSnapshotResolver>,
        invalidator: Arc<dyn CacheInvalidator>,
        config: &AppConfig,
    ) -> Self {
        let coordinator = ConsistencyCoordinator::new(store, resolver, invalidator, config.delete_batch_size);
        let discovery = SubcollectionDiscovery::new(coordinator.clone(), config.probe_sections.clone());
        Self {
            coordinator,
            discovery,
        }
    }

    pub fn list_categories(&self) -> ApiResult<Vec<CategoryDocument>> {
        respond(self.coordinator.registry().list_categories(), "Categories fetched")
    }

    pub fn get_category(&self, category_id: &str) -> ApiResult<CategoryDocument> {
        let result = self
            .coordinator
            .registry()
            .get_category(category_id)
            .and_then(|found| {
                found.ok_or_else(|| CatalogError::NotFound(format!("Category {} not found", category_id)))
            });
        respond(result, "Category fetched")
    }

    pub fn ensure_category(&self, category_id: &str, title_hint: Option<&str>) -> ApiResult<CategoryDocument> {
        respond(
            self.coordinator.ensure_category(category_id, title_hint),
            "Category ready",
        )
    }

    pub fn list_sections(&self, category_id: &str) -> ApiResult<Vec<SectionDescriptor>> {
        respond(self.coordinator.registry().list_sections(category_id), "Sections fetched")
    }

    pub fn create_section(&self, category_id: &str, req: &CreateSectionRequest) -> ApiResult<SectionDescriptor> {
        respond(
            self.coordinator.create_section(
                category_id,
                &req.section_id,
                &req.title,
                req.section_type.as_deref(),
                req.allows_price_override,
            ),
            "Section created",
        )
    }

    pub fn update_section(
        &self,
        category_id: &str,
        section_id: &str,
        req: &UpdateSectionRequest,
    ) -> ApiResult<SectionDescriptor> {
        respond(
            self.coordinator.update_section(category_id, section_id, req),
            "Section updated",
        )
    }

    pub fn delete_section(
        &self,
        category_id: &str,
        section_id: &str,
        resume_after: Option<&str>,
    ) -> ApiResult<CascadeReport> {
        respond(
            self.coordinator.delete_section(category_id, section_id, resume_after),
            "Section and all its items deleted",
        )
    }

    pub fn list_items(&self, category_id: &str, section_id: &str) -> ApiResult<Vec<SectionItem>> {
        respond(
            self.coordinator.items().list_items(category_id, section_id),
            "Items fetched",
        )
    }

    pub fn get_item(&self, category_id: &str, section_id: &str, product_id: &str) -> ApiResult<SectionItem> {
        let result = self
            .coordinator
            .items()
            .get_item(category_id, section_id, product_id)
            .and_then(|found| {
                found.ok_or_else(|| {
                    CatalogError::NotFound(format!(
                        "Product {} is not in section {}",
                        product_id, section_id
                    ))
                })
            });
        respond(result, "Item fetched")
    }

    pub fn add_item(&self, category_id: &str, section_id: &str, req: &AddItemRequest) -> ApiResult<SectionItem> {
        respond(
            self.coordinator.add_item(
                category_id,
                section_id,
                req.product_id.trim(),
                req.rank,
                req.price_override,
            ),
            "Product added to section",
        )
    }

    /// Per-product failures land in the report; only a bad request or a store
    /// failure fails the whole call.
    pub fn bulk_add_items(
        &self,
        category_id: &str,
        section_id: &str,
        req: &BulkAddItemsRequest,
    ) -> ApiResult<BulkAddReport> {
        match self
            .coordinator
            .bulk_add_items(category_id, section_id, &req.product_ids, req.price_override)
        {
            Ok(report) => {
                let message = format!("Added {} items to section", report.success_count);
                ApiResult::ok(message, report)
            }
            Err(e) => e.into_result(),
        }
    }

    pub fn update_item(
        &self,
        category_id: &str,
        section_id: &str,
        product_id: &str,
        req: &UpdateItemRequest,
    ) -> ApiResult<SectionItem> {
        respond(
            self.coordinator.update_item(category_id, section_id, product_id, req),
            "Item updated",
        )
    }

    pub fn remove_item(&self, category_id: &str, section_id: &str, product_id: &str) -> ApiResult<()> {
        match self.coordinator.remove_item(category_id, section_id, product_id) {
            Ok(()) => ApiResult::done("Product removed from section"),
            Err(e) => e.into_result(),
        }
    }

    pub fn stale_items(&self, category_id: &str, section_id: &str) -> ApiResult<Vec<StaleItem>> {
        respond(
            self.coordinator.items().stale_items(category_id, section_id),
            "Snapshot check finished",
        )
    }

    pub fn refresh_snapshots(&self, category_id: &str, section_id: &str) -> ApiResult<Vec<String>> {
        respond(
            self.coordinator.refresh_snapshots(category_id, section_id),
            "Snapshots refreshed",
        )
    }

    pub fn discover(&self, category_id: &str, candidates: Option<&[String]>) -> ApiResult<DiscoveryReport> {
        respond(self.discovery.discover(category_id, candidates), "Discovery finished")
    }

    pub fn reconcile(&self, category_id: &str, candidates: Option<&[String]>) -> ApiResult<DiscoveryReport> {
        respond(self.discovery.reconcile(category_id, candidates), "Registry reconciled")
    }

    pub fn listing(&self, category_id: &str, candidates: Option<&[String]>) -> ApiResult<CategoryListing> {
        respond(self.discovery.listing(category_id, candidates), "Home section data fetched")
    }

    /// Runs inside a background job, which reports the error itself.
    pub fn reconcile_all(
        &self,
        candidates: Option<&[String]>,
        progress: impl FnMut(usize, usize),
    ) -> Result<ReconcileSummary> {
        self.discovery.reconcile_all(candidates, progress)
    }
}
