//! Which sections of a category actually hold items.
//!
//! The store cannot list the nested collections under a category, so there
//! are two partial answers. The registry path trusts the descriptor array and
//! misses sections whose descriptor was never written. The probe path opens a
//! list of candidate section ids directly and misses anything not on the list.
//! Discovery runs both and can repair the registry from what the probe found.

use crate::catalog::coordinator::{synthesize_descriptor, ConsistencyCoordinator};
use crate::error::Result;
use crate::store::validate_segment;
use catalog_common::model::report::{
    CategoryListing, DiscoveryReport, ListedItem, ReconcileSummary, SectionListing,
};
use log::{info, warn};

#[derive(Clone)]
pub struct SubcollectionDiscovery {
    coordinator: ConsistencyCoordinator,
    default_candidates: Vec<String>,
}

impl SubcollectionDiscovery {
    pub fn new(coordinator: ConsistencyCoordinator, default_candidates: Vec<String>) -> Self {
        Self {
            coordinator,
            default_candidates,
        }
    }

    /// Registry path: section ids in display order.
    pub fn registered(&self, category_id: &str) -> Result<Vec<String>> {
        validate_segment("categoryId", category_id)?;
        Ok(self
            .coordinator
            .registry()
            .list_sections(category_id)?
            .into_iter()
            .map(|s| s.section_id)
            .collect())
    }

    /// Probe path: the candidates that hold at least one item.
    ///
    /// `None` probes the configured default list.
    pub fn probe(&self, category_id: &str, candidates: Option<&[String]>) -> Result<Vec<String>> {
        let candidates = self.candidates(candidates)?;
        self.with_items(category_id, &candidates)
    }

    pub fn discover(&self, category_id: &str, candidates: Option<&[String]>) -> Result<DiscoveryReport> {
        let registered = self.registered(category_id)?;
        let mut probed = registered.clone();
        for candidate in self.candidates(candidates)? {
            if !probed.contains(&candidate) {
                probed.push(candidate);
            }
        }
        let with_items = self.with_items(category_id, &probed)?;

        let orphaned = with_items
            .iter()
            .filter(|id| !registered.contains(id))
            .cloned()
            .collect();
        let empty = registered
            .iter()
            .filter(|id| !with_items.contains(id))
            .cloned()
            .collect();

        Ok(DiscoveryReport {
            category_id: category_id.to_string(),
            registered,
            with_items,
            orphaned,
            empty,
            repaired: Vec::new(),
        })
    }

    /// Restores descriptors for orphaned sections. Running it twice is a no-op
    /// the second time.
    pub fn reconcile(&self, category_id: &str, candidates: Option<&[String]>) -> Result<DiscoveryReport> {
        let mut report = self.discover(category_id, candidates)?;
        if report.is_consistent() {
            return Ok(report);
        }
        report.repaired = self
            .coordinator
            .register_sections(category_id, &report.orphaned)?;
        if !report.repaired.is_empty() {
            report.registered.extend(report.repaired.iter().cloned());
            report.orphaned.retain(|id| !report.repaired.contains(id));
        }
        Ok(report)
    }

    /// The complete category view: every registered section plus every probed
    /// section holding items, each with its ranked items.
    pub fn listing(&self, category_id: &str, candidates: Option<&[String]>) -> Result<CategoryListing> {
        let report = self.discover(category_id, candidates)?;
        let category = self.coordinator.registry().get_category(category_id)?;

        let mut sections = Vec::new();
        for section_id in report.registered.iter().chain(report.orphaned.iter()) {
            let descriptor = category
                .as_ref()
                .and_then(|c| c.section(section_id).cloned());
            // Orphans price their items the way they would once registered.
            let pricing = match &descriptor {
                Some(descriptor) => descriptor.clone(),
                None => synthesize_descriptor(section_id)?,
            };
            let items = self
                .coordinator
                .items()
                .list_items(category_id, section_id)?
                .into_iter()
                .map(|item| ListedItem {
                    effective_price: item.effective_price(&pricing),
                    item,
                })
                .collect();
            sections.push(SectionListing {
                section_id: section_id.clone(),
                descriptor,
                items,
            });
        }

        Ok(CategoryListing {
            category_id: category_id.to_string(),
            category,
            sections,
        })
    }

    /// Reconciles every category document. Per-category failures are logged
    /// and counted; `progress` receives `(done, total)` after each category.
    pub fn reconcile_all(
        &self,
        candidates: Option<&[String]>,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<ReconcileSummary> {
        let categories = self.coordinator.registry().list_categories()?;
        let total = categories.len();
        let mut summary = ReconcileSummary {
            categories: total,
            ..Default::default()
        };

        for (done, category) in categories.iter().enumerate() {
            match self.reconcile(&category.category_id, candidates) {
                Ok(report) if !report.repaired.is_empty() => {
                    summary
                        .repaired
                        .insert(category.category_id.clone(), report.repaired);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Reconcile of {} failed: {}", category.category_id, e);
                    summary.failed += 1;
                }
            }
            progress(done + 1, total);
        }

        info!(
            "Reconciled {} categories, repaired {}, failed {}",
            summary.categories,
            summary.repaired.len(),
            summary.failed
        );
        Ok(summary)
    }

    fn candidates(&self, supplied: Option<&[String]>) -> Result<Vec<String>> {
        let source = supplied.unwrap_or(&self.default_candidates);
        let mut unique: Vec<String> = Vec::with_capacity(source.len());
        for candidate in source {
            let candidate = candidate.trim();
            validate_segment("sectionId", candidate)?;
            if !unique.iter().any(|c| c == candidate) {
                unique.push(candidate.to_string());
            }
        }
        Ok(unique)
    }

    fn with_items(&self, category_id: &str, section_ids: &[String]) -> Result<Vec<String>> {
        let mut found = Vec::new();
        for section_id in section_ids {
            if self.coordinator.items().has_items(category_id, section_id)? {
                found.push(section_id.clone());
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::invalidation::testing::RecordingInvalidator;
    use crate::catalog::snapshot::StoreProductResolver;
    use crate::catalog::testing::{memory_store, seed_product};
    use crate::error::CatalogError;
    use catalog_common::model::category::SectionDescriptor;
    use catalog_common::time::now;
    use std::sync::Arc;

    fn discovery() -> SubcollectionDiscovery {
        let store = memory_store();
        for id in ["p1", "p2", "p3"] {
            seed_product(store.as_ref(), id, "Item", 10.0);
        }
        let resolver = Arc::new(StoreProductResolver::new(store.clone()));
        let coordinator = ConsistencyCoordinator::new(
            store,
            resolver,
            Arc::new(RecordingInvalidator::default()),
            450,
        );
        SubcollectionDiscovery::new(
            coordinator,
            vec!["flashSale".to_string(), "bestSellers".to_string()],
        )
    }

    /// Writes an item without registering its section, as an interrupted
    /// add used to leave things.
    fn orphan(discovery: &SubcollectionDiscovery, category_id: &str, section_id: &str, product_id: &str) {
        let section = SectionDescriptor::new(section_id, section_id, section_id, None, now());
        discovery
            .coordinator
            .items()
            .add_item(category_id, &section, product_id, 1, None)
            .unwrap();
    }

    #[test]
    fn discover_separates_orphaned_and_empty_sections() {
        let discovery = discovery();
        discovery.coordinator.add_item("home", "popular", "p1", 1, None).unwrap();
        discovery
            .coordinator
            .create_section("home", "newArrivals", "New Arrivals", None, None)
            .unwrap();
        orphan(&discovery, "home", "bestSellers", "p2");

        let report = discovery.discover("home", None).unwrap();

        assert_eq!(report.registered, ["popular", "newArrivals"]);
        assert_eq!(report.with_items, ["popular", "bestSellers"]);
        assert_eq!(report.orphaned, ["bestSellers"]);
        assert_eq!(report.empty, ["newArrivals"]);
        assert!(!report.is_consistent());
    }

    #[test]
    fn probe_only_sees_candidates() {
        let discovery = discovery();
        orphan(&discovery, "home", "bestSellers", "p1");
        orphan(&discovery, "home", "secretDeals", "p2");

        assert_eq!(discovery.probe("home", None).unwrap(), ["bestSellers"]);
        let custom = vec!["secretDeals".to_string(), "secretDeals".to_string()];
        assert_eq!(discovery.probe("home", Some(custom.as_slice())).unwrap(), ["secretDeals"]);
    }

    #[test]
    fn bad_candidate_is_a_validation_error() {
        let discovery = discovery();
        let bad = vec!["best sellers".to_string()];
        assert!(matches!(
            discovery.probe("home", Some(bad.as_slice())),
            Err(CatalogError::Validation(_))
        ));
    }

    #[test]
    fn reconcile_repairs_registry_once() {
        let discovery = discovery();
        orphan(&discovery, "legacy", "flashSale", "p1");

        let report = discovery.reconcile("legacy", None).unwrap();
        assert_eq!(report.repaired, ["flashSale"]);
        assert!(report.is_consistent());

        let category = discovery.coordinator.registry().get_category("legacy").unwrap().unwrap();
        assert_eq!(category.title, "Legacy");
        let descriptor = category.section("flashSale").unwrap();
        assert_eq!(descriptor.title, "Flash Sale");
        assert_eq!(descriptor.section_type, "flashSale");

        let again = discovery.reconcile("legacy", None).unwrap();
        assert!(again.repaired.is_empty());
        assert_eq!(again.registered, ["flashSale"]);
    }

    #[test]
    fn listing_includes_orphans_after_registered_sections() {
        let discovery = discovery();
        discovery.coordinator.add_item("home", "popular", "p1", 2, None).unwrap();
        discovery.coordinator.add_item("home", "popular", "p2", 1, None).unwrap();
        orphan(&discovery, "home", "flashSale", "p3");

        let listing = discovery.listing("home", None).unwrap();

        let ids: Vec<_> = listing.sections.iter().map(|s| s.section_id.as_str()).collect();
        assert_eq!(ids, ["popular", "flashSale"]);
        assert!(listing.sections[0].descriptor.is_some());
        assert!(listing.sections[1].descriptor.is_none());
        let ranked: Vec<_> = listing.sections[0]
            .items
            .iter()
            .map(|i| i.item.product_id.as_str())
            .collect();
        assert_eq!(ranked, ["p2", "p1"]);
        assert_eq!(listing.sections[0].items[0].effective_price, 10.0);
    }

    #[test]
    fn reconcile_all_reports_progress_and_repairs() {
        let discovery = discovery();
        discovery.coordinator.ensure_category("home", None).unwrap();
        discovery.coordinator.ensure_category("garden", None).unwrap();
        orphan(&discovery, "garden", "bestSellers", "p1");

        let mut ticks = Vec::new();
        let summary = discovery
            .reconcile_all(None, |done, total| ticks.push((done, total)))
            .unwrap();

        assert_eq!(ticks, [(1, 2), (2, 2)]);
        assert_eq!(summary.categories, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.repaired.get("garden").unwrap(), &vec!["bestSellers".to_string()]);
        assert!(!summary.repaired.contains_key("home"));
    }
}
