//! Category documents and their embedded section registry.
//!
//! The registry is an array field of the category document. The store offers
//! no array-append primitive, so every mutation reads the document, edits the
//! array and writes the whole document back, guarded by the version it read.

use crate::catalog::titles;
use crate::error::{CatalogError, Result};
use crate::store::{CollectionPath, DocumentPath, DocumentStore, Query, WriteBatch};
use catalog_common::model::category::{CategoryDocument, SectionDescriptor, SectionDescriptorPatch};
use catalog_common::time::now;
use log::info;
use std::sync::Arc;

/// A category document together with the store version it was read at.
#[derive(Debug, Clone)]
pub struct VersionedCategory {
    pub category: CategoryDocument,
    pub version: i64,
}

#[derive(Clone)]
pub struct CategorySectionRegistry {
    store: Arc<dyn DocumentStore>,
}

impl CategorySectionRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn read(&self, category_id: &str) -> Result<Option<VersionedCategory>> {
        let path = DocumentPath::category(category_id)?;
        match self.store.get_document(&path)? {
            Some(doc) => Ok(Some(VersionedCategory {
                category: doc.decode()?,
                version: doc.version,
            })),
            None => Ok(None),
        }
    }

    fn read_existing(&self, category_id: &str) -> Result<VersionedCategory> {
        self.read(category_id)?
            .ok_or_else(|| CatalogError::NotFound(format!("Category {} not found", category_id)))
    }

    pub fn get_category(&self, category_id: &str) -> Result<Option<CategoryDocument>> {
        Ok(self.read(category_id)?.map(|v| v.category))
    }

    /// Every category document, in id order.
    pub fn list_categories(&self) -> Result<Vec<CategoryDocument>> {
        self.store
            .list_collection(&CollectionPath::categories(), &Query::new())?
            .iter()
            .map(|doc| doc.decode())
            .collect()
    }

    /// Creates the category with an empty registry unless it already exists.
    ///
    /// The title is the hint when one is given, otherwise the id with its first
    /// letter upper-cased. An existing category is returned untouched.
    pub fn ensure_category(&self, category_id: &str, title_hint: Option<&str>) -> Result<CategoryDocument> {
        if let Some(existing) = self.get_category(category_id)? {
            return Ok(existing);
        }

        let title = match title_hint.map(str::trim).filter(|t| !t.is_empty()) {
            Some(hint) => hint.to_string(),
            None => titles::category_title(category_id),
        };
        let category = CategoryDocument::new(category_id, title, now());
        let path = DocumentPath::category(category_id)?;

        match self.store.create_document(&path, serde_json::to_value(&category)?) {
            Ok(()) => {
                info!("Created category {}", category_id);
                Ok(category)
            }
            // Lost a creation race: the winner's document is just as good.
            Err(CatalogError::Conflict(_)) => self.read_existing(category_id).map(|v| v.category),
            Err(e) => Err(e),
        }
    }

    /// Appends a descriptor; `Conflict` if the section id is already registered.
    pub fn add_section_descriptor(
        &self,
        category_id: &str,
        section_id: &str,
        title: &str,
        section_type: &str,
        allows_price_override: Option<bool>,
    ) -> Result<SectionDescriptor> {
        let title = title.trim();
        if title.is_empty() {
            return Err(CatalogError::Validation("Section title must not be blank".to_string()));
        }
        crate::store::validate_segment("sectionId", section_id)?;

        let mut current = self.read_existing(category_id)?;
        let descriptor = SectionDescriptor::new(
            section_id,
            title,
            section_type.trim(),
            allows_price_override,
            now(),
        );
        append_descriptor(&mut current.category, descriptor.clone())?;

        let mut batch = WriteBatch::new();
        self.stage_write(&mut batch, &current.category, Some(current.version))?;
        self.store.commit(batch)?;

        info!("Registered section {}/{}", category_id, section_id);
        Ok(descriptor)
    }

    pub fn update_section_descriptor(
        &self,
        category_id: &str,
        section_id: &str,
        patch: &SectionDescriptorPatch,
    ) -> Result<SectionDescriptor> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(CatalogError::Validation("Section title must not be blank".to_string()));
        }

        let mut current = self.read_existing(category_id)?;
        let at = now();
        let descriptor = current
            .category
            .sections
            .iter_mut()
            .find(|s| s.section_id == section_id)
            .ok_or_else(|| {
                CatalogError::NotFound(format!("Section {}/{} not found", category_id, section_id))
            })?;
        patch.apply(descriptor, at);
        let updated = descriptor.clone();
        current.category.updated_at = at;

        let mut batch = WriteBatch::new();
        self.stage_write(&mut batch, &current.category, Some(current.version))?;
        self.store.commit(batch)?;

        Ok(updated)
    }

    /// Drops the descriptor from the registry. Items are left alone.
    ///
    /// Returns whether a descriptor was present.
    pub fn remove_section_descriptor(&self, category_id: &str, section_id: &str) -> Result<bool> {
        let mut current = self.read_existing(category_id)?;
        if !remove_descriptor(&mut current.category, section_id) {
            return Ok(false);
        }

        let mut batch = WriteBatch::new();
        self.stage_write(&mut batch, &current.category, Some(current.version))?;
        self.store.commit(batch)?;

        info!("Unregistered section {}/{}", category_id, section_id);
        Ok(true)
    }

    /// The registry array, or empty when the category does not exist.
    pub fn list_sections(&self, category_id: &str) -> Result<Vec<SectionDescriptor>> {
        Ok(self
            .get_category(category_id)?
            .map(|c| c.sections)
            .unwrap_or_default())
    }

    /// Queues a whole-document write of `category`.
    ///
    /// With `expected_version` the write only lands if nobody rewrote the
    /// document since it was read; without it the document must not exist yet.
    pub fn stage_write(
        &self,
        batch: &mut WriteBatch,
        category: &CategoryDocument,
        expected_version: Option<i64>,
    ) -> Result<()> {
        let path = DocumentPath::category(&category.category_id)?;
        let data = serde_json::to_value(category)?;
        match expected_version {
            Some(version) => batch.set_if_version(path, data, version),
            None => batch.create(path, data),
        };
        Ok(())
    }
}

/// Appends to the registry array, rejecting duplicate ids.
pub fn append_descriptor(category: &mut CategoryDocument, descriptor: SectionDescriptor) -> Result<()> {
    if category.has_section(&descriptor.section_id) {
        return Err(CatalogError::Conflict(format!(
            "Section {} already exists for category {}",
            descriptor.section_id, category.category_id
        )));
    }
    category.updated_at = descriptor.updated_at;
    category.sections.push(descriptor);
    Ok(())
}

/// Removes from the registry array; `false` when nothing matched.
pub fn remove_descriptor(category: &mut CategoryDocument, section_id: &str) -> bool {
    let before = category.sections.len();
    category.sections.retain(|s| s.section_id != section_id);
    let removed = category.sections.len() != before;
    if removed {
        category.updated_at = now();
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::memory_store;

    fn registry() -> CategorySectionRegistry {
        CategorySectionRegistry::new(memory_store())
    }

    #[test]
    fn ensure_category_is_idempotent() {
        let registry = registry();

        let first = registry.ensure_category("electronics", None).unwrap();
        assert_eq!(first.title, "Electronics");
        assert!(first.sections.is_empty());

        let second = registry.ensure_category("electronics", Some("Gadgets")).unwrap();
        assert_eq!(second.title, "Electronics");
        assert_eq!(registry.list_categories().unwrap().len(), 1);
    }

    #[test]
    fn ensure_category_uses_title_hint_on_creation() {
        let registry = registry();
        let created = registry.ensure_category("homeDecor", Some(" Home & Decor ")).unwrap();
        assert_eq!(created.title, "Home & Decor");
    }

    #[test]
    fn duplicate_descriptor_conflicts() {
        let registry = registry();
        registry.ensure_category("home", None).unwrap();

        registry
            .add_section_descriptor("home", "popular", "Popular", "popular", None)
            .unwrap();
        let err = registry
            .add_section_descriptor("home", "popular", "Again", "popular", None)
            .unwrap_err();

        assert!(matches!(err, CatalogError::Conflict(_)));
        let sections = registry.list_sections("home").unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Popular");
    }

    #[test]
    fn descriptors_keep_insertion_order() {
        let registry = registry();
        registry.ensure_category("home", None).unwrap();
        for id in ["popular", "flashSale", "bestSellers"] {
            registry.add_section_descriptor("home", id, id, id, None).unwrap();
        }

        let ids: Vec<_> = registry
            .list_sections("home")
            .unwrap()
            .into_iter()
            .map(|s| s.section_id)
            .collect();
        assert_eq!(ids, ["popular", "flashSale", "bestSellers"]);
    }

    #[test]
    fn add_descriptor_requires_category_and_title() {
        let registry = registry();
        let missing = registry
            .add_section_descriptor("nowhere", "popular", "Popular", "popular", None)
            .unwrap_err();
        assert!(matches!(missing, CatalogError::NotFound(_)));

        registry.ensure_category("home", None).unwrap();
        let blank = registry
            .add_section_descriptor("home", "popular", "   ", "popular", None)
            .unwrap_err();
        assert!(matches!(blank, CatalogError::Validation(_)));
    }

    #[test]
    fn update_descriptor_merges_fields() {
        let registry = registry();
        registry.ensure_category("home", None).unwrap();
        registry
            .add_section_descriptor("home", "deals", "Deals", "deals", None)
            .unwrap();

        let patch = SectionDescriptorPatch {
            allows_price_override: Some(true),
            ..Default::default()
        };
        let updated = registry.update_section_descriptor("home", "deals", &patch).unwrap();

        assert_eq!(updated.title, "Deals");
        assert!(updated.allows_price_override());
        assert_eq!(registry.list_sections("home").unwrap()[0], updated);
    }

    #[test]
    fn update_descriptor_reports_missing_pieces() {
        let registry = registry();
        let patch = SectionDescriptorPatch::default();

        let no_category = registry.update_section_descriptor("home", "deals", &patch).unwrap_err();
        assert!(matches!(no_category, CatalogError::NotFound(ref m) if m.contains("Category")));

        registry.ensure_category("home", None).unwrap();
        let no_section = registry.update_section_descriptor("home", "deals", &patch).unwrap_err();
        assert!(matches!(no_section, CatalogError::NotFound(ref m) if m.contains("Section")));
    }

    #[test]
    fn remove_descriptor_rewrites_registry() {
        let registry = registry();
        registry.ensure_category("home", None).unwrap();
        registry.add_section_descriptor("home", "a", "A", "a", None).unwrap();
        registry.add_section_descriptor("home", "b", "B", "b", None).unwrap();

        assert!(registry.remove_section_descriptor("home", "a").unwrap());
        assert!(!registry.remove_section_descriptor("home", "a").unwrap());

        let ids: Vec<_> = registry
            .list_sections("home")
            .unwrap()
            .into_iter()
            .map(|s| s.section_id)
            .collect();
        assert_eq!(ids, ["b"]);
    }

    #[test]
    fn list_sections_of_unknown_category_is_empty() {
        assert!(registry().list_sections("ghost").unwrap().is_empty());
    }
}
