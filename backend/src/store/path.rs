//! Validated document and collection paths.
//!
//! Layout:
//! - `categories/{categoryId}`
//! - `categories/{categoryId}/sections/{sectionId}/items/{productId}`
//! - `products/{productId}`

use crate::error::{CatalogError, Result};
use regex::Regex;
use std::fmt::{Display, Formatter};
use std::sync::OnceLock;

const CATEGORIES: &str = "categories";
const PRODUCTS: &str = "products";

fn segment_pattern() -> Result<&'static Regex> {
    static PATTERN: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$"))
        .as_ref()
        .map_err(|e| CatalogError::Upstream(format!("Regex error: {}", e)))
}

/// Checks one path segment; `label` names it in the error message.
pub fn validate_segment(label: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CatalogError::Validation(format!("{} must not be blank", label)));
    }
    if !segment_pattern()?.is_match(value) {
        return Err(CatalogError::Validation(format!(
            "{} '{}' may only contain letters, digits, '-' and '_'",
            label, value
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn categories() -> Self {
        CollectionPath(CATEGORIES.to_string())
    }

    pub fn products() -> Self {
        CollectionPath(PRODUCTS.to_string())
    }

    pub fn section_items(category_id: &str, section_id: &str) -> Result<Self> {
        validate_segment("categoryId", category_id)?;
        validate_segment("sectionId", section_id)?;
        Ok(CollectionPath(format!(
            "{}/{}/sections/{}/items",
            CATEGORIES, category_id, section_id
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn doc(&self, id: &str) -> Result<DocumentPath> {
        validate_segment("document id", id)?;
        Ok(DocumentPath {
            collection: self.clone(),
            id: id.to_string(),
        })
    }
}

impl Display for CollectionPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

impl DocumentPath {
    pub fn category(category_id: &str) -> Result<Self> {
        validate_segment("categoryId", category_id)?;
        CollectionPath::categories().doc(category_id)
    }

    pub fn item(category_id: &str, section_id: &str, product_id: &str) -> Result<Self> {
        validate_segment("productId", product_id)?;
        CollectionPath::section_items(category_id, section_id)?.doc(product_id)
    }

    pub fn product(product_id: &str) -> Result<Self> {
        validate_segment("productId", product_id)?;
        CollectionPath::products().doc(product_id)
    }

    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Display for DocumentPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}
