//! Product snapshot capture.
//!
//! The product catalog is an external collaborator; the catalog only needs
//! "give me the canonical fields of product X".

use crate::error::{CatalogError, Result};
use crate::store::{DocumentPath, DocumentStore};
use catalog_common::model::item::ProductSnapshot;
use catalog_common::model::product::Product;
use catalog_common::time::normalize_strict;
use md5::Context;
use std::sync::Arc;

pub trait ProductSnapshotResolver: Send + Sync {
    fn get_product(&self, product_id: &str) -> Result<Option<Product>>;
}

/// Reads products from the `products` collection of the document store.
#[derive(Clone)]
pub struct StoreProductResolver {
    store: Arc<dyn DocumentStore>,
}

impl StoreProductResolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

impl ProductSnapshotResolver for StoreProductResolver {
    fn get_product(&self, product_id: &str) -> Result<Option<Product>> {
        let path = DocumentPath::product(product_id)?;
        match self.store.get_document(&path)? {
            Some(doc) => doc.decode().map(Some),
            None => Ok(None),
        }
    }
}

/// Builds the snapshot embedded in a section item.
///
/// Product timestamps are validated strictly: a corrupt value refuses the
/// write instead of being replaced by "now".
pub fn capture(product_id: &str, product: &Product) -> Result<ProductSnapshot> {
    let strict = |field: &str, raw: &Option<serde_json::Value>| {
        normalize_strict(raw).map_err(|e| {
            CatalogError::Validation(format!(
                "Product {} has a malformed {}: {}",
                product_id, field, e
            ))
        })
    };

    let mut snapshot = ProductSnapshot {
        product_id: product_id.to_string(),
        name: product.name.clone(),
        price: product.price,
        mrp: product.mrp,
        discount_price: product.discount_price,
        image: product.image.clone(),
        stock: product.stock,
        category_id: product.category_id.clone(),
        subcategory_id: product.subcategory_id.clone(),
        is_active: product.is_active,
        created_at: strict("createdAt", &product.created_at)?,
        updated_at: strict("updatedAt", &product.updated_at)?,
        fingerprint: String::new(),
    };
    snapshot.fingerprint = fingerprint(&snapshot)?;
    Ok(snapshot)
}

/// md5 of the snapshot's canonical JSON, excluding the fingerprint itself.
pub fn fingerprint(snapshot: &ProductSnapshot) -> Result<String> {
    let mut unsigned = snapshot.clone();
    unsigned.fingerprint.clear();
    let bytes = serde_json::to_vec(&unsigned)?;

    let mut hasher = Context::new();
    hasher.consume(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteDocumentStore;
    use serde_json::json;

    fn product(value: serde_json::Value) -> Product {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn capture_copies_fields_and_signs_them() {
        let snapshot = capture(
            "p1",
            &product(json!({
                "name": "Phone",
                "price": 999.0,
                "discountPrice": 899.0,
                "stock": 4,
                "categoryId": "electronics",
                "createdAt": {"_seconds": 1_700_000_000, "_nanoseconds": 0},
            })),
        )
        .unwrap();

        assert_eq!(snapshot.product_id, "p1");
        assert_eq!(snapshot.name, "Phone");
        assert_eq!(snapshot.stock, 4);
        assert_eq!(snapshot.created_at.map(|t| t.timestamp()), Some(1_700_000_000));
        assert_eq!(snapshot.updated_at, None);
        assert_eq!(snapshot.fingerprint.len(), 32);
        assert_eq!(fingerprint(&snapshot).unwrap(), snapshot.fingerprint);
    }

    #[test]
    fn fingerprint_changes_with_content() {
        let base = capture("p1", &product(json!({"name": "Phone", "price": 10.0}))).unwrap();
        let repriced = capture("p1", &product(json!({"name": "Phone", "price": 12.0}))).unwrap();
        assert_ne!(base.fingerprint, repriced.fingerprint);
    }

    #[test]
    fn corrupt_product_timestamp_is_refused() {
        let err = capture("p1", &product(json!({"name": "Phone", "updatedAt": "soon"}))).unwrap_err();
        assert!(matches!(err, CatalogError::Validation(ref m) if m.contains("updatedAt")));
    }

    #[test]
    fn store_resolver_reads_products_collection() {
        let store = Arc::new(SqliteDocumentStore::open_in_memory().unwrap());
        store
            .create_document(&DocumentPath::product("p1").unwrap(), json!({"name": "Lamp"}))
            .unwrap();
        let resolver = StoreProductResolver::new(store);

        assert_eq!(resolver.get_product("p1").unwrap().unwrap().name, "Lamp");
        assert!(resolver.get_product("p2").unwrap().is_none());
    }
}
