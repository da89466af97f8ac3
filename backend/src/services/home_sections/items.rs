//! # Section Item Routes
//!
//! Items are ranked product entries of one section, each embedding a snapshot
//! of the product taken when it was added.
//!
//! ## Workflow:
//!
//! 1.  **Add**: the product is read from the catalog, its snapshot captured and
//!     the item created. The section is registered in the same write when this
//!     is its first item.
//! 2.  **Bulk add**: many products in one call, ranked after the current items,
//!     with one result per product.
//! 3.  **Update / remove**: rank and price override changes, delete-if-exists.
//! 4.  **Snapshot maintenance**: `stale` compares snapshots with the live
//!     products; `refresh` rewrites the drifted ones.

use crate::catalog::HomeCatalog;
use crate::services::run_blocking;
use actix_web::{web, Responder};
use catalog_common::requests::{AddItemRequest, BulkAddItemsRequest, UpdateItemRequest};

type SectionPath = web::Path<(String, String)>;
type ItemPath = web::Path<(String, String, String)>;

/// Items in display order: rank, then time added, then product id.
pub(crate) async fn list(catalog: web::Data<HomeCatalog>, path: SectionPath) -> impl Responder {
    let (category_id, section_id) = path.into_inner();
    run_blocking(catalog, move |catalog| catalog.list_items(&category_id, &section_id)).await
}

/// Adds a product; the section is registered on its first item.
pub(crate) async fn add(
    catalog: web::Data<HomeCatalog>,
    path: SectionPath,
    payload: web::Json<AddItemRequest>,
) -> impl Responder {
    let (category_id, section_id) = path.into_inner();
    let req = payload.into_inner();
    run_blocking(catalog, move |catalog| catalog.add_item(&category_id, &section_id, &req)).await
}

/// Appends several products after the section's current last rank.
///
/// # Arguments
/// * `payload` - `{productIds, priceOverride?}`; the override applies to every item.
///
/// # Returns
/// The `BulkAddReport` with one result per requested id. Missing, duplicate and
/// already-present products count as failures without failing the request.
pub(crate) async fn bulk_add(
    catalog: web::Data<HomeCatalog>,
    path: SectionPath,
    payload: web::Json<BulkAddItemsRequest>,
) -> impl Responder {
    let (category_id, section_id) = path.into_inner();
    let req = payload.into_inner();
    run_blocking(catalog, move |catalog| {
        catalog.bulk_add_items(&category_id, &section_id, &req)
    })
    .await
}

pub(crate) async fn get(catalog: web::Data<HomeCatalog>, path: ItemPath) -> impl Responder {
    let (category_id, section_id, product_id) = path.into_inner();
    run_blocking(catalog, move |catalog| {
        catalog.get_item(&category_id, &section_id, &product_id)
    })
    .await
}

/// Applies `{rank?, priceOverride?}` to one item.
///
/// An override is checked against the section's capability; an unregistered
/// section is judged by the descriptor it would get on registration.
pub(crate) async fn update(
    catalog: web::Data<HomeCatalog>,
    path: ItemPath,
    payload: web::Json<UpdateItemRequest>,
) -> impl Responder {
    let (category_id, section_id, product_id) = path.into_inner();
    let patch = payload.into_inner();
    run_blocking(catalog, move |catalog| {
        catalog.update_item(&category_id, &section_id, &product_id, &patch)
    })
    .await
}

pub(crate) async fn remove(catalog: web::Data<HomeCatalog>, path: ItemPath) -> impl Responder {
    let (category_id, section_id, product_id) = path.into_inner();
    run_blocking(catalog, move |catalog| {
        catalog.remove_item(&category_id, &section_id, &product_id)
    })
    .await
}

/// Products whose live record no longer matches the embedded snapshot, or
/// that no longer exist.
pub(crate) async fn stale(catalog: web::Data<HomeCatalog>, path: SectionPath) -> impl Responder {
    let (category_id, section_id) = path.into_inner();
    run_blocking(catalog, move |catalog| catalog.stale_items(&category_id, &section_id)).await
}

/// Rewrites drifted snapshots and returns the refreshed product ids. Items of
/// deleted products are left alone.
pub(crate) async fn refresh(catalog: web::Data<HomeCatalog>, path: SectionPath) -> impl Responder {
    let (category_id, section_id) = path.into_inner();
    run_blocking(catalog, move |catalog| {
        catalog.refresh_snapshots(&category_id, &section_id)
    })
    .await
}
