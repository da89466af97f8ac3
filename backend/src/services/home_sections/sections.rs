//! # Section Registry Routes
//!
//! Sections are descriptors in their category's registry; their items live in a
//! separate collection per section.
//!
//! ## Workflow:
//!
//! 1.  **Create**: validates the id and title, creates the category if needed and
//!     appends the descriptor. A duplicate id answers 409.
//! 2.  **Update**: merges `{title?, type?, allowsPriceOverride?}` into the
//!     descriptor. An empty patch answers 400.
//! 3.  **Delete**: removes the items in chunks, then the descriptor. When a chunk
//!     fails the message names the last deleted id; sending it back as
//!     `resumeAfter` continues from there.

use crate::catalog::HomeCatalog;
use crate::services::run_blocking;
use actix_web::{web, Responder};
use catalog_common::requests::{CreateSectionRequest, DeleteSectionQuery, UpdateSectionRequest};

/// `GET /categories/{category_id}/sections`: descriptors in display order.
pub(crate) async fn list(catalog: web::Data<HomeCatalog>, path: web::Path<String>) -> impl Responder {
    let category_id = path.into_inner();
    run_blocking(catalog, move |catalog| catalog.list_sections(&category_id)).await
}

/// Registers an empty section.
///
/// # Arguments
/// * `path` - The owning category id.
/// * `payload` - `{sectionId, title, type?, allowsPriceOverride?}`; `type` defaults to the id.
///
/// # Returns
/// The stored `SectionDescriptor` in the envelope.
pub(crate) async fn create(
    catalog: web::Data<HomeCatalog>,
    path: web::Path<String>,
    payload: web::Json<CreateSectionRequest>,
) -> impl Responder {
    let category_id = path.into_inner();
    let req = payload.into_inner();
    run_blocking(catalog, move |catalog| catalog.create_section(&category_id, &req)).await
}

/// `PATCH /categories/{category_id}/sections/{section_id}`
pub(crate) async fn update(
    catalog: web::Data<HomeCatalog>,
    path: web::Path<(String, String)>,
    payload: web::Json<UpdateSectionRequest>,
) -> impl Responder {
    let (category_id, section_id) = path.into_inner();
    let patch = payload.into_inner();
    run_blocking(catalog, move |catalog| {
        catalog.update_section(&category_id, &section_id, &patch)
    })
    .await
}

/// `DELETE ...?resumeAfter=` continues an interrupted cascade after the given
/// item id.
pub(crate) async fn delete(
    catalog: web::Data<HomeCatalog>,
    path: web::Path<(String, String)>,
    query: web::Query<DeleteSectionQuery>,
) -> impl Responder {
    let (category_id, section_id) = path.into_inner();
    let resume_after = query.into_inner().resume_after;
    run_blocking(catalog, move |catalog| {
        catalog.delete_section(&category_id, &section_id, resume_after.as_deref())
    })
    .await
}
