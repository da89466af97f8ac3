//! # Category Routes
//!
//! Category documents hold a category's title and its section registry. These
//! routes list and fetch them and create one on demand.
//!
//! `PUT` is idempotent: an existing category is returned unchanged, so clients
//! may call it before every section write without overwriting a curated title.

use crate::catalog::HomeCatalog;
use crate::services::run_blocking;
use actix_web::{web, Responder};
use catalog_common::requests::EnsureCategoryRequest;

/// `GET /categories`: every category document in id order.
pub(crate) async fn list(catalog: web::Data<HomeCatalog>) -> impl Responder {
    run_blocking(catalog, |catalog| catalog.list_categories()).await
}

/// `GET /categories/{category_id}`. Answers 404 when the category was never created.
pub(crate) async fn get(catalog: web::Data<HomeCatalog>, path: web::Path<String>) -> impl Responder {
    let category_id = path.into_inner();
    run_blocking(catalog, move |catalog| catalog.get_category(&category_id)).await
}

/// `PUT /categories/{category_id}`. The optional `{title}` is only used when
/// the category has to be created.
pub(crate) async fn ensure(
    catalog: web::Data<HomeCatalog>,
    path: web::Path<String>,
    payload: Option<web::Json<EnsureCategoryRequest>>,
) -> impl Responder {
    let category_id = path.into_inner();
    let title = payload.and_then(|p| p.into_inner().title);
    run_blocking(catalog, move |catalog| {
        catalog.ensure_category(&category_id, title.as_deref())
    })
    .await
}
