//! # Discovery Routes
//!
//! The registry may miss sections whose items were written without a
//! descriptor. These routes compare the registry with a probe of candidate
//! section ids (`?probe=a,b`, or the configured list), repair the registry
//! from the probe, and return the complete category view.

use crate::catalog::HomeCatalog;
use crate::services::run_blocking;
use actix_web::{web, Responder};
use catalog_common::requests::{ProbeQuery, ReconcileRequest};

/// `GET /categories/{category_id}/discovery?probe=a,b`
pub(crate) async fn discover(
    catalog: web::Data<HomeCatalog>,
    path: web::Path<String>,
    query: web::Query<ProbeQuery>,
) -> impl Responder {
    let category_id = path.into_inner();
    let candidates = query.candidates();
    run_blocking(catalog, move |catalog| {
        catalog.discover(&category_id, candidates.as_deref())
    })
    .await
}

/// Restores descriptors for sections that hold items but are not registered.
/// Running it again changes nothing.
pub(crate) async fn reconcile(
    catalog: web::Data<HomeCatalog>,
    path: web::Path<String>,
    payload: Option<web::Json<ReconcileRequest>>,
) -> impl Responder {
    let category_id = path.into_inner();
    let candidates = payload.and_then(|p| p.into_inner().candidates);
    run_blocking(catalog, move |catalog| {
        catalog.reconcile(&category_id, candidates.as_deref())
    })
    .await
}

/// Every registered or probed section with its ranked items and their
/// effective prices.
pub(crate) async fn listing(
    catalog: web::Data<HomeCatalog>,
    path: web::Path<String>,
    query: web::Query<ProbeQuery>,
) -> impl Responder {
    let category_id = path.into_inner();
    let candidates = query.candidates();
    run_blocking(catalog, move |catalog| {
        catalog.listing(&category_id, candidates.as_deref())
    })
    .await
}
