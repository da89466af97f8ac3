//! `/api/home-sections` routes.

mod categories;
mod discovery;
mod items;
mod reconcile;
mod sections;

use crate::services::{json_config, path_config, query_config};
use actix_web::web;

const API_PATH: &str = "/api/home-sections";

const CATEGORY: &str = "/categories/{category_id}";
const SECTION: &str = "/categories/{category_id}/sections/{section_id}";

/// Every route of the catalog API. Extractor failures inside the scope answer
/// with the `ApiResult` envelope; `json_limit` caps request bodies.
pub fn configure_routes(json_limit: usize) -> actix_web::Scope {
    web::scope(API_PATH)
        .app_data(json_config(json_limit))
        .app_data(query_config())
        .app_data(path_config())
        .route("/categories", web::get().to(categories::list))
        .route(CATEGORY, web::get().to(categories::get))
        .route(CATEGORY, web::put().to(categories::ensure))
        .route(&format!("{}/sections", CATEGORY), web::get().to(sections::list))
        .route(&format!("{}/sections", CATEGORY), web::post().to(sections::create))
        .route(SECTION, web::patch().to(sections::update))
        .route(SECTION, web::delete().to(sections::delete))
        .route(&format!("{}/items", SECTION), web::get().to(items::list))
        .route(&format!("{}/items", SECTION), web::post().to(items::add))
        .route(&format!("{}/items/bulk", SECTION), web::post().to(items::bulk_add))
        .route(&format!("{}/items/{{product_id}}", SECTION), web::get().to(items::get))
        .route(&format!("{}/items/{{product_id}}", SECTION), web::patch().to(items::update))
        .route(&format!("{}/items/{{product_id}}", SECTION), web::delete().to(items::remove))
        .route(&format!("{}/stale", SECTION), web::get().to(items::stale))
        .route(&format!("{}/refresh", SECTION), web::post().to(items::refresh))
        .route(&format!("{}/discovery", CATEGORY), web::get().to(discovery::discover))
        .route(&format!("{}/reconcile", CATEGORY), web::post().to(discovery::reconcile))
        .route(&format!("{}/listing", CATEGORY), web::get().to(discovery::listing))
        .route("/reconcile", web::post().to(reconcile::start))
        .route("/jobs/{job_id}", web::get().to(reconcile::status))
}
