pub mod home_sections;

use crate::catalog::HomeCatalog;
use actix_web::error::InternalError;
use actix_web::{web, HttpResponse};
use catalog_common::response::{ApiResult, ErrorKind};
use log::warn;
use serde::Serialize;
use std::fmt::{Debug, Display};

/// Serializes the envelope with a status code matching its error kind.
pub(crate) fn reply<T: Serialize>(result: ApiResult<T>) -> HttpResponse {
    let mut builder = match result.kind {
        None => HttpResponse::Ok(),
        Some(ErrorKind::NotFound) => HttpResponse::NotFound(),
        Some(ErrorKind::Conflict) => HttpResponse::Conflict(),
        Some(ErrorKind::ValidationError) => HttpResponse::BadRequest(),
        Some(ErrorKind::UpstreamFailure) => HttpResponse::ServiceUnavailable(),
    };
    if !result.success {
        warn!("Request failed: {}", result.message);
    }
    builder.json(result)
}

/// JSON body extraction with the envelope on failure instead of plain text.
pub(crate) fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| invalid_request("body", err))
}

pub(crate) fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| invalid_request("query", err))
}

pub(crate) fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| invalid_request("path", err))
}

fn invalid_request<E>(part: &str, err: E) -> actix_web::Error
where
    E: Debug + Display + 'static,
{
    let message = format!("Invalid request {}: {}", part, err);
    let response = reply(ApiResult::<()>::failure(ErrorKind::ValidationError, message));
    InternalError::from_response(err, response).into()
}

/// Runs a catalog call on the blocking pool; the store does synchronous I/O.
pub(crate) async fn run_blocking<T, F>(catalog: web::Data<HomeCatalog>, call: F) -> HttpResponse
where
    T: Serialize + Send + 'static,
    F: FnOnce(&HomeCatalog) -> ApiResult<T> + Send + 'static,
{
    let catalog = catalog.into_inner();
    match tokio::task::spawn_blocking(move || call(&catalog)).await {
        Ok(result) => reply(result),
        Err(e) => reply(ApiResult::<()>::failure(
            ErrorKind::UpstreamFailure,
            format!("Task join error: {}", e),
        )),
    }
}
