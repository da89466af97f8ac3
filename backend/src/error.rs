//! Error taxonomy for catalog operations.
//!
//! Components return [`CatalogError`]; only the public boundary turns it into an
//! [`ApiResult`] envelope.

use catalog_common::response::{ApiResult, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// A category, section, item or product that must exist does not.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate id on create, or a concurrent write won the race.
    #[error("{0}")]
    Conflict(String),

    /// Missing, blank or malformed input.
    #[error("{0}")]
    Validation(String),

    /// The document store (or a task running against it) failed.
    #[error("{0}")]
    Upstream(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::NotFound(_) => ErrorKind::NotFound,
            CatalogError::Conflict(_) => ErrorKind::Conflict,
            CatalogError::Validation(_) => ErrorKind::ValidationError,
            CatalogError::Upstream(_) => ErrorKind::UpstreamFailure,
        }
    }

    /// Rewrites the message, keeping the kind.
    pub fn map_message(self, f: impl FnOnce(String) -> String) -> Self {
        match self {
            CatalogError::NotFound(m) => CatalogError::NotFound(f(m)),
            CatalogError::Conflict(m) => CatalogError::Conflict(f(m)),
            CatalogError::Validation(m) => CatalogError::Validation(f(m)),
            CatalogError::Upstream(m) => CatalogError::Upstream(f(m)),
        }
    }

    pub fn into_result<T>(self) -> ApiResult<T> {
        ApiResult::failure(self.kind(), self.to_string())
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(err: rusqlite::Error) -> Self {
        CatalogError::Upstream(format!("Document store error: {}", err))
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Upstream(format!("Malformed document: {}", err))
    }
}

/// Converts a component result into the uniform envelope.
pub fn respond<T>(result: Result<T>, message: impl Into<String>) -> ApiResult<T> {
    match result {
        Ok(data) => ApiResult::ok(message, data),
        Err(err) => err.into_result(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(CatalogError::NotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(CatalogError::Conflict("x".into()).kind(), ErrorKind::Conflict);
        assert_eq!(CatalogError::Validation("x".into()).kind(), ErrorKind::ValidationError);
        assert_eq!(CatalogError::Upstream("x".into()).kind(), ErrorKind::UpstreamFailure);
    }

    #[test]
    fn respond_keeps_message_text() {
        let failed: ApiResult<()> = respond(Err(CatalogError::NotFound("Item p9 not found".into())), "ok");
        assert!(!failed.success);
        assert_eq!(failed.message, "Item p9 not found");
        assert_eq!(failed.kind, Some(ErrorKind::NotFound));

        let done = respond(Ok(3), "Counted");
        assert!(done.success);
        assert_eq!(done.data, Some(3));
    }
}
