//! Cache-invalidation hook.
//!
//! After every successful write the catalog announces which listing went
//! stale. Delivery is fire-and-forget: a failed notification is logged and the
//! write still succeeds.

use log::{info, warn};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidationScope {
    pub category_id: String,
    /// `None` when the whole category view is stale (registry changes).
    pub section_id: Option<String>,
}

impl InvalidationScope {
    pub fn category(category_id: &str) -> Self {
        Self {
            category_id: category_id.to_string(),
            section_id: None,
        }
    }

    pub fn section(category_id: &str, section_id: &str) -> Self {
        Self {
            category_id: category_id.to_string(),
            section_id: Some(section_id.to_string()),
        }
    }
}

impl Display for InvalidationScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.section_id {
            Some(section) => write!(f, "{}/{}", self.category_id, section),
            None => write!(f, "{}", self.category_id),
        }
    }
}

pub trait CacheInvalidator: Send + Sync {
    fn invalidate(&self, scope: &InvalidationScope) -> Result<(), String>;
}

/// Calls the hook and swallows its failure.
pub fn notify(invalidator: &dyn CacheInvalidator, scope: InvalidationScope) {
    if let Err(e) = invalidator.invalidate(&scope) {
        warn!("Cache invalidation for {} failed: {}", scope, e);
    }
}

/// Pushes scopes onto a bounded channel without ever blocking the writer.
pub struct ChannelInvalidator {
    tx: mpsc::Sender<InvalidationScope>,
}

impl ChannelInvalidator {
    pub fn new(tx: mpsc::Sender<InvalidationScope>) -> Self {
        Self { tx }
    }
}

impl CacheInvalidator for ChannelInvalidator {
    fn invalidate(&self, scope: &InvalidationScope) -> Result<(), String> {
        self.tx.try_send(scope.clone()).map_err(|e| e.to_string())
    }
}

/// Drains invalidations until every sender is gone.
pub async fn start_invalidation_listener(mut rx: mpsc::Receiver<InvalidationScope>) {
    while let Some(scope) = rx.recv().await {
        info!("Listing view stale: {}", scope);
    }
}
