//! Cascade deletion of a section: its item collection and its descriptor.
//!
//! Items go in id-ordered chunks, each chunk one batch. The last chunk is
//! committed together with the descriptor removal, so a section that fits in a
//! single chunk disappears atomically. A failure leaves a cursor (the last
//! deleted id) to resume from; since deletes are idempotent, restarting from
//! the top is also safe. A resumed run sweeps once more from the first id
//! before removing the descriptor, so items written below the cursor in the
//! meantime are not left behind.

use crate::catalog::items::SectionItemStore;
use crate::catalog::registry::{self, CategorySectionRegistry};
use crate::error::{CatalogError, Result};
use crate::store::{CollectionPath, DocumentPath, DocumentStore, WriteBatch, MAX_BATCH_OPERATIONS};
use catalog_common::model::report::CascadeReport;
use log::{debug, info};
use std::sync::Arc;

#[derive(Clone)]
pub struct CascadeDeleter {
    store: Arc<dyn DocumentStore>,
    registry: CategorySectionRegistry,
    items: SectionItemStore,
    chunk_size: usize,
}

impl CascadeDeleter {
    /// `chunk_size` is clamped so a chunk plus the registry rewrite fits in one batch.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        registry: CategorySectionRegistry,
        items: SectionItemStore,
        chunk_size: usize,
    ) -> Self {
        Self {
            store,
            registry,
            items,
            chunk_size: chunk_size.clamp(1, MAX_BATCH_OPERATIONS - 1),
        }
    }

    pub fn delete_section(
        &self,
        category_id: &str,
        section_id: &str,
        resume_after: Option<&str>,
    ) -> Result<CascadeReport> {
        CollectionPath::section_items(category_id, section_id)?;
        if self.registry.read(category_id)?.is_none() {
            return Err(CatalogError::NotFound(format!("Category {} not found", category_id)));
        }

        let mut report = CascadeReport {
            category_id: category_id.to_string(),
            section_id: section_id.to_string(),
            ..Default::default()
        };
        let mut cursor = resume_after.map(str::to_string);
        let mut sweep_pending = cursor.is_some();

        loop {
            let chunk = self
                .items
                .item_paths_after(category_id, section_id, cursor.as_deref(), self.chunk_size)
                .map_err(|e| interrupted(e, &report))?;

            if chunk.len() == self.chunk_size {
                self.store.batch_delete(&chunk).map_err(|e| interrupted(e, &report))?;
                record(&mut report, &chunk);
                cursor = report.last_deleted_id.clone();
                debug!(
                    "Deleted chunk {} of {}/{} ({} items so far)",
                    report.chunks, category_id, section_id, report.deleted_items
                );
                continue;
            }

            if sweep_pending {
                if !chunk.is_empty() {
                    self.store.batch_delete(&chunk).map_err(|e| interrupted(e, &report))?;
                    record(&mut report, &chunk);
                }
                debug!("Sweeping {}/{} from the start", category_id, section_id);
                sweep_pending = false;
                cursor = None;
                continue;
            }

            self.commit_final_chunk(category_id, section_id, &chunk, &mut report)
                .map_err(|e| interrupted(e, &report))?;
            break;
        }

        info!(
            "Deleted section {}/{}: {} item(s) in {} chunk(s), descriptor removed: {}",
            category_id, section_id, report.deleted_items, report.chunks, report.descriptor_removed
        );
        Ok(report)
    }

    fn commit_final_chunk(
        &self,
        category_id: &str,
        section_id: &str,
        chunk: &[DocumentPath],
        report: &mut CascadeReport,
    ) -> Result<()> {
        if chunk.is_empty() {
            report.descriptor_removed = match self.registry.remove_section_descriptor(category_id, section_id) {
                Ok(removed) => removed,
                // The category went away while its items were being deleted.
                Err(CatalogError::NotFound(_)) => false,
                Err(e) => return Err(e),
            };
            return Ok(());
        }

        let mut batch = WriteBatch::new();
        for path in chunk {
            batch.delete(path.clone());
        }

        let mut descriptor_removed = false;
        if let Some(mut current) = self.registry.read(category_id)? {
            if registry::remove_descriptor(&mut current.category, section_id) {
                self.registry
                    .stage_write(&mut batch, &current.category, Some(current.version))?;
                descriptor_removed = true;
            }
        }

        self.store.commit(batch)?;
        record(report, chunk);
        report.descriptor_removed = descriptor_removed;
        Ok(())
    }
}

fn record(report: &mut CascadeReport, chunk: &[DocumentPath]) {
    if let Some(last) = chunk.last() {
        report.deleted_items += chunk.len();
        report.chunks += 1;
        report.last_deleted_id = Some(last.id().to_string());
    }
}

/// Names the resume cursor in the error once some items are already gone.
fn interrupted(err: CatalogError, report: &CascadeReport) -> CatalogError {
    match &report.last_deleted_id {
        Some(last) => err.map_message(|m| {
            format!(
                "{}; {} item(s) already deleted, resume after {}",
                m, report.deleted_items, last
            )
        }),
        None => err,
    }
}
