//! Document store port.
//!
//! The catalog only talks to storage through [`DocumentStore`]. The port is
//! shaped after a managed document database: JSON documents addressed by
//! `collection/id`, shallow-merge updates, ordered collection scans and atomic
//! write batches. It deliberately offers no way to enumerate the nested
//! collections under a document; see `catalog::discovery` for how the catalog
//! copes with that.

mod path;
mod sqlite;

pub use path::{validate_segment, CollectionPath, DocumentPath};
pub use sqlite::SqliteDocumentStore;

use crate::error::{CatalogError, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Upper bound on operations in one [`WriteBatch`].
pub const MAX_BATCH_OPERATIONS: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    /// Bumped on every write; used for optimistic concurrency.
    pub version: i64,
    pub data: Value,
}

impl StoredDocument {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.data.clone()).map_err(|e| {
            CatalogError::Upstream(format!("Malformed document '{}': {}", self.id, e))
        })
    }
}

/// Condition a `Set` must satisfy for the whole batch to commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Create-if-absent.
    Absent,
    /// The stored document still has this version.
    Version(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set {
        path: DocumentPath,
        data: Value,
        precondition: Precondition,
    },
    /// Shallow merge of top-level fields; the document must exist.
    Update {
        path: DocumentPath,
        patch: Map<String, Value>,
    },
    /// Delete-if-exists.
    Delete { path: DocumentPath },
}

impl WriteOp {
    pub fn path(&self) -> &DocumentPath {
        match self {
            WriteOp::Set { path, .. } | WriteOp::Update { path, .. } | WriteOp::Delete { path } => {
                path
            }
        }
    }
}

/// Ordered set of writes applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn create(&mut self, path: DocumentPath, data: Value) -> &mut Self {
        self.push(WriteOp::Set {
            path,
            data,
            precondition: Precondition::Absent,
        })
    }

    pub fn set_if_version(&mut self, path: DocumentPath, data: Value, version: i64) -> &mut Self {
        self.push(WriteOp::Set {
            path,
            data,
            precondition: Precondition::Version(version),
        })
    }

    pub fn update(&mut self, path: DocumentPath, patch: Map<String, Value>) -> &mut Self {
        self.push(WriteOp::Update { path, patch })
    }

    pub fn delete(&mut self, path: DocumentPath) -> &mut Self {
        self.push(WriteOp::Delete { path })
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Collection scan parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Equality filters on top-level fields.
    pub filters: Vec<(String, Value)>,
    /// Ascending sort on a top-level field; ties fall back to document id.
    pub order_by: Option<String>,
    /// Only documents whose id sorts after this one.
    pub start_after: Option<String>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    pub fn start_after(mut self, id: impl Into<String>) -> Self {
        self.start_after = Some(id.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

pub trait DocumentStore: Send + Sync {
    fn get_document(&self, path: &DocumentPath) -> Result<Option<StoredDocument>>;

    fn list_collection(&self, path: &CollectionPath, query: &Query) -> Result<Vec<StoredDocument>>;

    /// Applies every operation of `batch` atomically.
    fn commit(&self, batch: WriteBatch) -> Result<()>;

    /// Fails with `Conflict` when the document already exists.
    fn create_document(&self, path: &DocumentPath, data: Value) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.create(path.clone(), data);
        self.commit(batch)
    }

    /// Fails with `NotFound` when the document does not exist.
    fn update_document(&self, path: &DocumentPath, patch: Map<String, Value>) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.update(path.clone(), patch);
        self.commit(batch)
    }

    fn delete_document(&self, path: &DocumentPath) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.delete(path.clone());
        self.commit(batch)
    }

    fn batch_delete(&self, refs: &[DocumentPath]) -> Result<usize> {
        if refs.is_empty() {
            return Ok(0);
        }
        let mut batch = WriteBatch::new();
        for path in refs {
            batch.delete(path.clone());
        }
        self.commit(batch)?;
        Ok(refs.len())
    }
}
