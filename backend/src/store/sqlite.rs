//! SQLite adapter for the document store port.
//!
//! Every document is one row of `documents(collection, id, version, data)`
//! with `data` holding the JSON text. Write batches run inside a single SQLite
//! transaction, so a failing operation rolls back the whole batch.

use super::{
    CollectionPath, DocumentPath, DocumentStore, Precondition, Query, StoredDocument, WriteBatch,
    WriteOp, MAX_BATCH_OPERATIONS,
};
use crate::error::{CatalogError, Result};
use log::debug;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id         TEXT NOT NULL,
        version    INTEGER NOT NULL,
        data       TEXT NOT NULL,
        PRIMARY KEY (collection, id)
    );
";

pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CatalogError::Upstream("Document store lock poisoned".to_string()))
    }
}

fn read_row(tx: &Transaction<'_>, path: &DocumentPath) -> Result<Option<(i64, String)>> {
    let row = tx
        .query_row(
            "SELECT version, data FROM documents WHERE collection = ?1 AND id = ?2",
            params![path.collection().as_str(), path.id()],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;
    Ok(row)
}

fn write_row(tx: &Transaction<'_>, path: &DocumentPath, version: i64, data: &Value) -> Result<()> {
    let json = serde_json::to_string(data)?;
    tx.execute(
        "INSERT INTO documents (collection, id, version, data) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (collection, id) DO UPDATE SET version = excluded.version, data = excluded.data",
        params![path.collection().as_str(), path.id(), version, json],
    )?;
    Ok(())
}

fn apply(tx: &Transaction<'_>, op: WriteOp) -> Result<()> {
    match op {
        WriteOp::Set {
            path,
            data,
            precondition,
        } => {
            let current = read_row(tx, &path)?.map(|(version, _)| version);
            match (precondition, current) {
                (Precondition::Absent, Some(_)) => {
                    return Err(CatalogError::Conflict(format!(
                        "Document {} already exists",
                        path
                    )));
                }
                (Precondition::Version(expected), Some(found)) if expected != found => {
                    return Err(CatalogError::Conflict(format!(
                        "Document {} was modified concurrently (expected version {}, found {})",
                        path, expected, found
                    )));
                }
                (Precondition::Version(_), None) => {
                    return Err(CatalogError::Conflict(format!(
                        "Document {} was deleted concurrently",
                        path
                    )));
                }
                _ => {}
            }
            write_row(tx, &path, current.unwrap_or(0) + 1, &data)
        }
        WriteOp::Update { path, patch } => {
            let (version, raw) = read_row(tx, &path)?
                .ok_or_else(|| CatalogError::NotFound(format!("Document {} not found", path)))?;
            let mut doc: Value = serde_json::from_str(&raw)?;
            let fields = doc.as_object_mut().ok_or_else(|| {
                CatalogError::Upstream(format!("Document {} is not a JSON object", path))
            })?;
            for (key, value) in patch {
                fields.insert(key, value);
            }
            write_row(tx, &path, version + 1, &doc)
        }
        WriteOp::Delete { path } => {
            tx.execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                params![path.collection().as_str(), path.id()],
            )?;
            Ok(())
        }
    }
}

fn field_path(field: &str) -> Result<String> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(CatalogError::Validation(format!(
            "Unsupported query field '{}'",
            field
        )));
    }
    Ok(format!("$.{}", field))
}

fn to_sql(field: &str, value: &Value) -> Result<SqlValue> {
    match value {
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => Ok(match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        }),
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        _ => Err(CatalogError::Validation(format!(
            "Unsupported filter value for '{}': {}",
            field, value
        ))),
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn get_document(&self, path: &DocumentPath) -> Result<Option<StoredDocument>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT version, data FROM documents WHERE collection = ?1 AND id = ?2",
                params![path.collection().as_str(), path.id()],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        match row {
            Some((version, raw)) => Ok(Some(StoredDocument {
                id: path.id().to_string(),
                version,
                data: serde_json::from_str(&raw)?,
            })),
            None => Ok(None),
        }
    }

    fn list_collection(&self, path: &CollectionPath, query: &Query) -> Result<Vec<StoredDocument>> {
        let mut sql = String::from("SELECT id, version, data FROM documents WHERE collection = ?1");
        let mut args: Vec<SqlValue> = vec![SqlValue::Text(path.as_str().to_string())];

        for (field, value) in &query.filters {
            if value.is_null() {
                args.push(SqlValue::Text(field_path(field)?));
                sql.push_str(&format!(" AND json_extract(data, ?{}) IS NULL", args.len()));
                continue;
            }
            args.push(SqlValue::Text(field_path(field)?));
            let field_arg = args.len();
            args.push(to_sql(field, value)?);
            sql.push_str(&format!(
                " AND json_extract(data, ?{}) = ?{}",
                field_arg,
                args.len()
            ));
        }

        if let Some(cursor) = &query.start_after {
            args.push(SqlValue::Text(cursor.clone()));
            sql.push_str(&format!(" AND id > ?{}", args.len()));
        }

        match &query.order_by {
            Some(field) => {
                args.push(SqlValue::Text(field_path(field)?));
                sql.push_str(&format!(" ORDER BY json_extract(data, ?{}), id", args.len()));
            }
            None => sql.push_str(" ORDER BY id"),
        }

        if let Some(limit) = query.limit {
            args.push(SqlValue::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
            sql.push_str(&format!(" LIMIT ?{}", args.len()));
        }

        debug!("list_collection {}: {}", path, sql);

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, version, raw)| {
                Ok(StoredDocument {
                    id,
                    version,
                    data: serde_json::from_str(&raw)?,
                })
            })
            .collect()
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        if batch.len() > MAX_BATCH_OPERATIONS {
            return Err(CatalogError::Validation(format!(
                "Write batch holds {} operations; the limit is {}",
                batch.len(),
                MAX_BATCH_OPERATIONS
            )));
        }
        if batch.is_empty() {
            return Ok(());
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let count = batch.len();
        for op in batch.into_ops() {
            let path = op.path().to_string();
            apply(&tx, op).map_err(|e| {
                debug!("batch rejected at {}: {}", path, e);
                e
            })?;
        }
        tx.commit()?;
        debug!("committed batch of {} operations", count);
        Ok(())
    }
}
