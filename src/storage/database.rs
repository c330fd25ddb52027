//! Database Layer with Connection Pooling and Safe Transactions
//!
//! SQLite document table featuring:
//! - Connection pooling via r2d2 for concurrent access
//! - Panic-safe transactions with automatic rollback
//! - Version-tracked migrations
//! - WAL mode for optimal read/write performance

use std::path::Path;
use std::sync::Arc;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

use super::document::{Document, expect_object, merge_shallow};
use crate::types::{PawError, Result, ResultExt, UserId, log_filter_error, now_rfc3339};

/// Shared database handle for async contexts.
pub type SharedDatabase = Arc<Database>;

const SCHEMA: &str = include_str!("schema.sql");

/// Current schema version for migration tracking
const SCHEMA_VERSION: u32 = 2;

/// Migration definitions
struct Migration {
    version: u32,
    description: &'static str,
    up: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 2,
    description: "Add owner lookup index",
    up: "CREATE INDEX IF NOT EXISTS idx_documents_owner
         ON documents (collection, owner_id, created_at)",
}];

const DOCUMENT_COLUMNS: &str = "collection, id, owner_id, data, created_at, updated_at";

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool
    pub max_size: u32,
    /// Minimum idle connections to keep ready
    pub min_idle: u32,
    /// Timeout for acquiring a connection (seconds)
    pub connection_timeout_secs: u64,
}

impl PoolConfig {
    const MIN_POOL_SIZE: u32 = 2;
    const MAX_POOL_SIZE: u32 = 8;

    /// clamp(cores, MIN, MAX); the CLI issues one query at a time
    pub fn optimal_pool_size() -> u32 {
        let cores = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(2);
        cores.clamp(Self::MIN_POOL_SIZE, Self::MAX_POOL_SIZE)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: Self::optimal_pool_size(),
            min_idle: 1,
            connection_timeout_secs: 30,
        }
    }
}

/// Thread-safe database with connection pooling.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open database with connection pooling at the specified path.
    ///
    /// Parent directories are created as needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Self::open_with_config(path, PoolConfig::default())
    }

    /// Open database with custom pool configuration.
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: PoolConfig) -> Result<Self> {
        let manager =
            SqliteConnectionManager::file(path.as_ref()).with_init(Self::configure_connection);

        let pool = Pool::builder()
            .max_size(config.max_size)
            .min_idle(Some(config.min_idle))
            .connection_timeout(std::time::Duration::from_secs(
                config.connection_timeout_secs,
            ))
            .build(manager)
            .map_err(|e| PawError::Storage(format!("Failed to create connection pool: {}", e)))?;

        Ok(Self { pool })
    }

    /// Open an in-memory database for testing or temporary use.
    ///
    /// A single pooled connection keeps every query on the same database.
    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();

        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| PawError::Storage(format!("Failed to create in-memory pool: {}", e)))?;

        Ok(Self { pool })
    }

    fn configure_connection(conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            PRAGMA wal_autocheckpoint = 1000;
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| {
            PawError::Storage(format!("Failed to acquire database connection: {}", e))
        })
    }

    /// Initialize database schema.
    pub fn initialize(&self) -> Result<()> {
        let conn = self.conn()?;
        let existing_version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap_or(0);

        conn.execute_batch(SCHEMA)
            .with_context("Failed to initialize database schema")?;

        // A fresh database gets the full schema at once
        if existing_version == 0 {
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)
                .with_context("Failed to set schema version")?;
        }

        drop(conn);
        self.migrate()
    }

    /// Run version-tracked migrations.
    fn migrate(&self) -> Result<()> {
        let conn = self.conn()?;

        let current_version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap_or(0);

        for migration in MIGRATIONS {
            if migration.version > current_version {
                conn.execute_batch(migration.up).with_context_fn(|| {
                    format!(
                        "Failed to apply migration {}: {}",
                        migration.version, migration.description
                    )
                })?;

                tracing::info!(
                    "Applied migration {}: {}",
                    migration.version,
                    migration.description
                );
            }
        }

        if current_version < SCHEMA_VERSION {
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)
                .with_context("Failed to update schema version")?;
        }

        Ok(())
    }

    /// Schema version recorded in the database
    pub fn schema_version(&self) -> Result<u32> {
        let conn = self.conn()?;
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .with_context("Failed to read schema version")
    }

    /// Execute a function within a panic-safe database transaction.
    ///
    /// If the closure panics, the transaction is rolled back and an error is
    /// returned instead of poisoning the connection pool.
    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + std::panic::UnwindSafe,
    {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .with_context("Failed to start transaction")?;

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(&tx)));

        match result {
            Ok(Ok(value)) => {
                tx.commit().with_context("Failed to commit transaction")?;
                Ok(value)
            }
            // Rolled back on drop
            Ok(Err(e)) => Err(e),
            Err(panic_payload) => {
                let panic_msg = panic_payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic_payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "Unknown panic".to_string());

                tracing::error!("Transaction panicked: {}", panic_msg);
                Err(PawError::Storage(format!(
                    "Transaction panicked: {}",
                    panic_msg
                )))
            }
        }
    }

    // =========================================================================
    // Documents
    // =========================================================================

    pub fn insert_document(
        &self,
        collection: &str,
        id: &str,
        owner: &UserId,
        data: Value,
    ) -> Result<Document> {
        let data = Value::Object(expect_object(data, "Document")?);
        let now = now_rfc3339();
        let encoded = serde_json::to_string(&data)?;

        let inserted = self
            .conn()?
            .execute(
                "INSERT INTO documents (collection, id, owner_id, data, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(collection, id) DO NOTHING",
                params![collection, id, owner.as_str(), encoded, now],
            )
            .with_context_fn(|| format!("Failed to insert {}/{}", collection, id))?;

        if inserted == 0 {
            return Err(PawError::Storage(format!(
                "Document {}/{} already exists",
                collection, id
            )));
        }

        tracing::debug!(collection, id, "Inserted document");

        Ok(Document {
            collection: collection.to_string(),
            id: id.to_string(),
            owner_id: owner.clone(),
            data,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    pub fn fetch_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let conn = self.conn()?;
        select_one(&conn, collection, id)
    }

    /// Documents of one owner, oldest first
    pub fn fetch_documents(&self, collection: &str, owner: &UserId) -> Result<Vec<Document>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM documents
             WHERE collection = ?1 AND owner_id = ?2
             ORDER BY created_at ASC, id ASC",
            DOCUMENT_COLUMNS
        ))?;

        let docs: Vec<Document> = stmt
            .query_map(params![collection, owner.as_str()], map_document_row)?
            .filter_map(|r| log_filter_error(r, "reading document row"))
            .filter_map(|row| log_filter_error(row.into_document(), "decoding document"))
            .collect();

        Ok(docs)
    }

    /// Shallow-merge `patch` into a stored document inside one transaction
    pub fn merge_document(&self, collection: &str, id: &str, patch: Value) -> Result<Document> {
        let patch = expect_object(patch, "Patch")?;

        self.transaction(move |conn| {
            let mut doc = select_one(conn, collection, id)?
                .ok_or_else(|| PawError::not_found(collection, id))?;

            let mut fields = expect_object(doc.data, "Stored document")?;
            merge_shallow(&mut fields, patch);
            doc.data = Value::Object(fields);
            doc.updated_at = now_rfc3339();

            conn.execute(
                "UPDATE documents SET data = ?1, updated_at = ?2
                 WHERE collection = ?3 AND id = ?4",
                params![
                    serde_json::to_string(&doc.data)?,
                    doc.updated_at,
                    collection,
                    id
                ],
            )?;

            Ok(doc)
        })
    }

    /// Delete a document, returning its last state
    pub fn remove_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.transaction(move |conn| {
            let existing = select_one(conn, collection, id)?;
            if existing.is_some() {
                conn.execute(
                    "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                    params![collection, id],
                )?;
            }
            Ok(existing)
        })
    }
}

/// Raw row before the JSON payload is decoded
struct DocumentRow {
    collection: String,
    id: String,
    owner_id: String,
    data: String,
    created_at: String,
    updated_at: String,
}

impl DocumentRow {
    fn into_document(self) -> Result<Document> {
        Ok(Document {
            collection: self.collection,
            id: self.id,
            owner_id: UserId::new(self.owner_id),
            data: serde_json::from_str(&self.data)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn map_document_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentRow> {
    Ok(DocumentRow {
        collection: row.get(0)?,
        id: row.get(1)?,
        owner_id: row.get(2)?,
        data: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn select_one(conn: &Connection, collection: &str, id: &str) -> Result<Option<Document>> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {} FROM documents WHERE collection = ?1 AND id = ?2",
                DOCUMENT_COLUMNS
            ),
            params![collection, id],
            map_document_row,
        )
        .optional()?;

    row.map(DocumentRow::into_document).transpose()
}
