//! SQLite store implementation.
//!
//! Provides the `SqliteStore` struct that implements the `DatabaseClient`
//! trait over a single SQLite file using sqlx. The query pipeline opens the
//! store read-only; the importer opens it read-write.

use crate::db::{quote_identifier, Column, ColumnInfo, DatabaseClient, QueryResult, Row, Schema, Table, Value};
use crate::error::{ParleyError, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, Statement, TypeInfo, ValueRef};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Query timeout in seconds.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// How long a connection waits on a lock held by another process.
const BUSY_TIMEOUT_SECS: u64 = 5;

/// How the store file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Reads only. The file must already exist; the engine refuses writes.
    ReadOnly,
    /// Reads and writes. The file is created when missing.
    ReadWrite,
}

/// SQLite store client.
#[derive(Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
    path: PathBuf,
    mode: OpenMode,
}

impl SqliteStore {
    /// Opens the store at `path`.
    pub async fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if mode == OpenMode::ReadOnly && !path.exists() {
            return Err(ParleyError::store(format!(
                "Store file not found: {}. Import data first with /import <file>.",
                path.display()
            )));
        }

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .read_only(mode == OpenMode::ReadOnly)
            .create_if_missing(mode == OpenMode::ReadWrite)
            .busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| {
                ParleyError::store(format!("Cannot open store {}: {e}", path.display()))
            })?;

        debug!(path = %path.display(), ?mode, "Opened store");
        Ok(Self { pool, path, mode })
    }

    /// Opens the store read-only.
    pub async fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path, OpenMode::ReadOnly).await
    }

    /// Opens the store read-write, creating the file if needed.
    pub async fn open_read_write(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path, OpenMode::ReadWrite).await
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mode the store was opened with.
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    fn ensure_writable(&self) -> Result<()> {
        match self.mode {
            OpenMode::ReadWrite => Ok(()),
            OpenMode::ReadOnly => Err(ParleyError::store("Store is opened read-only")),
        }
    }

    /// Drops a table if it exists. Returns whether it existed.
    pub async fn drop_table(&self, name: &str) -> Result<bool> {
        self.ensure_writable()?;
        let existed = self.table_exists(name).await?;

        let sql = format!("DROP TABLE IF EXISTS {}", quote_identifier(name));
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| ParleyError::store(format!("Failed to drop table {name}: {e}")))?;

        info!(table = name, existed, "Dropped table");
        Ok(existed)
    }

    /// Replaces `name` with a new table holding `rows`.
    ///
    /// Drop, create and insert run in a single transaction so a failed
    /// import leaves any previous table intact.
    pub async fn replace_table(&self, name: &str, columns: &[Column], rows: &[Row]) -> Result<()> {
        self.ensure_writable()?;
        if columns.is_empty() {
            return Err(ParleyError::import(format!("Table {name} has no columns")));
        }

        let table = quote_identifier(name);
        let column_defs = columns
            .iter()
            .map(|c| format!("{} {}", quote_identifier(&c.name), c.data_type))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; columns.len()].join(", ");
        let insert_sql = format!("INSERT INTO {table} VALUES ({placeholders})");

        let to_store_err = |e: sqlx::Error| ParleyError::store(format!("Failed to write {name}: {e}"));

        let mut tx = self.pool.begin().await.map_err(to_store_err)?;

        sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
            .execute(&mut *tx)
            .await
            .map_err(to_store_err)?;
        sqlx::query(&format!("CREATE TABLE {table} ({column_defs})"))
            .execute(&mut *tx)
            .await
            .map_err(to_store_err)?;

        for row in rows {
            let mut query = sqlx::query(&insert_sql);
            for value in row {
                query = match value {
                    Value::Null => query.bind(None::<i64>),
                    Value::Int(i) => query.bind(*i),
                    Value::Float(f) => query.bind(*f),
                    Value::String(s) => query.bind(s.clone()),
                    Value::Bytes(b) => query.bind(b.clone()),
                };
            }
            query.execute(&mut *tx).await.map_err(to_store_err)?;
        }

        tx.commit().await.map_err(to_store_err)?;

        info!(table = name, rows = rows.len(), "Replaced table");
        Ok(())
    }

    async fn table_exists(&self, name: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1")
                .bind(name)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| ParleyError::store(format!("Failed to read catalog: {e}")))?;
        Ok(count > 0)
    }

    async fn fetch_table_names(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT name
            FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ParleyError::store(format!("Failed to fetch tables: {e}")))
    }

    async fn fetch_columns(&self, table_name: &str) -> Result<Vec<Column>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")
                .bind(table_name)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    ParleyError::store(format!("Failed to fetch columns for {table_name}: {e}"))
                })?;

        Ok(rows
            .into_iter()
            .map(|(name, data_type)| Column { name, data_type })
            .collect())
    }

    /// Column metadata for statements that returned no rows.
    async fn fetch_column_metadata(&self, sql: &str) -> Vec<ColumnInfo> {
        match self.pool.prepare(sql).await {
            Ok(statement) => statement
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), declared_type_name(col.type_info().name())))
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl DatabaseClient for SqliteStore {
    async fn introspect_schema(&self) -> Result<Schema> {
        let names = self.fetch_table_names().await?;
        let mut tables = Vec::with_capacity(names.len());

        for name in names {
            let columns = self.fetch_columns(&name).await?;
            tables.push(Table { name, columns });
        }

        Ok(Schema { tables })
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let rows = tokio::time::timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            sqlx::query(sql).fetch_all(&self.pool),
        )
        .await
        .map_err(|_| {
            ParleyError::query(format!("Query timed out after {QUERY_TIMEOUT_SECS} seconds"))
        })?
        .map_err(|e| ParleyError::query(format_query_error(e)))?;

        let execution_time = start.elapsed();

        let columns = match rows.first() {
            Some(first) => column_info_from_rows(first, &rows),
            None => self.fetch_column_metadata(sql).await,
        };

        let rows: Vec<Row> = rows.iter().map(convert_row).collect();
        debug!(rows = rows.len(), ?execution_time, "Query executed");

        Ok(QueryResult {
            columns,
            rows,
            execution_time,
        })
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        self.fetch_table_names().await
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Expression columns have no declared type; report them as such.
fn declared_type_name(name: &str) -> &str {
    if name == "NULL" {
        ""
    } else {
        name
    }
}

/// Builds column metadata, falling back to the storage class of the first
/// non-null value for columns without a declared type.
fn column_info_from_rows(first: &SqliteRow, rows: &[SqliteRow]) -> Vec<ColumnInfo> {
    first
        .columns()
        .iter()
        .enumerate()
        .map(|(i, col)| {
            let declared = declared_type_name(col.type_info().name());
            let data_type = if declared.is_empty() {
                rows.iter()
                    .find_map(|row| {
                        let raw = row.try_get_raw(i).ok()?;
                        (!raw.is_null()).then(|| raw.type_info().name().to_string())
                    })
                    .unwrap_or_default()
            } else {
                declared.to_string()
            };
            ColumnInfo::new(col.name(), data_type)
        })
        .collect()
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    (0..row.columns().len())
        .map(|i| convert_value(row, i))
        .collect()
}

/// Decodes a value by its runtime storage class, not the declared type,
/// since SQLite columns may hold mixed classes.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let storage_class = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_string(),
        Err(_) => return Value::Null,
    };

    match storage_class.as_str() {
        "INTEGER" => row
            .try_get::<i64, _>(index)
            .map(Value::Int)
            .unwrap_or(Value::Null),
        "REAL" => row
            .try_get::<f64, _>(index)
            .map(Value::Float)
            .unwrap_or(Value::Null),
        "BLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(Value::Bytes)
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<String, _>(index)
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

/// Extracts the engine's message, e.g. `no such table: foo`.
fn format_query_error(error: sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    }
}
