//! `SQLite` Database Engine Implementation
//!
//! This module implements [`ConnectionProvider`] for `SQLite` database files.
//!
//! # Features
//! - File-based connections (`/path/to/db.sqlite`)
//! - Pooling delegated to `deadpool_sqlite::Pool`, bounded by [`PoolConfig`]
//! - Positional `?` parameters bound through `rusqlite::ToSql`
//!
//! # Implementation Notes
//! - `rusqlite` is synchronous; every statement runs through `Object::interact`
//!   on tokio's blocking pool, so a locked database never stalls the runtime
//! - BLOB data is Base64-encoded for JSON safety
//! - Lock contention bounded via `busy_timeout` (the pool's acquire timeout)
//! - `:memory:` gives every pooled connection its own database; use a file to share data

use deadpool_sqlite::{Config, Object, Pool, PoolConfig as DeadpoolConfig, PoolError, Runtime, Timeouts};
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{Connection as RawConnection, ToSql};
use std::sync::Arc;
use std::time::Duration;

use crate::engine::{
    Connection, ConnectionConfig, ConnectionProvider, DatabaseType, Param, QueryOutput, Row,
    Statement, StatementKind, WriteOutcome,
};
use crate::error::{DeskError, Result};
use crate::pool::{PoolConfig, PoolStatus, Tally};

/// `SQLite` connection provider
pub struct SqliteProvider {
    pool: Pool,
    config: PoolConfig,
    tally: Arc<Tally>,
}

impl SqliteProvider {
    /// Build a provider from a connection config; no connection is opened yet
    pub fn new(config: &ConnectionConfig, pool: PoolConfig) -> Result<Self> {
        // Validate config is for SQLite
        if config.engine != DatabaseType::SQLite {
            return Err(DeskError::invalid_input(format!(
                "Expected SQLite engine, got {}",
                config.engine
            )));
        }

        let path = config
            .file
            .clone()
            .ok_or_else(|| DeskError::invalid_input("SQLite requires 'file' parameter"))?;

        if pool.max_connections == 0 {
            return Err(DeskError::invalid_input("SQLite pool requires max_connections > 0"));
        }

        let mut deadpool = DeadpoolConfig::new(pool.max_connections);
        deadpool.timeouts = Timeouts {
            wait: Some(pool.acquire_timeout()),
            create: Some(pool.acquire_timeout()),
            recycle: Some(pool.acquire_timeout()),
        };

        let mut cfg = Config::new(path);
        cfg.pool = Some(deadpool);

        let built = cfg.create_pool(Runtime::Tokio1).map_err(|e| {
            DeskError::config_error(format!("Failed to build SQLite pool: {e}"))
        })?;

        Ok(Self { pool: built, config: pool, tally: Arc::new(Tally::default()) })
    }
}

impl ConnectionProvider for SqliteProvider {
    type Connection = SqliteConnection;

    fn engine(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    async fn acquire(&self) -> Result<SqliteConnection> {
        let obj = self.pool.get().await.map_err(|e| match e {
            PoolError::Timeout(_) => DeskError::connection_failed(format!(
                "Timed out after {}ms waiting for a free connection",
                self.config.acquire_timeout_ms
            )),
            PoolError::Closed => DeskError::connection_failed("Connection pool is closed"),
            PoolError::Backend(e) => {
                DeskError::connection_failed(format!("Failed to open SQLite database: {e}"))
            }
            other => DeskError::connection_failed(format!("Failed to acquire SQLite connection: {other}")),
        })?;

        self.tally.record_acquire();
        Ok(SqliteConnection {
            obj: Some(obj),
            busy_timeout: self.config.acquire_timeout(),
            tally: Arc::clone(&self.tally),
        })
    }

    fn status(&self) -> PoolStatus {
        let status = self.pool.status();
        self.tally.status(self.config.max_connections, usize::try_from(status.available).ok())
    }

    async fn close(&self) {
        self.pool.close();
        tracing::info!("sqlite pool closed");
    }
}

/// A pooled `SQLite` connection
///
/// Dropped without `release()` or `discard()` (a cancelled request), it is
/// taken out of the pool and counted as discarded.
pub struct SqliteConnection {
    obj: Option<Object>,
    busy_timeout: Duration,
    tally: Arc<Tally>,
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        if let Some(obj) = self.obj.take() {
            drop(Object::take(obj));
            self.tally.record_discard();
        }
    }
}

impl Connection for SqliteConnection {
    async fn execute(&mut self, statement: &Statement) -> Result<QueryOutput> {
        let obj = self
            .obj
            .as_ref()
            .ok_or_else(|| DeskError::connection_failed("Connection already returned to the pool"))?;

        let statement = statement.clone();
        let busy_timeout = self.busy_timeout;

        obj.interact(move |conn| {
            conn.busy_timeout(busy_timeout).map_err(|e| {
                DeskError::engine_error("sqlite", format!("Failed to set busy timeout: {e}"))
            })?;
            execute_statement(conn, &statement)
        })
        .await
        .map_err(|e| DeskError::engine_error("sqlite", format!("Statement did not complete: {e}")))?
    }

    async fn release(mut self) {
        // Dropping the Object hands it back to deadpool.
        if let Some(obj) = self.obj.take() {
            drop(obj);
            self.tally.record_release();
            tracing::debug!("sqlite connection released");
        }
    }

    async fn discard(mut self) {
        if let Some(obj) = self.obj.take() {
            drop(Object::take(obj));
            self.tally.record_discard();
            tracing::debug!("sqlite connection discarded");
        }
    }
}

impl ToSql for Param {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(Value::Null),
            Self::Text(text) => ToSqlOutput::Borrowed(ValueRef::Text(text.as_bytes())),
            Self::Int(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            Self::Float(f) => ToSqlOutput::Owned(Value::Real(*f)),
        })
    }
}

/// Execute one statement and shape its result
fn execute_statement(conn: &RawConnection, statement: &Statement) -> Result<QueryOutput> {
    let mut stmt = conn
        .prepare(statement.sql)
        .map_err(|e| DeskError::query_failed(format!("Failed to prepare query: {e}")))?;

    let params = rusqlite::params_from_iter(statement.params.iter());

    if statement.kind.returns_rows() {
        let column_names: Vec<String> =
            stmt.column_names().iter().map(|s| (*s).to_string()).collect();

        let rows = stmt
            .query(params)
            .map_err(|e| DeskError::query_failed(format!("Failed to execute query: {e}")))?;

        let rows = rows
            .mapped(|row| row_to_json(&column_names, row))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| DeskError::query_failed(format!("Failed to fetch row: {e}")))?;

        Ok(QueryOutput::Rows(rows))
    } else {
        let affected = stmt
            .execute(params)
            .map_err(|e| DeskError::query_failed(format!("Failed to execute query: {e}")))?;

        let insert_id = if statement.kind == StatementKind::Insert {
            u64::try_from(conn.last_insert_rowid()).unwrap_or(0)
        } else {
            0
        };

        Ok(QueryOutput::Write(WriteOutcome {
            affected_rows: affected as u64,
            insert_id,
            warning_status: 0,
        }))
    }
}

/// Convert a `SQLite` row to a JSON object keyed by column name
fn row_to_json(column_names: &[String], row: &rusqlite::Row) -> rusqlite::Result<Row> {
    let mut map = Row::new();

    for (idx, name) in column_names.iter().enumerate() {
        map.insert(name.clone(), sqlite_value_to_json(row, idx)?);
    }

    Ok(map)
}

/// Convert `SQLite` value to JSON value
fn sqlite_value_to_json(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<serde_json::Value> {
    let value_ref = row.get_ref(idx)?;

    Ok(match value_ref {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::Number(i.into()),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map_or(serde_json::Value::Null, serde_json::Value::Number), // NaN/Infinity as null
        ValueRef::Text(s) => {
            let text = std::str::from_utf8(s).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
            serde_json::Value::String(text.to_string())
        }
        ValueRef::Blob(b) => {
            use base64::Engine;
            serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(b))
        }
    })
}
