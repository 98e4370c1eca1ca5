//! Database Engine Traits and Core Types
//!
//! This module defines the core abstractions the HTTP layer runs statements through.
//! Each engine (`MySQL`, `SQLite`) implements [`ConnectionProvider`] and [`Connection`].
//!
//! # Checkout Discipline
//! A provider hands out connections from a bounded pool. Every checkout ends in
//! exactly one of [`Connection::release`] (success) or [`Connection::discard`]
//! (statement failure). [`execute_once`] is the only place that decides which.
//!
//! # Engine Isolation
//! Each engine implementation is completely independent.
//! No shared SQL helpers or cross-engine abstractions beyond these traits.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;

use crate::error::Result;
use crate::pool::PoolStatus;
use crate::validation::FieldValue;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "mysql")]
pub mod mysql;

/// Supported database engine types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// `MySQL` database (includes `MariaDB`)
    MySQL,
    /// `SQLite` database
    SQLite,
}

impl DatabaseType {
    /// Get the engine name as a string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MySQL => "mysql",
            Self::SQLite => "sqlite",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DatabaseType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::MySQL),
            "sqlite" => Ok(Self::SQLite),
            other => Err(format!("unknown database engine '{other}'")),
        }
    }
}

/// Connection configuration for database engines
///
/// Fields are engine-specific (e.g., `file` only applies to `SQLite`).
/// Fields left out of a config file keep their [`Default`] values.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Database engine type
    pub engine: DatabaseType,

    /// Hostname (for mysql)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Port number (for mysql)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Username (for mysql)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Password (for mysql)
    /// WARNING: Sensitive data, never serialized, logged, or echoed in errors
    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// Database name (for mysql)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Database file path (for sqlite)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl ConnectionConfig {
    /// Create a new `MySQL` connection config
    #[must_use]
    pub const fn mysql(
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    ) -> Self {
        Self {
            engine: DatabaseType::MySQL,
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            database: Some(database),
            file: None,
        }
    }

    /// Create a new `SQLite` connection config
    #[must_use]
    pub const fn sqlite(file: PathBuf) -> Self {
        Self {
            engine: DatabaseType::SQLite,
            host: None,
            port: None,
            user: None,
            password: None,
            database: None,
            file: Some(file),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::mysql(
            "localhost".to_string(),
            3306,
            "root".to_string(),
            String::new(),
            "sample".to_string(),
        )
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("engine", &self.engine)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("file", &self.file)
            .finish()
    }
}

/// A positional statement parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// SQL NULL
    Null,
    /// Text value
    Text(String),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
}

impl From<FieldValue> for Param {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Text(text) => Self::Text(text),
            FieldValue::Number(number) => {
                if let Some(i) = number.as_i64() {
                    Self::Int(i)
                } else if let Some(f) = number.as_f64() {
                    Self::Float(f)
                } else {
                    Self::Text(number.to_string())
                }
            }
            FieldValue::Flag(flag) => Self::Int(i64::from(flag)),
        }
    }
}

impl From<Option<FieldValue>> for Param {
    fn from(value: Option<FieldValue>) -> Self {
        value.map_or(Self::Null, Self::from)
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// What a statement does, decided by the route that owns it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    /// Whether the statement produces a row set
    #[must_use]
    pub const fn returns_rows(&self) -> bool {
        matches!(self, Self::Select)
    }
}

/// A fixed SQL template plus its bound parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub sql: &'static str,
    pub params: Vec<Param>,
}

impl Statement {
    /// Create a statement with no parameters bound yet
    #[must_use]
    pub const fn new(kind: StatementKind, sql: &'static str) -> Self {
        Self { kind, sql, params: Vec::new() }
    }

    /// Bind the next positional parameter
    #[must_use]
    pub fn bind(mut self, param: impl Into<Param>) -> Self {
        self.params.push(param.into());
        self
    }
}

/// One result row: column name to JSON value, in store column order
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Driver-style metadata returned for writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    /// Rows inserted, updated or deleted
    pub affected_rows: u64,

    /// Auto-generated key of an INSERT (0 when the table has none)
    pub insert_id: u64,

    /// Server warning count
    pub warning_status: u16,
}

/// Statement result as sent to the client
///
/// Row sets serialize as a bare JSON array, writes as a metadata object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryOutput {
    Rows(Vec<Row>),
    Write(WriteOutcome),
}

impl QueryOutput {
    /// Row set, if the statement returned one
    #[must_use]
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            Self::Rows(rows) => Some(rows),
            Self::Write(_) => None,
        }
    }

    /// Write metadata, if the statement was a write
    #[must_use]
    pub const fn write(&self) -> Option<&WriteOutcome> {
        match self {
            Self::Rows(_) => None,
            Self::Write(outcome) => Some(outcome),
        }
    }
}

/// A connection checked out of a provider's pool
pub trait Connection: Send {
    /// Execute one parameterized statement
    fn execute(
        &mut self,
        statement: &Statement,
    ) -> impl Future<Output = Result<QueryOutput>> + Send;

    /// Return the connection to the pool
    fn release(self) -> impl Future<Output = ()> + Send;

    /// Close the connection without returning it to the pool
    fn discard(self) -> impl Future<Output = ()> + Send;
}

/// Source of pooled connections
///
/// Created once at startup, shared by every request, closed at shutdown.
pub trait ConnectionProvider: Send + Sync + 'static {
    type Connection: Connection;

    /// Engine behind this provider
    fn engine(&self) -> DatabaseType;

    /// Check out a connection
    ///
    /// Fails with `ConnectionFailed` when the pool is exhausted past its
    /// acquire timeout, closed, or the store is unreachable. Never retries.
    fn acquire(&self) -> impl Future<Output = Result<Self::Connection>> + Send;

    /// Current pool report
    fn status(&self) -> PoolStatus;

    /// Drain the pool; later acquisitions fail
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// Run a single statement on a freshly acquired connection
///
/// On success the connection is released; on statement failure it is
/// discarded. Either way the checkout ends exactly once.
pub async fn execute_once<P: ConnectionProvider>(
    provider: &P,
    statement: &Statement,
) -> Result<QueryOutput> {
    let mut conn = provider.acquire().await.inspect_err(|err| {
        tracing::error!(
            engine = %provider.engine(),
            code = err.error_code(),
            error = %err,
            "connection acquisition failed"
        );
    })?;

    match conn.execute(statement).await {
        Ok(output) => {
            conn.release().await;
            Ok(output)
        }
        Err(err) => {
            tracing::error!(
                engine = %provider.engine(),
                code = err.error_code(),
                sql = statement.sql,
                error = %err,
                "statement failed, discarding connection"
            );
            conn.discard().await;
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_type_serialization() {
        assert_eq!(serde_json::to_string(&DatabaseType::MySQL).unwrap(), r#""mysql""#);
        assert_eq!(serde_json::to_string(&DatabaseType::SQLite).unwrap(), r#""sqlite""#);
    }

    #[test]
    fn test_database_type_from_str() {
        assert_eq!("MariaDB".parse::<DatabaseType>(), Ok(DatabaseType::MySQL));
        assert_eq!("sqlite".parse::<DatabaseType>(), Ok(DatabaseType::SQLite));
        assert!("postgres".parse::<DatabaseType>().is_err());
    }

    #[test]
    fn test_connection_config_constructors() {
        let mysql_config = ConnectionConfig::mysql(
            "localhost".to_string(),
            3306,
            "user".to_string(),
            "pass".to_string(),
            "db".to_string(),
        );
        assert_eq!(mysql_config.engine, DatabaseType::MySQL);
        assert_eq!(mysql_config.port, Some(3306));

        let sqlite_config = ConnectionConfig::sqlite(PathBuf::from("/tmp/test.db"));
        assert_eq!(sqlite_config.engine, DatabaseType::SQLite);
        assert!(sqlite_config.file.is_some());
    }

    #[test]
    fn test_password_never_leaks() {
        let config = ConnectionConfig::mysql(
            "db.internal".to_string(),
            3306,
            "app".to_string(),
            "hunter2".to_string(),
            "sample".to_string(),
        );
        assert!(!format!("{config:?}").contains("hunter2"));
        assert!(!serde_json::to_string(&config).unwrap().contains("hunter2"));
    }

    #[test]
    fn test_param_from_field_value() {
        let commission: FieldValue = serde_json::from_str("0.34").unwrap();
        assert_eq!(Param::from(commission), Param::Float(0.34));
        assert_eq!(Param::from(FieldValue::from("A019")), Param::Text("A019".to_string()));
        assert_eq!(Param::from(None), Param::Null);
        assert_eq!(Param::from(FieldValue::Flag(true)), Param::Int(1));
    }

    #[test]
    fn test_statement_binding_order() {
        let stmt = Statement::new(StatementKind::Update, "UPDATE t SET a = ? WHERE b = ?")
            .bind("x")
            .bind(Param::Int(7));
        assert_eq!(stmt.params, vec![Param::Text("x".to_string()), Param::Int(7)]);
        assert!(!stmt.kind.returns_rows());
    }

    #[test]
    fn test_query_output_serialization() {
        let write = QueryOutput::Write(WriteOutcome { affected_rows: 1, ..Default::default() });
        assert_eq!(
            serde_json::to_value(&write).unwrap(),
            serde_json::json!({"affectedRows": 1, "insertId": 0, "warningStatus": 0})
        );

        let mut row = Row::new();
        row.insert("AGENT_CODE".to_string(), serde_json::json!("A001"));
        let rows = QueryOutput::Rows(vec![row]);
        assert_eq!(serde_json::to_value(&rows).unwrap(), serde_json::json!([{"AGENT_CODE": "A001"}]));
        assert_eq!(rows.rows().map(<[Row]>::len), Some(1));
        assert!(rows.write().is_none());
    }
}
