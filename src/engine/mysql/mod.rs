//! MySQL Database Engine Implementation
//!
//! This module implements [`ConnectionProvider`] for MySQL databases (including MariaDB).
//!
//! # Features
//! - Client-server connections via TCP
//! - Pooling delegated to `mysql_async::Pool`, bounded by `PoolConstraints`
//! - Prepared statements with positional `?` parameters
//! - MySQL and MariaDB version detection for `ping`
//!
//! # Implementation Notes
//! - Uses `mysql_async` (async driver, requires tokio runtime)
//! - Acquisition bounded via `tokio::time::timeout`
//! - Dropping a `Conn` returns it to the pool; `discard` disconnects it instead
//! - DECIMAL values arrive as strings and are passed through unchanged
//! - BLOB data is Base64-encoded for JSON safety

use mysql_async::{
    prelude::*, Conn, Opts, OptsBuilder, Params, PoolConstraints, PoolOpts, Row as RawRow, Value,
};

use crate::engine::{
    Connection, ConnectionConfig, ConnectionProvider, DatabaseType, Param, QueryOutput, Row,
    Statement, WriteOutcome,
};
use crate::error::{DeskError, Result};
use crate::pool::{PoolConfig, PoolStatus, Tally};

/// MySQL connection provider
pub struct MySqlProvider {
    pool: mysql_async::Pool,
    config: PoolConfig,
    tally: std::sync::Arc<Tally>,
}

impl MySqlProvider {
    /// Build a provider from a connection config
    ///
    /// No connection is opened until the first `acquire()`.
    pub fn new(config: &ConnectionConfig, pool: PoolConfig) -> Result<Self> {
        // Validate config is for MySQL
        if config.engine != DatabaseType::MySQL {
            return Err(DeskError::invalid_input(format!(
                "Expected MySQL engine, got {}",
                config.engine
            )));
        }

        let opts = build_mysql_opts(config, pool)?;

        Ok(Self {
            pool: mysql_async::Pool::new(opts),
            config: pool,
            tally: std::sync::Arc::new(Tally::default()),
        })
    }

    /// Connect once and report the server version, e.g. `("10.11.2", "MariaDB 10.11.2")`
    pub async fn server_version(&self) -> Result<(String, String)> {
        let mut conn = self.acquire().await?;
        let queried = conn.raw()?.query_first::<String, _>("SELECT VERSION()").await;
        let version = match queried {
            Ok(version) => version,
            Err(e) => {
                conn.discard().await;
                return Err(DeskError::query_failed(format!("Failed to query MySQL version: {e}")));
            }
        };
        conn.release().await;

        version
            .map(|v| parse_mysql_version(&v))
            .ok_or_else(|| DeskError::engine_error("mysql", "No version returned"))
    }
}

impl ConnectionProvider for MySqlProvider {
    type Connection = MySqlConnection;

    fn engine(&self) -> DatabaseType {
        DatabaseType::MySQL
    }

    async fn acquire(&self) -> Result<MySqlConnection> {
        let timeout = self.config.acquire_timeout();

        let conn = tokio::time::timeout(timeout, self.pool.get_conn())
            .await
            .map_err(|_| {
                DeskError::connection_failed(format!(
                    "Timed out after {}ms waiting for a MySQL connection",
                    self.config.acquire_timeout_ms
                ))
            })?
            .map_err(|e| DeskError::connection_failed(format!("Failed to connect to MySQL: {e}")))?;

        self.tally.record_acquire();
        Ok(MySqlConnection { conn: Some(conn), tally: std::sync::Arc::clone(&self.tally) })
    }

    fn status(&self) -> PoolStatus {
        self.tally.status(self.config.max_connections, None)
    }

    async fn close(&self) {
        match self.pool.clone().disconnect().await {
            Ok(()) => tracing::info!("mysql pool closed"),
            Err(e) => tracing::warn!(error = %e, "mysql pool did not close cleanly"),
        }
    }
}

/// A pooled MySQL connection
///
/// Dropped without `release()` or `discard()` (a cancelled request), it is
/// counted as discarded.
pub struct MySqlConnection {
    conn: Option<Conn>,
    tally: std::sync::Arc<Tally>,
}

impl MySqlConnection {
    fn raw(&mut self) -> Result<&mut Conn> {
        self.conn
            .as_mut()
            .ok_or_else(|| DeskError::connection_failed("Connection already returned to the pool"))
    }
}

impl Drop for MySqlConnection {
    fn drop(&mut self) {
        if self.conn.take().is_some() {
            self.tally.record_discard();
        }
    }
}

impl Connection for MySqlConnection {
    async fn execute(&mut self, statement: &Statement) -> Result<QueryOutput> {
        let params = to_mysql_params(&statement.params);
        let conn = self.raw()?;

        if statement.kind.returns_rows() {
            let rows: Vec<RawRow> = conn
                .exec(statement.sql, params)
                .await
                .map_err(|e| DeskError::query_failed(format!("Failed to execute query: {e}")))?;

            let rows = rows.iter().map(row_to_json).collect::<Result<Vec<_>>>()?;
            Ok(QueryOutput::Rows(rows))
        } else {
            conn.exec_drop(statement.sql, params)
                .await
                .map_err(|e| DeskError::query_failed(format!("Failed to execute query: {e}")))?;

            Ok(QueryOutput::Write(WriteOutcome {
                affected_rows: conn.affected_rows(),
                insert_id: conn.last_insert_id().unwrap_or(0),
                warning_status: conn.get_warnings(),
            }))
        }
    }

    async fn release(mut self) {
        // Dropping the Conn hands it back to mysql_async's pool.
        if let Some(conn) = self.conn.take() {
            drop(conn);
            self.tally.record_release();
            tracing::debug!("mysql connection released");
        }
    }

    async fn discard(mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.disconnect().await {
                tracing::warn!(error = %e, "mysql connection did not disconnect cleanly");
            }
            self.tally.record_discard();
            tracing::debug!("mysql connection discarded");
        }
    }
}

/// Build MySQL connection options from ConnectionConfig
fn build_mysql_opts(config: &ConnectionConfig, pool: PoolConfig) -> Result<Opts> {
    let host = config
        .host
        .as_ref()
        .ok_or_else(|| DeskError::invalid_input("MySQL requires 'host' parameter"))?;

    let port = config
        .port
        .ok_or_else(|| DeskError::invalid_input("MySQL requires 'port' parameter"))?;

    let user = config
        .user
        .as_ref()
        .ok_or_else(|| DeskError::invalid_input("MySQL requires 'user' parameter"))?;

    let database = config
        .database
        .as_ref()
        .ok_or_else(|| DeskError::invalid_input("MySQL requires 'database' parameter"))?;

    let constraints = PoolConstraints::new(0, pool.max_connections)
        .filter(|_| pool.max_connections > 0)
        .ok_or_else(|| DeskError::invalid_input("MySQL pool requires max_connections > 0"))?;

    let opts = OptsBuilder::default()
        .ip_or_hostname(host.clone())
        .tcp_port(port)
        .user(Some(user.clone()))
        .pass(config.password.clone())
        .db_name(Some(database.clone()))
        .pool_opts(PoolOpts::default().with_constraints(constraints));

    Ok(opts.into())
}

/// Parse MySQL version string to detect MySQL vs MariaDB
fn parse_mysql_version(version_string: &str) -> (String, String) {
    // Example MySQL: "8.0.35"
    // Example MariaDB: "10.11.2-MariaDB"

    if version_string.to_uppercase().contains("MARIADB") {
        let version = version_string.split('-').next().unwrap_or("unknown").to_string();
        (version.clone(), format!("MariaDB {version}"))
    } else {
        let version = version_string
            .split_whitespace()
            .next()
            .unwrap_or(version_string)
            .to_string();
        (version.clone(), format!("MySQL {version}"))
    }
}

/// Convert bound parameters to the driver's positional form
fn to_mysql_params(params: &[Param]) -> Params {
    if params.is_empty() {
        return Params::Empty;
    }

    Params::Positional(
        params
            .iter()
            .map(|param| match param {
                Param::Null => Value::NULL,
                Param::Text(text) => Value::from(text.as_str()),
                Param::Int(i) => Value::Int(*i),
                Param::Float(f) => Value::Double(*f),
            })
            .collect(),
    )
}

/// Convert a MySQL row to a JSON object keyed by column name
fn row_to_json(row: &RawRow) -> Result<Row> {
    let mut map = Row::new();

    for (idx, column) in row.columns_ref().iter().enumerate() {
        map.insert(column.name_str().to_string(), mysql_value_to_json(row, idx)?);
    }

    Ok(map)
}

/// Convert MySQL value to JSON value
fn mysql_value_to_json(row: &RawRow, idx: usize) -> Result<serde_json::Value> {
    let value = row
        .as_ref(idx)
        .ok_or_else(|| DeskError::query_failed(format!("Failed to get value at index {idx}")))?;

    let json_value = match value {
        Value::NULL => serde_json::Value::Null,

        Value::Bytes(bytes) => {
            if let Ok(s) = std::str::from_utf8(bytes) {
                serde_json::Value::String(s.to_string())
            } else {
                use base64::Engine;
                serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
            }
        }

        Value::Int(i) => serde_json::Value::Number((*i).into()),

        Value::UInt(u) => serde_json::json!(*u),

        Value::Float(f) => serde_json::Number::from_f64(f64::from(*f))
            .map_or(serde_json::Value::Null, serde_json::Value::Number),

        Value::Double(d) => serde_json::Number::from_f64(*d)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),

        Value::Date(year, month, day, hour, minute, second, micro) => {
            // DATE columns carry a zero time part; keep them date-only
            if (*hour, *minute, *second, *micro) == (0, 0, 0, 0) {
                serde_json::Value::String(format!("{year:04}-{month:02}-{day:02}"))
            } else {
                serde_json::Value::String(format!(
                    "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}.{micro:06}"
                ))
            }
        }

        Value::Time(is_negative, days, hours, minutes, seconds, microseconds) => {
            let sign = if *is_negative { "-" } else { "" };
            let total_hours = days * 24 + u32::from(*hours);
            serde_json::Value::String(format!(
                "{sign}{total_hours}:{minutes:02}:{seconds:02}.{microseconds:06}"
            ))
        }
    };

    Ok(json_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{execute_once, StatementKind};

    fn local_config() -> ConnectionConfig {
        ConnectionConfig::mysql(
            "localhost".to_string(),
            3306,
            "root".to_string(),
            "password".to_string(),
            "sample".to_string(),
        )
    }

    #[test]
    fn test_parse_mysql_version() {
        let (version, info) = parse_mysql_version("8.0.35");
        assert_eq!(version, "8.0.35");
        assert_eq!(info, "MySQL 8.0.35");

        let (version, info) = parse_mysql_version("10.11.2-MariaDB");
        assert_eq!(version, "10.11.2");
        assert_eq!(info, "MariaDB 10.11.2");
    }

    #[test]
    fn test_to_mysql_params() {
        assert_eq!(to_mysql_params(&[]), Params::Empty);

        let params = to_mysql_params(&[Param::from("A019"), Param::Float(0.34), Param::Null]);
        assert_eq!(
            params,
            Params::Positional(vec![Value::from("A019"), Value::Double(0.34), Value::NULL])
        );
    }

    #[test]
    fn test_provider_wrong_engine() {
        let config = ConnectionConfig::sqlite("/tmp/x.db".into());
        let err = MySqlProvider::new(&config, PoolConfig::default()).err().unwrap();
        assert!(err.message().contains("Expected MySQL engine"));
    }

    #[test]
    fn test_provider_missing_host() {
        let mut config = local_config();
        config.host = None;
        let err = MySqlProvider::new(&config, PoolConfig::default()).err().unwrap();
        assert!(err.message().contains("MySQL requires 'host' parameter"));
    }

    #[test]
    fn test_provider_rejects_empty_pool() {
        let pool = PoolConfig { max_connections: 0, acquire_timeout_ms: 100 };
        assert!(MySqlProvider::new(&local_config(), pool).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_failure() {
        let mut config = local_config();
        config.host = Some("127.0.0.1".to_string());
        config.port = Some(1); // nothing listens here
        let pool = PoolConfig { max_connections: 1, acquire_timeout_ms: 2_000 };
        let provider = MySqlProvider::new(&config, pool).unwrap();

        let stmt = Statement::new(StatementKind::Select, "SELECT 1");
        let err = execute_once(&provider, &stmt).await.unwrap_err();
        assert_eq!(err.error_code(), "CONNECTION_FAILED");
        assert_eq!(provider.status().acquired, 0);
    }

    // Tests against a live server are ignored by default:
    // cargo test --features mysql -- --ignored

    #[tokio::test]
    #[ignore] // Requires running MySQL instance
    async fn test_select_and_release() {
        let provider = MySqlProvider::new(&local_config(), PoolConfig::default()).unwrap();
        let stmt = Statement::new(StatementKind::Select, "SELECT * from agents");

        let output = execute_once(&provider, &stmt).await.unwrap();
        assert!(output.rows().is_some());
        assert_eq!(provider.status().released, 1);

        let (_, info) = provider.server_version().await.unwrap();
        assert!(info.contains("MySQL") || info.contains("MariaDB"));
    }
}
