//! agentdesk - CRUD REST API over the agents sample database
//!
//! A small HTTP service exposing the `agents`, `customer`, `orders`, `company`,
//! `foods`, `despatch` and `daysorder` tables of a MariaDB/MySQL store as JSON.
//!
//! # Core Principles
//! - Every route runs exactly one fixed, parameterized statement
//! - Validation runs before any connection is checked out, and reports every violation
//! - Every request gets exactly one response, and every checked-out connection
//!   is either released or discarded
//! - Rows are returned verbatim, in store column order
//!
//! # Module Organization
//! - [`api`] - Router, handlers, request types and the statement catalog
//! - [`engine`] - Connection provider traits and the MySQL / SQLite engines
//! - [`pool`] - Pool settings and checkout accounting shared by the engines
//! - [`validation`] - Declarative field presence rules
//! - [`config`] - Settings discovery and environment overrides
//! - [`error`] - Error types and their HTTP status mapping
//! - [`output`] - JSON envelopes for errors and CLI results
//! - [`logging`] - `tracing` subscriber setup
//! - [`server`] - Listener lifecycle and graceful shutdown

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod output;
pub mod pool;
pub mod server;
pub mod validation;

pub use api::{router, AppState};
pub use config::Settings;
pub use engine::{
    execute_once, Connection, ConnectionConfig, ConnectionProvider, DatabaseType, Param, QueryOutput,
    Row, Statement, StatementKind, WriteOutcome,
};
pub use error::{DeskError, Result};
pub use logging::{init_logging, LogConfig};
pub use output::{ErrorEnvelope, ErrorInfo, Metadata, SuccessEnvelope};
pub use pool::{PoolConfig, PoolStatus};
pub use validation::{FieldValue, Location, Validate, Violation};
