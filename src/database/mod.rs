//! Database capabilities consumed by the REPL core.
//!
//! The core only talks to these traits; each backing engine supplies one
//! implementation of each. MySQL is the only engine shipped today.

pub mod connection;
pub mod dialect;
pub mod metadata;

pub use connection::MysqlConnector;
pub use dialect::MysqlDialect;
pub use metadata::MysqlMetadataProvider;

use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Run a blocking driver call on the blocking pool, giving up after `budget`.
///
/// The call itself keeps running after a timeout; only the caller stops
/// waiting for it.
pub async fn run_blocking<T, F>(budget: Duration, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    match tokio::time::timeout(budget, tokio::task::spawn_blocking(f)).await {
        Ok(joined) => joined?,
        Err(_) => Err(Error::Timeout(budget)),
    }
}

/// Selected database, or `None` when there is none or the lookup fails.
pub async fn lookup_database(connector: Arc<dyn Connector>, budget: Duration) -> Option<String> {
    match run_blocking(budget, move || connector.current_database()).await {
        Ok(name) => name.filter(|n| !n.is_empty()),
        Err(e) => {
            debug!(error = %e, "current database unavailable");
            None
        }
    }
}

/// Executes statements against one live database session.
pub trait Connector: Send + Sync {
    /// Open a session for the given connection url.
    fn connect(dsn: &str) -> Result<Self>
    where
        Self: Sized;

    fn execute(&self, query: &str) -> Result<QueryResult>;

    /// Execute with positional `?` parameters bound in order.
    fn execute_with_params(&self, query: &str, params: Vec<CellValue>) -> Result<QueryResult>;

    fn ping(&self) -> Result<()>;

    /// Name of the database selected in the session, if any.
    fn current_database(&self) -> Result<Option<String>>;

    fn close(&self);
}

/// Lists schema objects for completion and the introspection commands.
pub trait MetadataProvider: Send + Sync {
    fn list_tables(&self) -> Result<Vec<String>>;
    fn list_columns(&self, table: &str) -> Result<Vec<ColumnInfo>>;
    fn list_databases(&self) -> Result<Vec<String>>;
}

/// Static description of one SQL engine.
pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;
    fn keywords(&self) -> &[&'static str];
    fn tables_query(&self) -> &'static str;
    /// Takes the table name as its single positional parameter.
    fn columns_query(&self) -> &'static str;
    fn databases_query(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub default_value: Option<String>,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            is_primary_key: false,
            default_value: None,
        }
    }
}

/// A single result cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => f.write_str("NULL"),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::UInt(u) => write!(f, "{}", u),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    pub rows_affected: u64,
    pub last_insert_id: Option<u64>,
    /// True when the statement produced a result set.
    pub is_select: bool,
    pub duration: Duration,
}

impl QueryResult {
    /// Build a result set from already-materialised rows, used by the
    /// introspection commands.
    pub fn listing(columns: &[&str], rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
            is_select: true,
            ..Default::default()
        }
    }
}
