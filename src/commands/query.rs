use crate::database::{CellValue, Connector, QueryResult};
use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Runs SQL statements off the REPL thread, bounded by a timeout and the
/// process-wide cancellation token.
pub struct QueryExecutor {
    connector: Arc<dyn Connector>,
    runtime: Handle,
    timeout: Duration,
    cancel: CancellationToken,
}

impl QueryExecutor {
    pub fn new(
        connector: Arc<dyn Connector>,
        runtime: Handle,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            connector,
            runtime,
            timeout,
            cancel,
        }
    }

    pub fn execute(&self, query: &str, params: Vec<CellValue>) -> Result<QueryResult> {
        if query.trim().is_empty() {
            return Ok(QueryResult::default());
        }

        let connector = self.connector.clone();
        let sql = query.to_string();
        let start_time = Instant::now();
        let mut result = self.runtime.block_on(async {
            let task = tokio::task::spawn_blocking(move || {
                if params.is_empty() {
                    connector.execute(&sql)
                } else {
                    connector.execute_with_params(&sql, params)
                }
            });
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("statement cancelled by interrupt");
                    Err(Error::Cancelled)
                }
                joined = tokio::time::timeout(self.timeout, task) => match joined {
                    Ok(joined) => joined?,
                    Err(_) => Err(Error::Timeout(self.timeout)),
                },
            }
        })?;

        if result.duration.is_zero() {
            result.duration = start_time.elapsed();
        }
        debug!(rows = result.rows.len(), affected = result.rows_affected, "statement finished");
        Ok(result)
    }
}

/// Statements after which cached schema names may be stale.
pub fn changes_schema(query: &str) -> bool {
    let first = query
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_uppercase();
    matches!(
        first.as_str(),
        "CREATE" | "DROP" | "ALTER" | "RENAME" | "TRUNCATE" | "USE"
    )
}
