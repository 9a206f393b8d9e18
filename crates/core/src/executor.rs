use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::{QueryCatalog, UnknownQueryError};
use crate::connection::{ConnectionBackend, ConnectionLease};
use crate::table::{RawResultSet, ResultTable};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct QueryBackendError {
    message: String,
}

impl QueryBackendError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryExecutionError {
    #[error("error executing query: {0}")]
    Backend(#[source] QueryBackendError),
    #[error(transparent)]
    UnknownQuery(#[from] UnknownQueryError),
    #[error("connection was released before the query ran")]
    Released,
}

#[async_trait]
pub trait QueryBackend: ConnectionBackend {
    /// Runs one read-only statement and buffers every row.
    async fn fetch_all(
        &self,
        connection: &mut Self::Connection,
        sql: &str,
    ) -> Result<RawResultSet, QueryBackendError>;
}

/// Result of one execution. A failed query still yields a (empty) table.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    pub table: ResultTable,
    pub warning: Option<QueryExecutionError>,
    pub elapsed: Duration,
}

impl ExecutionOutcome {
    fn degraded(error: QueryExecutionError, elapsed: Duration) -> Self {
        warn!(%error, "query degraded to an empty result");
        Self {
            table: ResultTable::empty(),
            warning: Some(error),
            elapsed,
        }
    }
}

pub async fn execute<B: QueryBackend>(
    lease: &mut ConnectionLease<'_, B>,
    sql: &str,
) -> ExecutionOutcome {
    let started_at = Instant::now();
    let backend = lease.backend();
    let Some(connection) = lease.connection_mut() else {
        return ExecutionOutcome::degraded(QueryExecutionError::Released, started_at.elapsed());
    };

    match backend.fetch_all(connection, sql).await {
        Ok(raw) => {
            let table = ResultTable::classify(raw);
            let elapsed = started_at.elapsed();
            debug!(
                rows = table.row_count(),
                columns = table.columns().len(),
                elapsed_ms = elapsed.as_millis(),
                "query fetched"
            );
            ExecutionOutcome {
                table,
                warning: None,
                elapsed,
            }
        }
        Err(error) => {
            ExecutionOutcome::degraded(QueryExecutionError::Backend(error), started_at.elapsed())
        }
    }
}

/// Looks `name` up in the catalog and executes it. An unknown name degrades
/// the same way a failing statement does.
pub async fn execute_named<B: QueryBackend>(
    catalog: &QueryCatalog,
    name: &str,
    lease: &mut ConnectionLease<'_, B>,
) -> ExecutionOutcome {
    match catalog.get_sql(name) {
        Ok(sql) => execute(lease, sql).await,
        Err(error) => ExecutionOutcome::degraded(error.into(), Duration::ZERO),
    }
}
