use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::config::ConnectionSettings;
use crate::connection::{BackendError, ConnectionBackend};
use crate::executor::{QueryBackend, QueryBackendError};
use crate::table::{CellValue, RawColumn, RawResultSet};

/// In-memory backend answering fixed SQL strings.
#[derive(Debug, Default)]
pub(crate) struct ScriptedBackend {
    pub results: Mutex<HashMap<String, Result<RawResultSet, String>>>,
    pub refuse_connections: AtomicBool,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub queries: AtomicUsize,
}

#[derive(Debug)]
pub(crate) struct ScriptedConnection;

impl ScriptedBackend {
    pub fn with_result(mut self, sql: &str, result: RawResultSet) -> Self {
        self.results
            .get_mut()
            .expect("results lock")
            .insert(sql.to_string(), Ok(result));
        self
    }

    pub fn with_failure(mut self, sql: &str, message: &str) -> Self {
        self.results
            .get_mut()
            .expect("results lock")
            .insert(sql.to_string(), Err(message.to_string()));
        self
    }

    /// Changes what `sql` returns from the next fetch on.
    pub fn replace_result(&self, sql: &str, result: RawResultSet) {
        self.results
            .lock()
            .expect("results lock")
            .insert(sql.to_string(), Ok(result));
    }

    pub fn open_connections(&self) -> usize {
        self.connects.load(Ordering::SeqCst) - self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ConnectionBackend for ScriptedBackend {
    type Connection = ScriptedConnection;

    async fn connect(
        &self,
        _settings: &ConnectionSettings,
    ) -> Result<Self::Connection, BackendError> {
        if self.refuse_connections.load(Ordering::SeqCst) {
            return Err(BackendError::new("Can't connect to MySQL server on 'localhost'"));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedConnection)
    }

    async fn ping(&self, _connection: &mut Self::Connection) -> Result<(), BackendError> {
        Ok(())
    }

    async fn disconnect(&self, _connection: Self::Connection) -> Result<(), BackendError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait::async_trait]
impl QueryBackend for ScriptedBackend {
    async fn fetch_all(
        &self,
        _connection: &mut Self::Connection,
        sql: &str,
    ) -> Result<RawResultSet, QueryBackendError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let results = self.results.lock().expect("results lock");
        match results.get(sql) {
            Some(Ok(result)) => Ok(result.clone()),
            Some(Err(message)) => Err(QueryBackendError::new(message.clone())),
            None => Err(QueryBackendError::new(format!("Table for `{sql}` doesn't exist"))),
        }
    }
}

pub(crate) fn rankings_result() -> RawResultSet {
    RawResultSet {
        columns: vec![
            RawColumn::new("rank", true),
            RawColumn::new("name", false),
            RawColumn::new("points", true),
        ],
        rows: vec![
            vec![
                CellValue::Int(1),
                CellValue::Text("Ana".to_string()),
                CellValue::Int(1200),
            ],
            vec![
                CellValue::Int(2),
                CellValue::Text("Bo".to_string()),
                CellValue::Int(900),
            ],
        ],
    }
}

pub(crate) fn venues_result() -> RawResultSet {
    RawResultSet {
        columns: vec![
            RawColumn::new("venue_name", false),
            RawColumn::new("timezone", false),
        ],
        rows: vec![
            vec![
                CellValue::Text("Estadio Nacional".to_string()),
                CellValue::Text("America/Santiago".to_string()),
            ],
            vec![
                CellValue::Text("Court 1".to_string()),
                CellValue::Text("Europe/Zagreb".to_string()),
            ],
        ],
    }
}
