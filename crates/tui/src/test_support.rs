use std::collections::HashMap;

use async_trait::async_trait;
use courtside_core::catalog::QueryCatalog;
use courtside_core::config::ConnectionSettings;
use courtside_core::connection::{BackendError, ConnectionBackend, ConnectionProvider};
use courtside_core::executor::{QueryBackend, QueryBackendError};
use courtside_core::session::BrowserSession;
use courtside_core::table::{CellValue, RawColumn, RawResultSet};

use crate::app::TuiApp;

/// In-memory backend keyed by SQL text. Unknown statements fail like a
/// missing table would.
#[derive(Debug, Default)]
pub(crate) struct FakeBackend {
    results: HashMap<&'static str, RawResultSet>,
}

#[async_trait]
impl ConnectionBackend for FakeBackend {
    type Connection = ();

    async fn connect(&self, _settings: &ConnectionSettings) -> Result<(), BackendError> {
        Ok(())
    }

    async fn ping(&self, _connection: &mut ()) -> Result<(), BackendError> {
        Ok(())
    }

    async fn disconnect(&self, _connection: ()) -> Result<(), BackendError> {
        Ok(())
    }
}

#[async_trait]
impl QueryBackend for FakeBackend {
    async fn fetch_all(
        &self,
        _connection: &mut (),
        sql: &str,
    ) -> Result<RawResultSet, QueryBackendError> {
        self.results
            .get(sql)
            .cloned()
            .ok_or_else(|| QueryBackendError::new("Table 'tennis.missing' doesn't exist"))
    }
}

fn text(value: &str) -> CellValue {
    CellValue::Text(value.to_string())
}

pub(crate) fn catalog() -> QueryCatalog {
    QueryCatalog::new([("rankings", "q1"), ("venues", "q2"), ("broken", "q3")])
        .expect("catalog should build")
}

pub(crate) fn ratios_catalog() -> QueryCatalog {
    QueryCatalog::new([("ratios", "q4")]).expect("catalog should build")
}

pub(crate) fn backend() -> FakeBackend {
    FakeBackend {
        results: HashMap::from([
            (
                "q1",
                RawResultSet {
                    columns: vec![RawColumn::new("name", false), RawColumn::new("points", true)],
                    rows: vec![
                        vec![text("Ana"), CellValue::Int(1200)],
                        vec![text("Bo"), CellValue::Int(900)],
                    ],
                },
            ),
            (
                "q4",
                RawResultSet {
                    columns: vec![RawColumn::new("ratio", true)],
                    rows: vec![
                        vec![CellValue::Float(0.0)],
                        vec![CellValue::Float(1.0)],
                        vec![CellValue::Float(2.0)],
                        vec![CellValue::Null],
                    ],
                },
            ),
            (
                "q2",
                RawResultSet {
                    columns: vec![RawColumn::new("venue_name", false)],
                    rows: vec![vec![text("Nacional")]],
                },
            ),
        ]),
    }
}

pub(crate) fn app(catalog: &QueryCatalog) -> TuiApp<'_, FakeBackend> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime should build");
    let session = BrowserSession::new(
        catalog,
        ConnectionProvider::new(backend(), ConnectionSettings::default()),
    );
    TuiApp::new(session, runtime)
}
