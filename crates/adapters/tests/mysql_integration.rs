use courtside_adapters::mysql::MysqlBackend;
use courtside_core::catalog::QueryCatalog;
use courtside_core::config::ConnectionSettings;
use courtside_core::connection::{ConnectionBackend, ConnectionProvider};
use courtside_core::executor::QueryBackend;
use courtside_core::session::{BrowserSession, ViewState};
use courtside_core::table::{CellValue, ColumnType};

fn mysql_integration_enabled() -> bool {
    matches!(
        std::env::var("COURTSIDE_RUN_MYSQL_INTEGRATION").ok().as_deref(),
        Some("1")
    )
}

fn integration_settings(database: &str) -> ConnectionSettings {
    let mut settings = ConnectionSettings {
        database: database.to_string(),
        ..ConnectionSettings::default()
    };
    settings.host =
        std::env::var("COURTSIDE_TEST_DB_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    settings.user =
        std::env::var("COURTSIDE_TEST_DB_USER").unwrap_or_else(|_| "root".to_string());
    settings.password = std::env::var("COURTSIDE_TEST_DB_PASSWORD").ok();
    settings.port = std::env::var("COURTSIDE_TEST_DB_PORT")
        .ok()
        .and_then(|raw| raw.parse::<u16>().ok())
        .unwrap_or(3306);
    settings
}

async fn execute_sql(backend: &MysqlBackend, settings: &ConnectionSettings, sql: &str) {
    let mut connection = backend
        .connect(settings)
        .await
        .expect("connect should succeed");
    backend
        .fetch_all(&mut connection, sql)
        .await
        .expect("statement should succeed");
    backend
        .disconnect(connection)
        .await
        .expect("disconnect should succeed");
}

#[tokio::test(flavor = "current_thread")]
async fn rankings_are_fetched_classified_and_filtered() {
    if !mysql_integration_enabled() {
        return;
    }

    let backend = MysqlBackend;
    let admin = integration_settings("mysql");
    execute_sql(&backend, &admin, "CREATE DATABASE IF NOT EXISTS courtside_cov").await;

    let settings = integration_settings("courtside_cov");
    execute_sql(&backend, &settings, "DROP TABLE IF EXISTS competitor_rankings_table").await;
    execute_sql(
        &backend,
        &settings,
        "CREATE TABLE competitor_rankings_table (\
         rank_id INT NOT NULL PRIMARY KEY,\
         `rank` INT NOT NULL,\
         points DECIMAL(10,2) NULL,\
         competitor_id VARCHAR(32) NOT NULL\
         )",
    )
    .await;
    execute_sql(
        &backend,
        &settings,
        "INSERT INTO competitor_rankings_table (rank_id, `rank`, points, competitor_id) VALUES \
         (1, 1, 1200, 'sr:competitor:1'), (2, 2, 900.5, 'sr:competitor:2'), \
         (3, 3, NULL, 'sr:competitor:3')",
    )
    .await;

    let mut connection = backend.connect(&settings).await.expect("connect");
    let raw = backend
        .fetch_all(&mut connection, "select * from competitor_rankings_table order by rank_id")
        .await
        .expect("select should succeed");
    backend.disconnect(connection).await.expect("disconnect");

    assert_eq!(raw.columns.len(), 4);
    assert!(raw.columns[2].numeric_hint);
    assert!(!raw.columns[3].numeric_hint);
    assert_eq!(raw.rows[0][1], CellValue::Int(1));
    assert_eq!(raw.rows[1][2], CellValue::Float(900.5));
    assert_eq!(raw.rows[2][2], CellValue::Null);

    let catalog = QueryCatalog::tennis_default();
    let provider = ConnectionProvider::new(MysqlBackend, settings.clone());
    let mut session = BrowserSession::new(&catalog, provider);
    session.select_query("competitor_rankings_table");
    let view = session.render().await;
    assert_eq!(view.state(), ViewState::Data);
    let table = view.table.expect("table should be loaded");
    assert_eq!(table.columns()[2].column_type, ColumnType::Numeric);
    assert_eq!(table.columns()[3].column_type, ColumnType::Text);

    session.filters_mut().set_range("points", 1000.0, 1300.0);
    let view = session.render().await;
    assert_eq!(view.table.map(|table| table.row_count()), Some(1));

    session.select_query("Find competitors ranked in the top 5");
    let view = session.render().await;
    assert_eq!(view.state(), ViewState::NoData);
    assert_eq!(view.notices.len(), 1);

    execute_sql(&backend, &settings, "DROP TABLE IF EXISTS competitor_rankings_table").await;
}

#[tokio::test(flavor = "current_thread")]
async fn wrong_credentials_surface_as_connection_error() {
    if !mysql_integration_enabled() {
        return;
    }

    let mut settings = integration_settings("mysql");
    settings.user = "courtside_no_such_user".to_string();
    settings.password = Some("wrong".to_string());

    let catalog = QueryCatalog::tennis_default();
    let mut session =
        BrowserSession::new(&catalog, ConnectionProvider::new(MysqlBackend, settings));
    let view = session.render().await;
    assert_eq!(view.state(), ViewState::Halted);
    assert!(view.table.is_none());
}
