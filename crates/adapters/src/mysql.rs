use async_trait::async_trait;
use courtside_core::config::ConnectionSettings;
use courtside_core::connection::{BackendError, ConnectionBackend};
use courtside_core::executor::{QueryBackend, QueryBackendError};
use courtside_core::table::{CellValue, RawColumn, RawResultSet};
use mysql_async::consts::ColumnType;
use mysql_async::prelude::Queryable;
use mysql_async::{Column, Conn, OptsBuilder, Row, Value};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlBackend;

#[async_trait]
impl ConnectionBackend for MysqlBackend {
    type Connection = Conn;

    async fn connect(
        &self,
        settings: &ConnectionSettings,
    ) -> Result<Self::Connection, BackendError> {
        Conn::new(opts_from_settings(settings))
            .await
            .map_err(to_connection_error)
    }

    async fn ping(&self, connection: &mut Self::Connection) -> Result<(), BackendError> {
        connection.ping().await.map_err(to_connection_error)
    }

    async fn disconnect(&self, connection: Self::Connection) -> Result<(), BackendError> {
        connection.disconnect().await.map_err(to_connection_error)
    }
}

#[async_trait]
impl QueryBackend for MysqlBackend {
    async fn fetch_all(
        &self,
        connection: &mut Self::Connection,
        sql: &str,
    ) -> Result<RawResultSet, QueryBackendError> {
        let mut result = connection.query_iter(sql).await.map_err(to_query_error)?;
        let columns = result
            .columns()
            .map(|columns| columns.iter().map(raw_column).collect::<Vec<_>>())
            .unwrap_or_default();
        let rows: Vec<Row> = result.collect().await.map_err(to_query_error)?;
        result.drop_result().await.map_err(to_query_error)?;

        debug!(columns = columns.len(), rows = rows.len(), "mysql result buffered");
        let hints = columns
            .iter()
            .map(|column| column.numeric_hint)
            .collect::<Vec<_>>();
        let rows = rows
            .into_iter()
            .map(|row| {
                row.unwrap()
                    .into_iter()
                    .zip(hints.iter().copied().chain(std::iter::repeat(false)))
                    .map(|(value, numeric)| mysql_value_to_cell(value, numeric))
                    .collect()
            })
            .collect();

        Ok(RawResultSet { columns, rows })
    }
}

fn opts_from_settings(settings: &ConnectionSettings) -> OptsBuilder {
    let mut builder = OptsBuilder::default()
        .ip_or_hostname(settings.host.clone())
        .tcp_port(settings.port)
        .user(Some(settings.user.clone()))
        .db_name(Some(settings.database.clone()));

    if let Some(password) = settings.password.as_ref().filter(|pw| !pw.is_empty()) {
        builder = builder.pass(Some(password.clone()));
    }

    builder
}

fn raw_column(column: &Column) -> RawColumn {
    RawColumn::new(
        column.name_str().into_owned(),
        is_numeric_type(column.column_type()),
    )
}

fn is_numeric_type(column_type: ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::MYSQL_TYPE_TINY
            | ColumnType::MYSQL_TYPE_SHORT
            | ColumnType::MYSQL_TYPE_LONG
            | ColumnType::MYSQL_TYPE_INT24
            | ColumnType::MYSQL_TYPE_LONGLONG
            | ColumnType::MYSQL_TYPE_FLOAT
            | ColumnType::MYSQL_TYPE_DOUBLE
            | ColumnType::MYSQL_TYPE_DECIMAL
            | ColumnType::MYSQL_TYPE_NEWDECIMAL
            | ColumnType::MYSQL_TYPE_YEAR
    )
}

/// Text-protocol rows arrive as bytes; numeric columns are parsed back into
/// numbers so the table can classify them.
fn mysql_value_to_cell(value: Value, numeric: bool) -> CellValue {
    match value {
        Value::NULL => CellValue::Null,
        Value::Int(value) => CellValue::Int(value),
        Value::UInt(value) => CellValue::UInt(value),
        Value::Float(value) => CellValue::Float(f64::from(value)),
        Value::Double(value) => CellValue::Float(value),
        Value::Bytes(bytes) => {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            if numeric {
                parse_number(&text).unwrap_or(CellValue::Text(text))
            } else {
                CellValue::Text(text)
            }
        }
        Value::Date(year, month, day, hour, minute, second, micros) => {
            CellValue::Text(if hour == 0 && minute == 0 && second == 0 && micros == 0 {
                format!("{year:04}-{month:02}-{day:02}")
            } else {
                format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}")
            })
        }
        Value::Time(is_negative, days, hours, minutes, seconds, _micros) => {
            let sign = if is_negative { "-" } else { "" };
            let hours = u32::from(hours) + days * 24;
            CellValue::Text(format!("{sign}{hours:02}:{minutes:02}:{seconds:02}"))
        }
    }
}

fn parse_number(text: &str) -> Option<CellValue> {
    let trimmed = text.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(CellValue::Int(value));
    }
    if let Ok(value) = trimmed.parse::<u64>() {
        return Some(CellValue::UInt(value));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(CellValue::Float)
}

fn to_connection_error(error: mysql_async::Error) -> BackendError {
    BackendError::new(error.to_string())
}

fn to_query_error(error: mysql_async::Error) -> QueryBackendError {
    QueryBackendError::new(error.to_string())
}

#[cfg(test)]
mod tests {
    use courtside_core::config::ConnectionSettings;
    use courtside_core::table::CellValue;
    use mysql_async::consts::ColumnType;
    use mysql_async::Value;

    use super::{is_numeric_type, mysql_value_to_cell, opts_from_settings, parse_number};

    #[test]
    fn numeric_bytes_are_parsed_into_numbers() {
        assert_eq!(
            mysql_value_to_cell(Value::Bytes(b"1200".to_vec()), true),
            CellValue::Int(1200)
        );
        assert_eq!(
            mysql_value_to_cell(Value::Bytes(b"18446744073709551615".to_vec()), true),
            CellValue::UInt(u64::MAX)
        );
        assert_eq!(
            mysql_value_to_cell(Value::Bytes(b"12.50".to_vec()), true),
            CellValue::Float(12.5)
        );
    }

    #[test]
    fn text_columns_stay_textual_even_when_they_look_numeric() {
        assert_eq!(
            mysql_value_to_cell(Value::Bytes(b"385".to_vec()), false),
            CellValue::Text("385".to_string())
        );
        assert_eq!(
            mysql_value_to_cell(Value::Bytes(b"n/a".to_vec()), true),
            CellValue::Text("n/a".to_string())
        );
    }

    #[test]
    fn null_and_binary_protocol_values_convert() {
        assert_eq!(mysql_value_to_cell(Value::NULL, true), CellValue::Null);
        assert_eq!(mysql_value_to_cell(Value::Int(-8), false), CellValue::Int(-8));
        assert_eq!(mysql_value_to_cell(Value::UInt(8), false), CellValue::UInt(8));
        assert_eq!(
            mysql_value_to_cell(Value::Double(0.25), false),
            CellValue::Float(0.25)
        );
    }

    #[test]
    fn temporal_values_render_as_text() {
        assert_eq!(
            mysql_value_to_cell(Value::Date(2024, 5, 6, 0, 0, 0, 0), false),
            CellValue::Text("2024-05-06".to_string())
        );
        assert_eq!(
            mysql_value_to_cell(Value::Date(2024, 5, 6, 13, 4, 5, 0), false),
            CellValue::Text("2024-05-06 13:04:05".to_string())
        );
        assert_eq!(
            mysql_value_to_cell(Value::Time(true, 1, 2, 3, 4, 0), false),
            CellValue::Text("-26:03:04".to_string())
        );
    }

    #[test]
    fn numeric_column_types_are_recognised() {
        assert!(is_numeric_type(ColumnType::MYSQL_TYPE_LONGLONG));
        assert!(is_numeric_type(ColumnType::MYSQL_TYPE_NEWDECIMAL));
        assert!(!is_numeric_type(ColumnType::MYSQL_TYPE_VAR_STRING));
        assert!(!is_numeric_type(ColumnType::MYSQL_TYPE_DATETIME));
    }

    #[test]
    fn non_finite_text_is_not_a_number() {
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number(" 7 "), Some(CellValue::Int(7)));
    }

    #[test]
    fn opts_builder_accepts_settings_with_and_without_password() {
        let mut settings = ConnectionSettings::default();
        let _opts = opts_from_settings(&settings);

        settings.password = Some("secret".to_string());
        settings.port = 3307;
        let _opts = opts_from_settings(&settings);
        // Building the options is the assertion.
    }
}
