use super::{CellValue, Connector, QueryResult};
use crate::error::{Error, Result};
use mysql::consts::ColumnType;
use mysql::prelude::*;
use mysql::{Conn, Opts, Params, Row, Value};
use std::sync::{Mutex, TryLockError};
use std::time::Instant;
use tracing::debug;

/// A single MySQL session shared by statement execution and metadata reads.
///
/// One session (rather than a pool) keeps `USE` and `DATABASE()` coherent
/// across the query path and the introspection path.
pub struct MysqlConnector {
    conn: Mutex<Option<Conn>>,
    connection_id: u32,
    server_version: String,
}

impl MysqlConnector {
    fn from_opts(opts: Opts) -> Result<Self> {
        let mut conn = Conn::new(opts)?;

        let connection_id: u32 = conn.query_first("SELECT CONNECTION_ID()")?.unwrap_or(0);
        let server_version: String = conn.query_first("SELECT VERSION()")?.unwrap_or_default();
        debug!(connection_id, %server_version, "connected");

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            connection_id,
            server_version,
        })
    }

    pub fn connection_id(&self) -> u32 {
        self.connection_id
    }

    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    /// Run `f` against the live session, serialising access to it.
    pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&mut Conn) -> Result<T>) -> Result<T> {
        let mut guard = self.conn.lock().map_err(|_| Error::NotConnected)?;
        let conn = guard.as_mut().ok_or(Error::NotConnected)?;
        f(conn)
    }
}

impl Connector for MysqlConnector {
    fn connect(dsn: &str) -> Result<Self> {
        Self::from_opts(Opts::from_url(dsn)?)
    }

    fn execute(&self, query: &str) -> Result<QueryResult> {
        self.execute_with_params(query, Vec::new())
    }

    fn execute_with_params(&self, query: &str, params: Vec<CellValue>) -> Result<QueryResult> {
        self.with_conn(|conn| {
            let started = Instant::now();
            let result = if params.is_empty() {
                let mut result = conn.query_iter(query)?;
                let shape = ResultShape::describe(result.columns().as_ref());
                let affected = (result.affected_rows(), result.last_insert_id());
                let rows = shape.collect(result.by_ref())?;
                shape.finish(rows, affected)
            } else {
                let params = Params::Positional(params.into_iter().map(to_value).collect());
                let mut result = conn.exec_iter(query, params)?;
                let shape = ResultShape::describe(result.columns().as_ref());
                let affected = (result.affected_rows(), result.last_insert_id());
                let rows = shape.collect(result.by_ref())?;
                shape.finish(rows, affected)
            };
            Ok(QueryResult {
                duration: started.elapsed(),
                ..result
            })
        })
    }

    fn ping(&self) -> Result<()> {
        self.with_conn(|conn| Ok(conn.query_drop("SELECT 1")?))
    }

    fn current_database(&self) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let name: Option<Option<String>> = conn.query_first("SELECT DATABASE()")?;
            Ok(name.flatten())
        })
    }

    /// Never waits: a statement abandoned on interrupt may still hold the
    /// session, in which case it is left for process exit to tear down.
    fn close(&self) {
        match self.conn.try_lock() {
            Ok(mut guard) => {
                if guard.take().is_some() {
                    debug!(connection_id = self.connection_id, "connection closed");
                }
            }
            Err(TryLockError::WouldBlock) => {
                debug!(connection_id = self.connection_id, "connection busy, not closing")
            }
            Err(TryLockError::Poisoned(_)) => {}
        }
    }
}

/// Column names and wire types of one result set.
struct ResultShape {
    columns: Vec<String>,
    types: Vec<ColumnType>,
}

impl ResultShape {
    fn describe(columns: &[mysql::Column]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.name_str().to_string()).collect(),
            types: columns.iter().map(|c| c.column_type()).collect(),
        }
    }

    fn collect(&self, rows: impl Iterator<Item = mysql::Result<Row>>) -> Result<Vec<Vec<CellValue>>> {
        let mut out = Vec::new();
        for row in rows {
            let values = row?.unwrap();
            let cells = values
                .into_iter()
                .enumerate()
                .map(|(i, value)| {
                    let column_type = self
                        .types
                        .get(i)
                        .copied()
                        .unwrap_or(ColumnType::MYSQL_TYPE_VAR_STRING);
                    to_cell(value, column_type)
                })
                .collect();
            out.push(cells);
        }
        Ok(out)
    }

    fn finish(self, rows: Vec<Vec<CellValue>>, affected: (u64, Option<u64>)) -> QueryResult {
        let is_select = !self.columns.is_empty();
        QueryResult {
            columns: self.columns,
            rows,
            rows_affected: affected.0,
            last_insert_id: affected.1.filter(|id| *id > 0),
            is_select,
            ..Default::default()
        }
    }
}

fn to_value(cell: CellValue) -> Value {
    match cell {
        CellValue::Null => Value::NULL,
        CellValue::Int(i) => Value::Int(i),
        CellValue::UInt(u) => Value::UInt(u),
        CellValue::Float(f) => Value::Double(f),
        CellValue::Text(s) => Value::Bytes(s.into_bytes()),
    }
}

fn is_integer(column_type: ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::MYSQL_TYPE_TINY
            | ColumnType::MYSQL_TYPE_SHORT
            | ColumnType::MYSQL_TYPE_LONG
            | ColumnType::MYSQL_TYPE_INT24
            | ColumnType::MYSQL_TYPE_LONGLONG
            | ColumnType::MYSQL_TYPE_YEAR
    )
}

fn is_float(column_type: ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::MYSQL_TYPE_FLOAT | ColumnType::MYSQL_TYPE_DOUBLE
    )
}

/// Text-protocol values arrive as bytes; the column type decides whether
/// they are numbers.
fn to_cell(value: Value, column_type: ColumnType) -> CellValue {
    match value {
        Value::NULL => CellValue::Null,
        Value::Bytes(bytes) => {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            if is_integer(column_type) {
                if let Ok(i) = text.parse::<i64>() {
                    return CellValue::Int(i);
                }
                if let Ok(u) = text.parse::<u64>() {
                    return CellValue::UInt(u);
                }
            } else if is_float(column_type) {
                if let Ok(f) = text.parse::<f64>() {
                    return CellValue::Float(f);
                }
            }
            CellValue::Text(text)
        }
        Value::Int(i) => CellValue::Int(i),
        Value::UInt(u) => CellValue::UInt(u),
        Value::Float(f) => CellValue::Float(f as f64),
        Value::Double(d) => CellValue::Float(d),
        Value::Date(year, month, day, hour, minute, second, micro) => {
            if hour == 0 && minute == 0 && second == 0 && micro == 0 {
                CellValue::Text(format!("{:04}-{:02}-{:02}", year, month, day))
            } else {
                CellValue::Text(format!(
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                    year, month, day, hour, minute, second
                ))
            }
        }
        Value::Time(neg, days, hours, minutes, seconds, _micro) => {
            let sign = if neg { "-" } else { "" };
            let hours = u32::from(hours) + days * 24;
            CellValue::Text(format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::time::Duration;

    fn offline() -> MysqlConnector {
        MysqlConnector {
            conn: Mutex::new(None),
            connection_id: 7,
            server_version: String::new(),
        }
    }

    #[test]
    fn close_does_not_wait_for_a_busy_session() {
        let connector = Arc::new(offline());
        let guard = connector.conn.lock().unwrap();

        let (done, finished) = mpsc::channel();
        let closing = Arc::clone(&connector);
        std::thread::spawn(move || {
            closing.close();
            done.send(()).unwrap();
        });
        assert!(finished.recv_timeout(Duration::from_secs(2)).is_ok());
        drop(guard);
    }

    #[test]
    fn closed_session_reports_not_connected() {
        let connector = offline();
        connector.close();
        assert!(matches!(connector.ping(), Err(Error::NotConnected)));
    }

    #[test]
    fn malformed_url_fails_before_connecting() {
        assert!(matches!(MysqlConnector::connect("not a url"), Err(Error::Url(_))));
    }

    #[test]
    fn integer_columns_parse_text_protocol_bytes() {
        let cell = to_cell(Value::Bytes(b"42".to_vec()), ColumnType::MYSQL_TYPE_LONGLONG);
        assert_eq!(cell, CellValue::Int(42));

        let cell = to_cell(
            Value::Bytes(b"18446744073709551615".to_vec()),
            ColumnType::MYSQL_TYPE_LONGLONG,
        );
        assert_eq!(cell, CellValue::UInt(u64::MAX));
    }

    #[test]
    fn string_columns_stay_text() {
        let cell = to_cell(Value::Bytes(b"007".to_vec()), ColumnType::MYSQL_TYPE_VAR_STRING);
        assert_eq!(cell, CellValue::Text("007".into()));
    }

    #[test]
    fn dates_drop_midnight_time() {
        let date = to_cell(Value::Date(2024, 3, 9, 0, 0, 0, 0), ColumnType::MYSQL_TYPE_DATE);
        assert_eq!(date, CellValue::Text("2024-03-09".into()));

        let stamp = to_cell(
            Value::Date(2024, 3, 9, 7, 5, 1, 0),
            ColumnType::MYSQL_TYPE_DATETIME,
        );
        assert_eq!(stamp, CellValue::Text("2024-03-09 07:05:01".into()));
    }

    #[test]
    fn time_folds_days_into_hours() {
        let cell = to_cell(Value::Time(true, 1, 2, 3, 4, 0), ColumnType::MYSQL_TYPE_TIME);
        assert_eq!(cell, CellValue::Text("-26:03:04".into()));
    }

    #[test]
    fn params_map_to_wire_values() {
        assert_eq!(to_value(CellValue::Null), Value::NULL);
        assert_eq!(to_value(CellValue::Int(-3)), Value::Int(-3));
        assert_eq!(to_value("x".into()), Value::Bytes(b"x".to_vec()));
    }
}
