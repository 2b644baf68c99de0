use domain::errors::ExecutionError;
use domain::models::Row;
use domain::ports::Executor;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::{Number, Value};
use std::path::{Path, PathBuf};

pub const EMPTY_QUERY: &str = "generated query is empty";

/// Runs generated SQL against a SQLite database, one fresh connection per query.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    db_path: PathBuf,
}

impl SqliteExecutor {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::from(bytes.to_vec()),
    }
}

pub fn run_query(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Row::new();
        for (i, name) in columns.iter().enumerate() {
            record.insert(name.clone(), to_json(row.get_ref(i)?));
        }
        out.push(record);
    }
    Ok(out)
}

impl Executor for SqliteExecutor {
    async fn execute(&self, sql: &str) -> Result<Vec<Row>, ExecutionError> {
        // SQLite prepares blank input as a no-op statement and reports "not an error".
        if sql.trim().is_empty() {
            return Err(ExecutionError(EMPTY_QUERY.to_string()));
        }
        let db_path = self.db_path.clone();
        let sql = sql.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open_with_flags(
                &db_path,
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            run_query(&conn, &sql)
        })
        .await
        .map_err(|e| ExecutionError(format!("query task failed: {e}")))?
        .map_err(|e| ExecutionError(e.to_string()))
    }
}
