use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, TransactionBehavior};

use crate::error::SQLError;
use crate::traits::{Row, SQLStore, SQLTransaction, Value};

/// SqliteStore is a SQLStore implementation backed by rusqlite (bundled SQLite).
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self, SQLError> {
        let conn = Connection::open(path)
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        // Enable WAL mode for better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite database (useful for tests).
    pub fn open_in_memory() -> Result<Self, SQLError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SQLError::Connection(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

/// Convert our Value enum to rusqlite's ToSql.
fn bind_params(params: &[Value]) -> Vec<Box<dyn rusqlite::types::ToSql + '_>> {
    params
        .iter()
        .map(|v| -> Box<dyn rusqlite::types::ToSql + '_> {
            match v {
                Value::Null => Box::new(rusqlite::types::Null),
                Value::Integer(i) => Box::new(*i),
                Value::Real(f) => Box::new(*f),
                Value::Text(s) => Box::new(s.as_str()),
                Value::Blob(b) => Box::new(b.as_slice()),
            }
        })
        .collect()
}

/// Run a query against any open connection (plain or transactional).
fn run_query(conn: &Connection, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
    let bound = bind_params(params);
    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        bound.iter().map(|b| b.as_ref()).collect();

    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| SQLError::Query(e.to_string()))?;

    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            let mut columns = Vec::new();
            for (i, name) in column_names.iter().enumerate() {
                let val = row_value_at(row, i);
                columns.push((name.clone(), val));
            }
            Ok(Row { columns })
        })
        .map_err(|e| SQLError::Query(e.to_string()))?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.map_err(|e| SQLError::Query(e.to_string()))?);
    }
    Ok(result)
}

/// Run a statement against any open connection (plain or transactional).
fn run_exec(conn: &Connection, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
    let bound = bind_params(params);
    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        bound.iter().map(|b| b.as_ref()).collect();

    let affected = conn
        .execute(sql, param_refs.as_slice())
        .map_err(|e| SQLError::Execution(e.to_string()))?;

    Ok(affected as u64)
}

impl SQLStore for SqliteStore {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Query(e.to_string()))?;
        run_query(&conn, sql, params)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Execution(e.to_string()))?;
        run_exec(&conn, sql, params)
    }

    fn with_transaction(
        &self,
        f: &mut dyn FnMut(&dyn SQLTransaction) -> Result<(), SQLError>,
    ) -> Result<(), SQLError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Transaction(e.to_string()))?;

        // IMMEDIATE takes the write lock up front, so the closure's reads
        // see a state no concurrent writer can supersede mid-sequence.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| SQLError::Transaction(e.to_string()))?;
        let handle = SqliteTransaction { tx };

        match f(&handle) {
            Ok(()) => handle
                .tx
                .commit()
                .map_err(|e| SQLError::Transaction(e.to_string())),
            Err(e) => {
                let _ = handle.tx.rollback();
                Err(e)
            }
        }
    }
}

/// Transaction handle over a live rusqlite transaction.
struct SqliteTransaction<'a> {
    tx: rusqlite::Transaction<'a>,
}

impl SQLTransaction for SqliteTransaction<'_> {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
        run_query(&self.tx, sql, params)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
        run_exec(&self.tx, sql, params)
    }

    fn last_insert_id(&self) -> i64 {
        self.tx.last_insert_rowid()
    }
}

/// Extract a Value from a rusqlite row at a given column index.
fn row_value_at(row: &rusqlite::Row, idx: usize) -> Value {
    // Try integer first, then real, then text, then blob, then null.
    if let Ok(i) = row.get::<_, i64>(idx) {
        return Value::Integer(i);
    }
    if let Ok(f) = row.get::<_, f64>(idx) {
        return Value::Real(f);
    }
    if let Ok(s) = row.get::<_, String>(idx) {
        return Value::Text(s);
    }
    if let Ok(b) = row.get::<_, Vec<u8>>(idx) {
        return Value::Blob(b);
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_table() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .exec(
                "CREATE TABLE items (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT UNIQUE, qty INTEGER)",
                &[],
            )
            .unwrap();
        store
    }

    #[test]
    fn exec_and_query_roundtrip() {
        let store = store_with_table();
        let affected = store
            .exec(
                "INSERT INTO items (name, qty) VALUES (?1, ?2)",
                &[Value::Text("bolt".into()), Value::Integer(7)],
            )
            .unwrap();
        assert_eq!(affected, 1);

        let rows = store
            .query(
                "SELECT name, qty FROM items WHERE name = ?1",
                &[Value::Text("bolt".into())],
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("name"), Some("bolt"));
        assert_eq!(rows[0].get_i64("qty"), Some(7));
    }

    #[test]
    fn open_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sqlite");
        let store = SqliteStore::open(&path).unwrap();
        store.exec("CREATE TABLE t (x INTEGER)", &[]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn transaction_commits_on_ok() {
        let store = store_with_table();
        store
            .with_transaction(&mut |tx| {
                tx.exec(
                    "INSERT INTO items (name, qty) VALUES (?1, ?2)",
                    &[Value::Text("nut".into()), Value::Integer(1)],
                )?;
                assert!(tx.last_insert_id() > 0);
                tx.exec(
                    "UPDATE items SET qty = qty + 1 WHERE name = ?1",
                    &[Value::Text("nut".into())],
                )?;
                Ok(())
            })
            .unwrap();

        let rows = store.query("SELECT qty FROM items", &[]).unwrap();
        assert_eq!(rows[0].get_i64("qty"), Some(2));
    }

    #[test]
    fn transaction_rolls_back_on_err() {
        let store = store_with_table();
        let result = store.with_transaction(&mut |tx| {
            tx.exec(
                "INSERT INTO items (name, qty) VALUES (?1, ?2)",
                &[Value::Text("washer".into()), Value::Integer(3)],
            )?;
            Err(SQLError::Execution("forced abort".into()))
        });
        assert!(result.is_err());

        let rows = store.query("SELECT COUNT(*) AS cnt FROM items", &[]).unwrap();
        assert_eq!(rows[0].get_i64("cnt"), Some(0));
    }

    #[test]
    fn reads_inside_transaction_see_own_writes() {
        let store = store_with_table();
        store
            .with_transaction(&mut |tx| {
                tx.exec(
                    "INSERT INTO items (name, qty) VALUES (?1, ?2)",
                    &[Value::Text("pin".into()), Value::Integer(9)],
                )?;
                let rows = tx.query(
                    "SELECT qty FROM items WHERE name = ?1",
                    &[Value::Text("pin".into())],
                )?;
                assert_eq!(rows[0].get_i64("qty"), Some(9));
                Ok(())
            })
            .unwrap();
    }
}
