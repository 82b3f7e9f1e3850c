use casttrack_core::ServiceError;
use casttrack_sql::SQLStore;

/// SQL DDL statements to initialize the tracking database schema.
///
/// The `users` table of the surrounding system belongs to the external
/// authentication collaborator and is not created here; this module only
/// ever sees an opaque actor string.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS products (
        batch_id TEXT PRIMARY KEY,
        product_name TEXT NOT NULL,
        company TEXT NOT NULL,
        level TEXT NOT NULL,
        deadline TEXT,
        stock_percent INTEGER,
        status TEXT,
        last_updated TEXT
    )",
    "CREATE TABLE IF NOT EXISTS transaction_logs (
        log_id INTEGER PRIMARY KEY AUTOINCREMENT,
        actor TEXT,
        batch_id TEXT,
        operation TEXT,
        quantity_change INTEGER,
        previous_stock INTEGER,
        new_stock INTEGER,
        timestamp TEXT
    )",
    // Indexes for the audit projections
    "CREATE INDEX IF NOT EXISTS idx_logs_batch ON transaction_logs(batch_id)",
    "CREATE INDEX IF NOT EXISTS idx_logs_actor ON transaction_logs(actor)",
    "CREATE INDEX IF NOT EXISTS idx_products_deadline ON products(deadline)",
];

/// Run all schema statements. Idempotent.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), ServiceError> {
    for stmt in SCHEMA {
        sql.exec(stmt, &[])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
    }
    Ok(())
}
