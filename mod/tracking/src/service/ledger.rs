use tracing::info;

use casttrack_core::{ServiceError, now_timestamp};
use casttrack_sql::{SQLError, SQLTransaction, Value};

use super::TrackingService;
use crate::model::{AuditEntry, Batch, Operation};

impl TrackingService {
    /// Apply a signed stock delta to a batch.
    ///
    /// The whole sequence — resolve, range-check, update the row, append
    /// the audit entry — runs inside one write transaction, so two
    /// concurrent calls on the same batch serialize and neither can read a
    /// stock value the other has already superseded. A delta whose result
    /// falls outside 0..=100 is rejected before anything is written;
    /// repeating a rejected call leaves the batch and the trail untouched.
    pub fn apply_delta(
        &self,
        batch_id: &str,
        delta: i64,
        actor: Option<&str>,
    ) -> Result<(Batch, AuditEntry), ServiceError> {
        let mut outcome: Option<Result<(Batch, AuditEntry), ServiceError>> = None;

        self.sql
            .with_transaction(&mut |tx| {
                let rows = tx.query(
                    "SELECT * FROM products WHERE batch_id = ?1",
                    &[Value::Text(batch_id.to_string())],
                )?;
                let Some(row) = rows.first() else {
                    outcome = Some(Err(ServiceError::NotFound(format!(
                        "batch '{}' not found",
                        batch_id
                    ))));
                    return Ok(());
                };

                let mut batch = match Batch::from_row(row) {
                    Ok(b) => b,
                    Err(e) => {
                        outcome = Some(Err(e));
                        return Ok(());
                    }
                };

                let previous = batch.stock_percent;
                let result = previous + delta;
                if !(0..=100).contains(&result) {
                    // Nothing written yet; committing here commits nothing.
                    outcome = Some(Err(ServiceError::OutOfRange {
                        batch_id: batch_id.to_string(),
                        current: previous,
                        delta,
                        result,
                    }));
                    return Ok(());
                }

                let now = now_timestamp();
                tx.exec(
                    "UPDATE products SET stock_percent = ?1, last_updated = ?2
                     WHERE batch_id = ?3",
                    &[
                        Value::Integer(result),
                        Value::Text(now.clone()),
                        Value::Text(batch_id.to_string()),
                    ],
                )?;

                let mut entry = AuditEntry {
                    log_id: 0,
                    actor: actor.map(str::to_string),
                    batch_id: batch_id.to_string(),
                    operation: Operation::StockUpdate,
                    quantity_change: delta,
                    previous_stock: previous,
                    new_stock: result,
                    timestamp: now.clone(),
                };
                entry.log_id = append_entry(tx, &entry)?;

                batch.stock_percent = result;
                batch.last_updated = now;
                outcome = Some(Ok((batch, entry)));
                Ok(())
            })
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        match outcome {
            Some(Ok((batch, entry))) => {
                info!(
                    "stock for batch {} moved {} -> {}",
                    batch_id, entry.previous_stock, entry.new_stock
                );
                Ok((batch, entry))
            }
            Some(Err(e)) => Err(e),
            None => Err(ServiceError::Internal(
                "stock transaction produced no outcome".into(),
            )),
        }
    }
}

/// Append the initial registration entry for a freshly inserted batch.
///
/// Only called from the registration transaction; existing stock is never
/// mutated through this path.
pub(crate) fn record_initial(
    tx: &dyn SQLTransaction,
    actor: Option<&str>,
    batch_id: &str,
    initial_stock: i64,
    now: &str,
) -> Result<(), SQLError> {
    let entry = AuditEntry {
        log_id: 0,
        actor: actor.map(str::to_string),
        batch_id: batch_id.to_string(),
        operation: Operation::InitialRegistration,
        quantity_change: initial_stock,
        previous_stock: 0,
        new_stock: initial_stock,
        timestamp: now.to_string(),
    };
    append_entry(tx, &entry)?;
    Ok(())
}

/// Insert an audit entry (its `log_id` is ignored) and return the id
/// storage assigned to it.
fn append_entry(tx: &dyn SQLTransaction, entry: &AuditEntry) -> Result<i64, SQLError> {
    tx.exec(
        "INSERT INTO transaction_logs
         (actor, batch_id, operation, quantity_change, previous_stock,
          new_stock, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        &[
            match &entry.actor {
                Some(a) => Value::Text(a.clone()),
                None => Value::Null,
            },
            Value::Text(entry.batch_id.clone()),
            Value::Text(entry.operation.as_str().to_string()),
            Value::Integer(entry.quantity_change),
            Value::Integer(entry.previous_stock),
            Value::Integer(entry.new_stock),
            Value::Text(entry.timestamp.clone()),
        ],
    )?;
    Ok(tx.last_insert_id())
}
