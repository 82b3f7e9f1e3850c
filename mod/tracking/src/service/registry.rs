use chrono::NaiveDate;
use tracing::{info, warn};

use casttrack_core::{ListParams, ListResult, ServiceError, now_timestamp};
use casttrack_sql::Value;

use super::TrackingService;
use super::ledger::record_initial;
use crate::batch_id;
use crate::model::{Batch, Level};

/// Identifier collisions are expected-but-rare; give up after this many
/// independent insert attempts.
const MAX_ID_ATTEMPTS: usize = 5;

/// Input parameters for batch registration. The presentation layer hands
/// these over already trimmed, parsed and type-checked.
#[derive(Debug, Clone)]
pub struct RegisterBatchInput {
    pub product_name: String,
    pub company: String,
    pub level: Level,
    pub deadline: NaiveDate,
    pub initial_stock: i64,
}

/// Ordering for batch listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOrder {
    /// Earliest deadline first.
    Deadline,
    /// Most recently updated first.
    Recency,
}

impl TrackingService {
    /// Register a new batch.
    ///
    /// Validates the inputs, allocates a collision-checked identifier,
    /// persists the batch with status "Pending" and appends the initial
    /// registration audit entry — the insert and its audit entry are one
    /// transaction. Each identifier attempt is an independent
    /// check-and-insert, so concurrent registrations cannot deadlock.
    pub fn register_batch(
        &self,
        input: RegisterBatchInput,
        actor: Option<&str>,
    ) -> Result<Batch, ServiceError> {
        if input.product_name.is_empty() {
            return Err(ServiceError::Validation("product name is required".into()));
        }
        if input.company.is_empty() {
            return Err(ServiceError::Validation("company is required".into()));
        }
        if !(0..=100).contains(&input.initial_stock) {
            return Err(ServiceError::Validation(format!(
                "initial stock {} is outside 0..=100",
                input.initial_stock
            )));
        }

        for attempt in 1..=MAX_ID_ATTEMPTS {
            let id = batch_id::generate(&input.company, &input.product_name);
            let now = now_timestamp();
            let mut taken = false;

            self.sql
                .with_transaction(&mut |tx| {
                    let rows = tx.query(
                        "SELECT batch_id FROM products WHERE batch_id = ?1",
                        &[Value::Text(id.clone())],
                    )?;
                    if !rows.is_empty() {
                        taken = true;
                        return Ok(());
                    }

                    tx.exec(
                        "INSERT INTO products
                         (batch_id, product_name, company, level, deadline,
                          stock_percent, status, last_updated)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                        &[
                            Value::Text(id.clone()),
                            Value::Text(input.product_name.clone()),
                            Value::Text(input.company.clone()),
                            Value::Text(input.level.as_str().to_string()),
                            Value::Text(input.deadline.format("%Y-%m-%d").to_string()),
                            Value::Integer(input.initial_stock),
                            Value::Text("Pending".into()),
                            Value::Text(now.clone()),
                        ],
                    )?;

                    record_initial(tx, actor, &id, input.initial_stock, &now)?;
                    Ok(())
                })
                .map_err(|e| ServiceError::Storage(e.to_string()))?;

            if taken {
                warn!(
                    "batch id {} already taken, regenerating (attempt {}/{})",
                    id, attempt, MAX_ID_ATTEMPTS
                );
                continue;
            }

            info!("registered batch {} ({} / {})", id, input.company, input.product_name);
            return Ok(Batch {
                batch_id: id,
                product_name: input.product_name,
                company: input.company,
                level: input.level,
                deadline: input.deadline,
                stock_percent: input.initial_stock,
                status: "Pending".into(),
                last_updated: now,
            });
        }

        Err(ServiceError::Conflict(format!(
            "could not allocate a unique batch id after {} attempts",
            MAX_ID_ATTEMPTS
        )))
    }

    /// Look up a batch by id.
    pub fn get_batch(&self, batch_id: &str) -> Result<Batch, ServiceError> {
        let rows = self
            .sql
            .query(
                "SELECT * FROM products WHERE batch_id = ?1",
                &[Value::Text(batch_id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("batch '{}' not found", batch_id)))?;
        Batch::from_row(row)
    }

    /// List batches in the requested order, with pagination and total count.
    pub fn list_batches(
        &self,
        order: BatchOrder,
        params: &ListParams,
    ) -> Result<ListResult<Batch>, ServiceError> {
        let order_sql = match order {
            BatchOrder::Deadline => "deadline ASC",
            BatchOrder::Recency => "last_updated DESC",
        };

        let total = self
            .sql
            .query("SELECT COUNT(*) AS cnt FROM products", &[])
            .map_err(|e| ServiceError::Storage(e.to_string()))?
            .first()
            .and_then(|r| r.get_i64("cnt"))
            .unwrap_or(0) as usize;

        let sql = format!(
            "SELECT * FROM products ORDER BY {} LIMIT ?1 OFFSET ?2",
            order_sql
        );
        let rows = self
            .sql
            .query(
                &sql,
                &[
                    Value::Integer(params.limit as i64),
                    Value::Integer(params.offset as i64),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(Batch::from_row(row)?);
        }

        Ok(ListResult { items, total })
    }
}
