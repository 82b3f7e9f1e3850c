use serde::{Deserialize, Serialize};

use casttrack_core::ServiceError;
use casttrack_sql::Row;

/// Kind of stock mutation an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "Initial Registration")]
    InitialRegistration,

    #[serde(rename = "Stock Update")]
    StockUpdate,
}

impl Operation {
    /// The persisted string literal for this operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::InitialRegistration => "Initial Registration",
            Operation::StockUpdate => "Stock Update",
        }
    }

    fn parse(s: &str) -> Option<Operation> {
        match s {
            "Initial Registration" => Some(Operation::InitialRegistration),
            "Stock Update" => Some(Operation::StockUpdate),
            _ => None,
        }
    }
}

/// AuditEntry — one immutable record of a stock mutation.
///
/// Entries for a batch form a chain: each entry's `previous_stock` equals
/// the preceding entry's `new_stock` (or the initial registration value),
/// and the newest entry's `new_stock` equals the batch's current
/// `stock_percent`. Entries are never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Monotonically increasing id, assigned by storage.
    pub log_id: i64,

    /// Identity the mutation is attributed to, if any.
    pub actor: Option<String>,

    /// Weak reference to the mutated batch.
    pub batch_id: String,

    pub operation: Operation,

    /// Signed delta applied; `new_stock - previous_stock`.
    pub quantity_change: i64,

    pub previous_stock: i64,

    pub new_stock: i64,

    pub timestamp: String,
}

impl AuditEntry {
    /// Map a transaction_logs row into a typed AuditEntry.
    pub fn from_row(row: &Row) -> Result<AuditEntry, ServiceError> {
        let log_id = row
            .get_i64("log_id")
            .ok_or_else(|| ServiceError::Internal("log row missing log_id".into()))?;
        let actor = row.get_str("actor").map(str::to_string);
        let batch_id = row
            .get_str("batch_id")
            .ok_or_else(|| ServiceError::Internal("log row missing batch_id".into()))?;
        let operation = row
            .get_str("operation")
            .and_then(Operation::parse)
            .ok_or_else(|| ServiceError::Internal("log row has unrecognized operation".into()))?;
        let quantity_change = row
            .get_i64("quantity_change")
            .ok_or_else(|| ServiceError::Internal("log row missing quantity_change".into()))?;
        let previous_stock = row
            .get_i64("previous_stock")
            .ok_or_else(|| ServiceError::Internal("log row missing previous_stock".into()))?;
        let new_stock = row
            .get_i64("new_stock")
            .ok_or_else(|| ServiceError::Internal("log row missing new_stock".into()))?;
        let timestamp = row
            .get_str("timestamp")
            .ok_or_else(|| ServiceError::Internal("log row missing timestamp".into()))?;

        Ok(AuditEntry {
            log_id,
            actor,
            batch_id: batch_id.to_string(),
            operation,
            quantity_change,
            previous_stock,
            new_stock,
            timestamp: timestamp.to_string(),
        })
    }
}
