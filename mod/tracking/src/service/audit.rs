use casttrack_core::ServiceError;
use casttrack_sql::Value;

use super::TrackingService;
use crate::model::AuditEntry;

impl TrackingService {
    /// All audit entries for a batch, newest first.
    pub fn audit_for_batch(&self, batch_id: &str) -> Result<Vec<AuditEntry>, ServiceError> {
        self.audit_query(
            "SELECT * FROM transaction_logs WHERE batch_id = ?1 ORDER BY log_id DESC",
            &[Value::Text(batch_id.to_string())],
        )
    }

    /// All audit entries attributed to one actor, newest first.
    pub fn audit_for_actor(&self, actor: &str) -> Result<Vec<AuditEntry>, ServiceError> {
        self.audit_query(
            "SELECT * FROM transaction_logs WHERE actor = ?1 ORDER BY log_id DESC",
            &[Value::Text(actor.to_string())],
        )
    }

    fn audit_query(&self, sql: &str, params: &[Value]) -> Result<Vec<AuditEntry>, ServiceError> {
        let rows = self
            .sql
            .query(sql, params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(AuditEntry::from_row(row)?);
        }
        Ok(entries)
    }
}
