use casttrack_core::ServiceError;

use super::TrackingService;
use crate::model::Batch;

/// Header row for the batch report. Every Batch field except
/// `last_updated`, in the persisted column order.
const REPORT_HEADER: [&str; 7] = [
    "batch_id",
    "product_name",
    "company",
    "level",
    "deadline",
    "stock_percent",
    "status",
];

impl TrackingService {
    /// Export all batches as CSV, earliest deadline first.
    pub fn batches_csv(&self) -> Result<String, ServiceError> {
        let rows = self
            .sql
            .query("SELECT * FROM products ORDER BY deadline", &[])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(REPORT_HEADER)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        for row in &rows {
            let batch = Batch::from_row(row)?;
            wtr.write_record([
                batch.batch_id.as_str(),
                batch.product_name.as_str(),
                batch.company.as_str(),
                batch.level.as_str(),
                &batch.deadline.format("%Y-%m-%d").to_string(),
                &batch.stock_percent.to_string(),
                batch.status.as_str(),
            ])
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        }

        let bytes = wtr
            .into_inner()
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| ServiceError::Internal(e.to_string()))
    }
}
