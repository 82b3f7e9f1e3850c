use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use casttrack_core::ServiceError;
use casttrack_sql::Row;

/// Production stage label, assigned by the caller at registration.
///
/// No transition ordering is enforced over these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Raw,
    Processing,
    Finished,
    Shipped,
}

impl Level {
    /// The persisted string literal for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Raw => "Raw",
            Level::Processing => "Processing",
            Level::Finished => "Finished",
            Level::Shipped => "Shipped",
        }
    }

    fn parse(s: &str) -> Option<Level> {
        match s {
            "Raw" => Some(Level::Raw),
            "Processing" => Some(Level::Processing),
            "Finished" => Some(Level::Finished),
            "Shipped" => Some(Level::Shipped),
            _ => None,
        }
    }
}

impl std::str::FromStr for Level {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::parse(s)
            .ok_or_else(|| ServiceError::Validation(format!("unrecognized level '{}'", s)))
    }
}

/// Batch — one manufactured unit of tracked work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    /// Primary key, immutable once assigned (e.g. "ACM-GEA-250805-K3R7").
    pub batch_id: String,

    pub product_name: String,

    pub company: String,

    /// Production stage label.
    pub level: Level,

    /// Delivery deadline.
    pub deadline: NaiveDate,

    /// Bounded completion register, always within 0..=100.
    pub stock_percent: i64,

    /// Free-text status label. Registration writes "Pending".
    pub status: String,

    /// Refreshed on creation and on every stock mutation.
    pub last_updated: String,
}

impl Batch {
    /// Map a products row into a typed Batch.
    ///
    /// Rows reaching this point were written by this module, so a missing
    /// or mistyped column is a storage-level fault, not caller input.
    pub fn from_row(row: &Row) -> Result<Batch, ServiceError> {
        let batch_id = row
            .get_str("batch_id")
            .ok_or_else(|| ServiceError::Internal("products row missing batch_id".into()))?;
        let product_name = row
            .get_str("product_name")
            .ok_or_else(|| ServiceError::Internal("products row missing product_name".into()))?;
        let company = row
            .get_str("company")
            .ok_or_else(|| ServiceError::Internal("products row missing company".into()))?;
        let level = row
            .get_str("level")
            .and_then(Level::parse)
            .ok_or_else(|| ServiceError::Internal("products row has unrecognized level".into()))?;
        let deadline = row
            .get_str("deadline")
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .ok_or_else(|| ServiceError::Internal("products row has unreadable deadline".into()))?;
        let stock_percent = row
            .get_i64("stock_percent")
            .ok_or_else(|| ServiceError::Internal("products row missing stock_percent".into()))?;
        let status = row
            .get_str("status")
            .ok_or_else(|| ServiceError::Internal("products row missing status".into()))?;
        let last_updated = row
            .get_str("last_updated")
            .ok_or_else(|| ServiceError::Internal("products row missing last_updated".into()))?;

        Ok(Batch {
            batch_id: batch_id.to_string(),
            product_name: product_name.to_string(),
            company: company.to_string(),
            level,
            deadline,
            stock_percent,
            status: status.to_string(),
            last_updated: last_updated.to_string(),
        })
    }
}
