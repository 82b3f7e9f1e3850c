pub mod audit;
pub mod ledger;
pub mod registry;
pub mod report;
pub mod schema;

use casttrack_core::{ServiceError, StoreConfig};
use casttrack_sql::{SQLStore, SqliteStore};

pub use registry::{BatchOrder, RegisterBatchInput};

/// Tracking service — owns the storage backend and provides the batch
/// registry, stock ledger, audit queries and report export.
///
/// All operations are synchronous request/response. The service holds no
/// mutable state beyond the store itself; every call takes its actor and
/// parameters as arguments.
pub struct TrackingService {
    pub(crate) sql: Box<dyn SQLStore>,
}

impl TrackingService {
    /// Create a service over an already-open store, initializing the schema.
    pub fn new(sql: Box<dyn SQLStore>) -> Result<Self, ServiceError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Self { sql })
    }

    /// Open the SQLite store described by `config` and create a service on it.
    pub fn open(config: &StoreConfig) -> Result<Self, ServiceError> {
        let path = config.resolve_sqlite_path();
        let store = SqliteStore::open(&path)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        Self::new(Box::new(store))
    }
}
