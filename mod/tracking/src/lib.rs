pub mod batch_id;
pub mod model;
pub mod qr;
pub mod service;

pub use model::{AuditEntry, Batch, Level, Operation};
pub use service::{BatchOrder, RegisterBatchInput, TrackingService};
