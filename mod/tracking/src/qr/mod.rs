//! QR label encoding and decoding.
//!
//! A batch id is carried as a one-field JSON payload rendered into a PNG
//! for physical labeling, and recovered from a scanned image of that
//! label. Both directions are pure functions with no shared state.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use tracking::qr;
//!
//! let png = qr::encode("ACM-GEA-250805-K3R7").unwrap();
//! let id = qr::decode(&png).unwrap();
//! assert_eq!(id, "ACM-GEA-250805-K3R7");
//! ```

pub mod decode;
pub mod encode;

use serde::{Deserialize, Serialize};

pub use decode::{DecodeError, decode};
pub use encode::{EncodeError, encode};

/// The structured payload embedded in a batch QR image.
///
/// Exactly one field is required on the wire; decoders ignore any
/// additional fields a future writer may add.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrPayload {
    pub batch_id: String,
}
