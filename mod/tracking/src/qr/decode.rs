//! QR decoder — recovers a batch id from arbitrary image bytes.

use super::QrPayload;

/// Errors during QR decoding.
///
/// Every failure path on garbage input lands here; the decoder never
/// panics on unreadable bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The bytes contain no decodable QR region (including bytes that are
    /// not an image at all).
    #[error("no qr code found in image")]
    NoCodeFound,

    /// A QR region decoded, but its payload is not a JSON object carrying
    /// a `batch_id` field.
    #[error("qr payload is malformed: {0}")]
    MalformedPayload(String),
}

/// Decode a batch id from image bytes.
///
/// Unknown additional payload fields are ignored. When several QR regions
/// are present, the first one with a well-formed payload wins.
pub fn decode(image_bytes: &[u8]) -> Result<String, DecodeError> {
    let img = match image::load_from_memory(image_bytes) {
        Ok(img) => img.to_luma8(),
        Err(_) => return Err(DecodeError::NoCodeFound),
    };

    let mut prepared = rqrr::PreparedImage::prepare(img);
    let grids = prepared.detect_grids();

    let mut malformed = None;
    for grid in grids {
        // A grid that fails to read is treated as no code, not malformed:
        // malformed is reserved for payloads that decoded but don't parse.
        let Ok((_meta, content)) = grid.decode() else {
            continue;
        };
        match parse_payload(&content) {
            Ok(batch_id) => return Ok(batch_id),
            Err(e) => malformed = Some(e),
        }
    }

    Err(malformed.unwrap_or(DecodeError::NoCodeFound))
}

fn parse_payload(content: &str) -> Result<String, DecodeError> {
    let payload: QrPayload = serde_json::from_str(content)
        .map_err(|e| DecodeError::MalformedPayload(e.to_string()))?;
    Ok(payload.batch_id)
}
