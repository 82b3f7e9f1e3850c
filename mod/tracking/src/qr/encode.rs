//! QR encoder — renders a batch id payload into a scannable PNG.

use std::io::Cursor;

use image::Luma;
use qrcode::QrCode;

use super::QrPayload;

/// Errors during QR encoding.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("payload serialization failed: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("qr encoding failed: {0}")]
    Qr(#[from] qrcode::types::QrError),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Encode a batch id into PNG image bytes.
///
/// Deterministic for a given id apart from codec-internal framing; every
/// non-empty id produces an image [`super::decode`] can read back.
pub fn encode(batch_id: &str) -> Result<Vec<u8>, EncodeError> {
    let payload = serde_json::to_string(&QrPayload {
        batch_id: batch_id.to_string(),
    })?;

    let code = QrCode::new(payload.as_bytes())?;
    let img = code.render::<Luma<u8>>().min_dimensions(200, 200).build();

    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageLuma8(img).write_to(&mut out, image::ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_produces_png_bytes() {
        let bytes = encode("ACM-GEA-250805-K3R7").unwrap();
        // PNG signature.
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn encode_is_deterministic_per_id() {
        let a = encode("ACM-GEA-250805-K3R7").unwrap();
        let b = encode("ACM-GEA-250805-K3R7").unwrap();
        assert_eq!(a, b);
    }
}
