//! Image encoding: `DynamicImage` → base64 PNG.
//!
//! PNG is lossless; JPEG artefacts around glyph edges measurably hurt OCR at
//! the render sizes used here.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// A rasterised page ready to attach to a model request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPage {
    /// 1-indexed page number in the source document.
    pub page_num: usize,
    pub mime_type: &'static str,
    /// Base64 (standard alphabet, padded) image bytes.
    pub data: String,
}

/// Encode a rendered page as base64 PNG.
pub fn encode_page(page_num: usize, img: &DynamicImage) -> Result<EncodedPage, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let data = STANDARD.encode(&buf);
    debug!("Page {}: encoded {} bytes base64", page_num, data.len());

    Ok(EncodedPage {
        page_num,
        mime_type: "image/png",
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encodes_png_signature() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 4, Rgba([0, 0, 255, 255])));
        let page = encode_page(3, &img).expect("encode should succeed");
        assert_eq!(page.page_num, 3);
        assert_eq!(page.mime_type, "image/png");
        let decoded = STANDARD.decode(&page.data).expect("valid base64");
        assert_eq!(&decoded[..8], b"\x89PNG\r\n\x1a\n");
    }
}
