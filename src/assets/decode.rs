use std::path::Path;

use anyhow::Context;

use crate::foundation::core::Canvas;
use crate::foundation::error::MorphResult;

/// Decoded image pixels, straight (non-premultiplied) RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed `width * height * 4` bytes, rows top to bottom.
    pub rgba8: Vec<u8>,
}

impl DecodedImage {
    /// Image dimensions.
    pub fn canvas(&self) -> Canvas {
        Canvas::new(self.width, self.height)
    }
}

/// Decode any supported image format from memory.
pub fn decode_image(bytes: &[u8]) -> MorphResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(DecodedImage {
        width,
        height,
        rgba8: rgba.into_raw(),
    })
}

/// Read and decode an image file.
pub fn load_image_file(path: &Path) -> MorphResult<DecodedImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    decode_image(&bytes)
}
