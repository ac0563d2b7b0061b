use std::path::Path;

use anyhow::Context as _;

use crate::encode::gif::ensure_parent_dir;
use crate::foundation::error::{MorphError, MorphResult};
use crate::render::backend::FrameRGBA;

/// Save a single frame as PNG.
pub fn save_frame_png(frame: &FrameRGBA, path: &Path) -> MorphResult<()> {
    if frame.data.len() != frame.canvas().rgba8_len() || frame.canvas().is_empty() {
        return Err(MorphError::encode(format!(
            "cannot save a {}x{} frame holding {} bytes",
            frame.width,
            frame.height,
            frame.data.len()
        )));
    }
    ensure_parent_dir(path)?;
    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ExtendedColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("failed to write '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/still.rs"]
mod tests;
