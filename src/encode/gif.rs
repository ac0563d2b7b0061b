use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, RgbaImage};

use crate::encode::animation::Frame;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::error::{MorphError, MorphResult};

/// Writes pushed frames as an infinitely looping animated GIF.
///
/// A frame delay of `n` ticks is shown for `n * tick_ms` milliseconds. Frames are encoded in
/// memory and the file is only written by `end`, so a failed export leaves no partial file.
pub struct GifSink {
    path: PathBuf,
    tick_ms: u32,
    frames: Option<Vec<image::Frame>>,
}

impl GifSink {
    /// Sink writing to `path`, one delay tick lasting `tick_ms` milliseconds.
    pub fn new(path: impl Into<PathBuf>, tick_ms: u32) -> Self {
        Self {
            path: path.into(),
            tick_ms,
            frames: None,
        }
    }

    /// Output path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub(crate) fn ensure_parent_dir(path: &Path) -> MorphResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

fn encode_gif(frames: Vec<image::Frame>) -> MorphResult<Vec<u8>> {
    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut bytes);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| MorphError::encode(format!("gif: {e}")))?;
        for (idx, frame) in frames.into_iter().enumerate() {
            encoder
                .encode_frame(frame)
                .map_err(|e| MorphError::encode(format!("frame {idx}: {e}")))?;
        }
        // Dropping the encoder appends the trailer to the in-memory buffer.
    }
    Ok(bytes)
}

impl FrameSink for GifSink {
    fn begin(&mut self, cfg: SinkConfig) -> MorphResult<()> {
        if cfg.width > u32::from(u16::MAX) || cfg.height > u32::from(u16::MAX) {
            return Err(MorphError::encode(format!(
                "gif frames are limited to 65535x65535, got {}x{}",
                cfg.width, cfg.height
            )));
        }
        self.frames = Some(Vec::with_capacity(cfg.frame_count));
        Ok(())
    }

    fn push_frame(&mut self, idx: usize, frame: &Frame) -> MorphResult<()> {
        let frames = self
            .frames
            .as_mut()
            .ok_or_else(|| MorphError::encode("gif sink: push_frame before begin"))?;
        let buffer = RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
            .ok_or_else(|| MorphError::encode(format!("frame {idx}: buffer too small")))?;
        let delay = Delay::from_numer_denom_ms(frame.delay.saturating_mul(self.tick_ms), 1);
        frames.push(image::Frame::from_parts(buffer, 0, 0, delay));
        Ok(())
    }

    fn end(&mut self) -> MorphResult<()> {
        let frames = self
            .frames
            .take()
            .ok_or_else(|| MorphError::encode("gif sink: end before begin"))?;
        let bytes = encode_gif(frames)?;
        ensure_parent_dir(&self.path)?;
        std::fs::write(&self.path, bytes)
            .with_context(|| format!("failed to write '{}'", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;
