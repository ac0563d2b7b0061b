use std::fmt;
use std::path::Path;

use crate::encode::gif::GifSink;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::Canvas;
use crate::foundation::error::{MorphError, MorphResult};
use crate::render::backend::FrameRGBA;

/// One captured animation frame: straight RGBA8 pixels plus how long to show them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed `width * height * 4` bytes, rows top to bottom.
    pub data: Vec<u8>,
    /// Display time in export ticks.
    pub delay: u32,
}

impl Frame {
    /// Build a frame, rejecting buffers that do not hold exactly `width * height` pixels.
    pub fn new(width: u32, height: u32, data: Vec<u8>, delay: u32) -> MorphResult<Self> {
        let size = Canvas::new(width, height);
        if size.is_empty() {
            return Err(MorphError::encode(format!("empty frame {width}x{height}")));
        }
        if data.len() != size.rgba8_len() {
            return Err(MorphError::encode(format!(
                "frame byte length mismatch: expected {}, got {}",
                size.rgba8_len(),
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            delay,
        })
    }

    /// Wrap a rasterizer readback.
    pub fn from_rgba(frame: FrameRGBA, delay: u32) -> MorphResult<Self> {
        Self::new(frame.width, frame.height, frame.data, delay)
    }
}

/// Progress callback invoked with the frame count after every added frame.
/// Returning `false` aborts the export.
pub type OnFrameAdded = Box<dyn FnMut(usize) -> bool>;

/// Ordered frames of an animation being exported.
#[derive(Default)]
pub struct Animation {
    frames: Vec<Frame>,
    on_frame_added: Option<OnFrameAdded>,
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animation")
            .field("frames", &self.frames.len())
            .field("on_frame_added", &self.on_frame_added.is_some())
            .finish()
    }
}

impl Animation {
    /// Empty animation without a progress callback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty animation reporting progress to `callback`.
    pub fn with_callback(callback: impl FnMut(usize) -> bool + 'static) -> Self {
        Self {
            frames: Vec::new(),
            on_frame_added: Some(Box::new(callback)),
        }
    }

    /// Validate and append a frame.
    pub fn add_frame(
        &mut self,
        width: u32,
        height: u32,
        data: Vec<u8>,
        delay: u32,
    ) -> MorphResult<()> {
        self.push(Frame::new(width, height, data, delay)?)
    }

    /// Append an already validated frame, then consult the progress callback.
    pub fn push(&mut self, frame: Frame) -> MorphResult<()> {
        self.frames.push(frame);
        let count = self.frames.len();
        if let Some(callback) = self.on_frame_added.as_mut()
            && !callback(count)
        {
            return Err(MorphError::encode(format!(
                "export cancelled after frame {count}"
            )));
        }
        Ok(())
    }

    /// Frames in playback order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// `true` when no frame was added.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Drop all frames.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Reserve room for `additional` more frames.
    pub fn reserve(&mut self, additional: usize) {
        self.frames.reserve(additional);
    }

    /// Feed every frame to `sink`. Fails on an empty animation.
    pub fn write_to(&self, sink: &mut dyn FrameSink) -> MorphResult<()> {
        let first = self
            .frames
            .first()
            .ok_or_else(|| MorphError::encode("cannot write an empty animation"))?;

        sink.begin(SinkConfig {
            width: first.width,
            height: first.height,
            frame_count: self.frames.len(),
        })?;
        for (idx, frame) in self.frames.iter().enumerate() {
            sink.push_frame(idx, frame)?;
        }
        sink.end()
    }

    /// Write an infinitely looping GIF to `path`.
    pub fn save_gif(&self, path: &Path, tick_ms: u32) -> MorphResult<()> {
        if path.as_os_str().is_empty() {
            return Err(MorphError::encode("output path is empty"));
        }
        if self.is_empty() {
            return Err(MorphError::encode("cannot write an empty animation"));
        }
        let mut sink = GifSink::new(path, tick_ms);
        self.write_to(&mut sink)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/animation.rs"]
mod tests;
