use crate::foundation::core::{Canvas, ImageHandle, TargetId};
use crate::foundation::error::{MorphError, MorphResult};
use crate::render::backend::{FrameRGBA, Rasterizer};

/// An offscreen render target bound for the lifetime of the value.
///
/// Creating the session allocates and binds a target and remembers what was bound before.
/// Dropping it releases the target and rebinds the previous one, whichever way the caller exits.
pub struct CaptureSession<'r> {
    rasterizer: &'r mut dyn Rasterizer,
    target: TargetId,
    previous: Option<TargetId>,
    size: Canvas,
}

impl<'r> CaptureSession<'r> {
    /// Allocate and bind an offscreen target of `size` pixels.
    pub fn begin(rasterizer: &'r mut dyn Rasterizer, size: Canvas) -> MorphResult<Self> {
        let previous = rasterizer.bound_target();
        let target = rasterizer.create_target(size)?;
        if let Err(e) = rasterizer.bind_target(Some(target)) {
            rasterizer.release_target(target);
            return Err(e);
        }
        Ok(Self {
            rasterizer,
            target,
            previous,
            size,
        })
    }

    /// The offscreen target.
    pub fn target(&self) -> TargetId {
        self.target
    }

    /// Pixel size of the offscreen target.
    pub fn size(&self) -> Canvas {
        self.size
    }

    /// Rasterizer with the offscreen target bound.
    pub fn rasterizer(&mut self) -> &mut dyn Rasterizer {
        &mut *self.rasterizer
    }

    /// Read back the offscreen target.
    pub fn read_frame(&mut self) -> MorphResult<FrameRGBA> {
        if self.rasterizer.bound_target() != Some(self.target) {
            self.rasterizer.bind_target(Some(self.target))?;
        }
        self.rasterizer.read_pixels()
    }
}

impl Drop for CaptureSession<'_> {
    fn drop(&mut self) {
        self.rasterizer.release_target(self.target);
        if self.rasterizer.bind_target(self.previous).is_err() {
            tracing::warn!(previous = ?self.previous, "previous render target is gone");
            let _ = self.rasterizer.bind_target(None);
        }
    }
}

/// Run `f` with an offscreen target of `size` pixels bound, restoring the previous binding after.
pub fn with_offscreen<T>(
    rasterizer: &mut dyn Rasterizer,
    size: Canvas,
    f: impl FnOnce(&mut CaptureSession<'_>) -> MorphResult<T>,
) -> MorphResult<T> {
    let mut session = CaptureSession::begin(rasterizer, size)?;
    f(&mut session)
}

/// Offscreen size for capturing a morph: the componentwise max of both bound images.
pub fn capture_dimensions(
    rasterizer: &dyn Rasterizer,
    src: Option<ImageHandle>,
    dst: Option<ImageHandle>,
) -> MorphResult<Canvas> {
    let mut size: Option<Canvas> = None;
    for image in [src, dst].into_iter().flatten() {
        let s = rasterizer
            .image_size(image)
            .ok_or_else(|| MorphError::render(format!("unknown image {image:?}")))?;
        size = Some(size.map_or(s, |acc| acc.max(s)));
    }
    size.ok_or_else(|| MorphError::invalid_config("no image bound on either side"))
}

#[cfg(test)]
#[path = "../../tests/unit/render/capture.rs"]
mod tests;
