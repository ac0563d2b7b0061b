use crate::foundation::core::{Canvas, ImageHandle, Rgba8, TargetId};
use crate::foundation::error::MorphResult;
use crate::foundation::vec::Vec2f;
use crate::mesh::grid::Face;

/// Straight-alpha RGBA8 pixels read back from a render target, rows top to bottom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed `width * height * 4` bytes.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// Frame dimensions.
    pub fn canvas(&self) -> Canvas {
        Canvas::new(self.width, self.height)
    }

    /// Pixel at `(x, y)` with `y = 0` being the top row.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Drawing capabilities the morph engine needs from a graphics backend.
///
/// Geometry is given in normalized `[0, 1]^2` coordinates with the origin at the bottom-left of
/// the bound target. Texture coordinates use the same convention relative to the image, so
/// `v = 0` addresses the image's bottom row.
///
/// Unbinding (`bind_target(None)`) selects the backend's default framebuffer.
pub trait Rasterizer {
    /// Upload a straight-alpha RGBA8 image and return its handle.
    fn upload_image(&mut self, width: u32, height: u32, rgba: Vec<u8>)
    -> MorphResult<ImageHandle>;

    /// Forget an uploaded image. Unknown handles are ignored.
    fn release_image(&mut self, image: ImageHandle);

    /// Native pixel size of an uploaded image.
    fn image_size(&self, image: ImageHandle) -> Option<Canvas>;

    /// Allocate an offscreen target. Does not bind it.
    fn create_target(&mut self, size: Canvas) -> MorphResult<TargetId>;

    /// Free an offscreen target. Releasing the bound target rebinds the default framebuffer.
    fn release_target(&mut self, target: TargetId);

    /// Direct subsequent draws and readbacks at `target` (`None` = default framebuffer).
    fn bind_target(&mut self, target: Option<TargetId>) -> MorphResult<()>;

    /// Currently bound offscreen target.
    fn bound_target(&self) -> Option<TargetId>;

    /// Size of whatever is currently bound.
    fn viewport(&self) -> Canvas;

    /// Fill the bound target with `color`.
    fn clear(&mut self, color: Rgba8);

    /// Enable constant-alpha blending with `Some(alpha)`; `None` disables blending.
    fn set_blend(&mut self, alpha: Option<f32>);

    /// Current blend state.
    fn blend(&self) -> Option<f32>;

    /// Draw `faces` over `vertices`, sampling `image` at the matching `texcoords`.
    fn draw_textured(
        &mut self,
        image: ImageHandle,
        vertices: &[Vec2f],
        texcoords: &[Vec2f],
        faces: &[Face],
    ) -> MorphResult<()>;

    /// Read back the whole bound target.
    fn read_pixels(&self) -> MorphResult<FrameRGBA>;
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
