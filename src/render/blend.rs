use crate::foundation::core::ImageHandle;
use crate::foundation::error::MorphResult;
use crate::mesh::grid::{Face, Mesh};
use crate::render::backend::Rasterizer;

/// One side of a morph: the mesh that deforms it and the image bound to it, if any.
#[derive(Clone, Copy, Debug)]
pub struct BlendLayer<'a> {
    /// Control points, also used as texture coordinates for `image`.
    pub mesh: &'a Mesh,
    /// Bound image.
    pub image: Option<ImageHandle>,
}

impl<'a> BlendLayer<'a> {
    /// Pair a mesh with an optional image.
    pub fn new(mesh: &'a Mesh, image: Option<ImageHandle>) -> Self {
        Self { mesh, image }
    }
}

/// Draw one morph frame into the bound target.
///
/// Both layers are warped onto `src * (1 - t) + dst * t`. The source is drawn opaque, then the
/// destination is laid over it with a constant alpha of `t` regardless of its own alpha channel.
/// A layer drawn without the other one is opaque, and nothing is drawn when neither layer has an
/// image. Blending is off when this returns, on success and failure alike.
#[tracing::instrument(skip(rasterizer, src, dst, faces))]
pub fn render_blended(
    rasterizer: &mut dyn Rasterizer,
    src: BlendLayer<'_>,
    dst: BlendLayer<'_>,
    faces: &[Face],
    t: f32,
) -> MorphResult<()> {
    if src.image.is_none() && dst.image.is_none() {
        return Ok(());
    }

    let warped = Mesh::interpolate(src.mesh, dst.mesh, t.clamp(0.0, 1.0))?;
    let res = draw_layers(rasterizer, &warped, src, dst, faces, t);
    rasterizer.set_blend(None);
    res
}

fn draw_layers(
    rasterizer: &mut dyn Rasterizer,
    warped: &Mesh,
    src: BlendLayer<'_>,
    dst: BlendLayer<'_>,
    faces: &[Face],
    t: f32,
) -> MorphResult<()> {
    if let Some(image) = src.image {
        rasterizer.set_blend(None);
        rasterizer.draw_textured(image, warped.points(), src.mesh.points(), faces)?;
    }
    if let Some(image) = dst.image {
        let alpha = src.image.map(|_| t.clamp(0.0, 1.0));
        rasterizer.set_blend(alpha);
        rasterizer.draw_textured(image, warped.points(), dst.mesh.points(), faces)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/blend.rs"]
mod tests;
