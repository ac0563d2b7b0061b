use std::path::{Path, PathBuf};

use crate::anim::controller::AnimationController;
use crate::anim::snapshot::ExportGuard;
use crate::encode::animation::{Animation, Frame};
use crate::encode::gif::GifSink;
use crate::encode::sink::FrameSink;
use crate::foundation::core::{Canvas, ImageHandle, Rgba8};
use crate::foundation::error::{MorphError, MorphResult};
use crate::foundation::vec::Vec2f;
use crate::mesh::control::ControlMesh;
use crate::mesh::grid::{Faces, Mesh};
use crate::render::backend::{FrameRGBA, Rasterizer};
use crate::render::blend::{BlendLayer, render_blended};
use crate::render::capture::{capture_dimensions, with_offscreen};
use crate::session::opts::SessionOpts;

/// Which of the two images of a morph.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The image shown at `t = 0`.
    Source,
    /// The image shown at `t = 1`.
    Destination,
}

impl Side {
    /// The opposite side.
    pub fn other(self) -> Self {
        match self {
            Self::Source => Self::Destination,
            Self::Destination => Self::Source,
        }
    }
}

/// A morph between two deformable images plus the animation that plays it.
///
/// Both meshes always share one resolution, so a single [`Faces`] list serves both.
#[derive(Debug)]
pub struct MorphSession {
    opts: SessionOpts,
    src: ControlMesh,
    dst: ControlMesh,
    faces: Faces,
    animation: AnimationController,
}

impl MorphSession {
    /// Create a session with two unbound identity meshes.
    pub fn new(opts: SessionOpts) -> MorphResult<Self> {
        opts.validate()?;
        let src = ControlMesh::new(opts.default_resolution)?
            .with_proximity_radius(opts.proximity_radius_px);
        let dst = ControlMesh::new(opts.default_resolution)?
            .with_proximity_radius(opts.proximity_radius_px);
        let faces = src.mesh().faces();
        Ok(Self {
            opts,
            src,
            dst,
            faces,
            animation: AnimationController::new(),
        })
    }

    /// Session options.
    pub fn opts(&self) -> &SessionOpts {
        &self.opts
    }

    /// Control mesh of one side.
    pub fn mesh(&self, side: Side) -> &ControlMesh {
        match side {
            Side::Source => &self.src,
            Side::Destination => &self.dst,
        }
    }

    /// Mutable control mesh of one side.
    ///
    /// Changing the resolution through this bypasses the shared face list; use
    /// [`MorphSession::set_resolution`] for that.
    pub fn mesh_mut(&mut self, side: Side) -> &mut ControlMesh {
        match side {
            Side::Source => &mut self.src,
            Side::Destination => &mut self.dst,
        }
    }

    /// Triangulation shared by both meshes.
    pub fn faces(&self) -> &Faces {
        &self.faces
    }

    /// Playback state.
    pub fn animation(&self) -> &AnimationController {
        &self.animation
    }

    /// Mutable playback state.
    pub fn animation_mut(&mut self) -> &mut AnimationController {
        &mut self.animation
    }

    /// Grid side length shared by both meshes.
    pub fn resolution(&self) -> usize {
        self.src.resolution()
    }

    /// Rebuild both meshes with `resolution` points per side and regenerate the faces.
    ///
    /// Like [`ControlMesh::set_resolution`], this resets the grids and clears the selection even
    /// when `resolution` is unchanged. Nothing changes when `resolution` is below the minimum.
    pub fn set_resolution(&mut self, resolution: usize) -> MorphResult<()> {
        self.src.set_resolution(resolution)?;
        self.dst.set_resolution(resolution)?;
        self.faces = self.src.mesh().faces();
        Ok(())
    }

    /// Replace both meshes at once, e.g. from a project file.
    ///
    /// Both meshes are validated before either side changes.
    pub fn set_meshes(&mut self, src: Mesh, dst: Mesh) -> MorphResult<()> {
        for mesh in [&src, &dst] {
            if mesh.is_empty() || !mesh.is_square() {
                return Err(MorphError::mesh_format("mesh must be a non-empty square grid"));
            }
        }
        if src.len() != dst.len() {
            return Err(MorphError::invalid_config(format!(
                "source and destination meshes differ in size: {} vs {}",
                src.len(),
                dst.len()
            )));
        }
        self.src.set_mesh(src)?;
        self.dst.set_mesh(dst)?;
        self.faces = self.src.mesh().faces();
        Ok(())
    }

    /// Pick the control point under `p` on `side` and select the same index on both meshes.
    pub fn select_point(&mut self, side: Side, p: Vec2f, viewport: Canvas) -> Option<usize> {
        let picked = self.mesh(side).pick(p, viewport);
        // Both meshes share a resolution, so the index is valid on either side.
        self.src.apply_selection(picked);
        self.dst.apply_selection(picked);
        picked
    }

    /// Move the selected point of `side` only.
    pub fn move_selected(&mut self, side: Side, p: Vec2f) -> bool {
        self.mesh_mut(side).move_selection_to(p)
    }

    /// Bind (or unbind) the image of one side.
    pub fn bind_image(&mut self, side: Side, image: Option<ImageHandle>, uri: Option<PathBuf>) {
        let mesh = self.mesh_mut(side);
        mesh.bind_image(image);
        mesh.set_uri(uri);
    }

    /// `true` when at least one side has an image to draw.
    pub fn can_paint(&self) -> bool {
        self.src.image().is_some() || self.dst.image().is_some()
    }

    /// `true` when either mesh has unsaved edits.
    pub fn is_modified(&self) -> bool {
        self.src.is_modified() || self.dst.is_modified()
    }

    /// Forget unsaved-edit tracking on both meshes.
    pub fn clear_modifications(&mut self) {
        self.src.clear_modification();
        self.dst.clear_modification();
    }

    /// Reset both meshes and the animation.
    pub fn clear(&mut self) {
        self.src.clear();
        self.dst.clear();
        self.animation.clear();
        self.faces = self.src.mesh().faces();
    }

    fn layers(&self) -> (BlendLayer<'_>, BlendLayer<'_>) {
        (
            BlendLayer::new(self.src.mesh(), self.src.image()),
            BlendLayer::new(self.dst.mesh(), self.dst.image()),
        )
    }

    /// Clear the bound target and draw the morph at the current blend factor.
    pub fn render(&self, rasterizer: &mut dyn Rasterizer) -> MorphResult<()> {
        rasterizer.clear(self.opts.clear_rgba);
        let (src, dst) = self.layers();
        render_blended(rasterizer, src, dst, &self.faces, self.animation.t())
    }

    /// Timer tick: advance the animation (when playing), then redraw.
    ///
    /// Returns whether the animation stepped.
    pub fn tick(&mut self, rasterizer: &mut dyn Rasterizer) -> MorphResult<bool> {
        let stepped = self.animation.tick()?;
        self.render(rasterizer)?;
        Ok(stepped)
    }

    /// Render the current frame offscreen at the larger of the two image sizes.
    pub fn capture_frame(&self, rasterizer: &mut dyn Rasterizer) -> MorphResult<FrameRGBA> {
        let size = capture_dimensions(&*rasterizer, self.src.image(), self.dst.image())?;
        with_offscreen(rasterizer, size, |session| {
            self.render(session.rasterizer())?;
            session.read_frame()
        })
    }

    /// The image of `side` at its native size, undeformed.
    pub fn capture_source_preview(
        &self,
        rasterizer: &mut dyn Rasterizer,
        side: Side,
    ) -> MorphResult<FrameRGBA> {
        let image = self
            .mesh(side)
            .image()
            .ok_or_else(|| MorphError::invalid_config(format!("no image bound on {side:?}")))?;
        let size = rasterizer
            .image_size(image)
            .ok_or_else(|| MorphError::render(format!("unknown image {image:?}")))?;

        let quad = Mesh::identity(2)?;
        with_offscreen(rasterizer, size, |session| {
            let r = session.rasterizer();
            r.clear(Rgba8::TRANSPARENT);
            r.set_blend(None);
            r.draw_textured(image, quad.points(), quad.points(), &quad.faces())?;
            session.read_frame()
        })
    }

    /// Run the export loop, appending every frame to `animation`.
    ///
    /// The animation state is forced to an export setup for the duration of the call and
    /// restored afterwards, whether the export succeeds or not.
    pub fn collect_frames(
        &mut self,
        rasterizer: &mut dyn Rasterizer,
        animation: &mut Animation,
    ) -> MorphResult<usize> {
        let size = capture_dimensions(&*rasterizer, self.src.image(), self.dst.image())?;
        let clear = self.opts.clear_rgba;
        let src = BlendLayer::new(self.src.mesh(), self.src.image());
        let dst = BlendLayer::new(self.dst.mesh(), self.dst.image());
        let faces = &self.faces;

        let mut guard = ExportGuard::new(&mut self.animation, self.opts.max_export_fps);
        guard.frame_number()?;
        let total = guard.total_frame_count() as usize;
        let delay = guard.delay();
        animation.reserve(total);

        with_offscreen(rasterizer, size, |session| {
            for _ in 0..total {
                let r = session.rasterizer();
                r.clear(clear);
                render_blended(r, src, dst, faces, guard.t())?;
                animation.push(Frame::from_rgba(session.read_frame()?, delay)?)?;
                guard.step()?;
            }
            Ok(())
        })?;
        Ok(total)
    }

    /// Export the full animation to `sink`. Returns the number of frames written.
    #[tracing::instrument(skip_all)]
    pub fn export_animation(
        &mut self,
        rasterizer: &mut dyn Rasterizer,
        sink: &mut dyn FrameSink,
    ) -> MorphResult<usize> {
        let mut animation = Animation::new();
        let res = self
            .collect_frames(rasterizer, &mut animation)
            .and_then(|n| animation.write_to(sink).map(|()| n));
        match &res {
            Ok(n) => tracing::debug!(frames = n, "animation exported"),
            Err(e) => tracing::warn!(error = %e, "animation export aborted"),
        }
        res
    }

    /// Export the full animation as a looping GIF at `path`.
    pub fn export_gif(&mut self, rasterizer: &mut dyn Rasterizer, path: &Path) -> MorphResult<usize> {
        if path.as_os_str().is_empty() {
            return Err(MorphError::encode("output path is empty"));
        }
        let mut sink = GifSink::new(path, self.opts.export_tick_ms());
        self.export_animation(rasterizer, &mut sink)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/morph.rs"]
mod tests;
