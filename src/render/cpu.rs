use std::collections::HashMap;

use kurbo::{Affine, Point};

use crate::foundation::core::{Canvas, ImageHandle, Rgba8, TargetId};
use crate::foundation::error::{MorphError, MorphResult};
use crate::foundation::math::{blend_constant_alpha, unit_to_u8};
use crate::foundation::vec::Vec2f;
use crate::mesh::grid::Face;
use crate::render::backend::{FrameRGBA, Rasterizer};

const SUBPIXEL_BITS: u32 = 8;
const SUBPIXEL: i64 = 1 << SUBPIXEL_BITS;
// Screen coordinates are clamped to +/-2^20 px so edge products stay within i64.
const GUARD_BAND_PX: f64 = (1 << 20) as f64;

/// Software [`Rasterizer`] over straight-alpha RGBA8 surfaces.
///
/// Coverage is sampled at pixel centres on a fixed-point grid with a top-left fill rule, so
/// triangles that share an edge never touch the same pixel twice. Textures are sampled
/// bilinearly with clamp-to-edge addressing.
pub struct CpuRasterizer {
    framebuffer: CpuSurface,
    images: HashMap<ImageHandle, CpuSurface>,
    targets: HashMap<TargetId, CpuSurface>,
    bound: Option<TargetId>,
    blend: Option<f32>,
    next_image: u32,
    next_target: u32,
}

struct CpuSurface {
    size: Canvas,
    data: Vec<u8>,
}

impl CpuSurface {
    fn new(size: Canvas) -> Self {
        Self {
            size,
            data: vec![0; size.rgba8_len()],
        }
    }

    fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.size.width as usize + x as usize) * 4;
        match self.data.get(i..i + 4) {
            Some(px) => [px[0], px[1], px[2], px[3]],
            None => [0; 4],
        }
    }
}

impl Default for CpuRasterizer {
    fn default() -> Self {
        Self::new(Canvas::default())
    }
}

impl CpuRasterizer {
    /// Create a rasterizer whose default framebuffer is `framebuffer` pixels large.
    pub fn new(framebuffer: Canvas) -> Self {
        Self {
            framebuffer: CpuSurface::new(framebuffer),
            images: HashMap::new(),
            targets: HashMap::new(),
            bound: None,
            blend: None,
            next_image: 1,
            next_target: 1,
        }
    }

    /// Resize (and zero) the default framebuffer, e.g. after a window resize.
    pub fn resize_framebuffer(&mut self, size: Canvas) {
        if self.framebuffer.size != size {
            self.framebuffer = CpuSurface::new(size);
        }
    }

    /// Number of live offscreen targets.
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    fn bound_surface(&self) -> MorphResult<&CpuSurface> {
        match self.bound {
            Some(id) => self
                .targets
                .get(&id)
                .ok_or_else(|| MorphError::render(format!("target {id:?} was released"))),
            None => Ok(&self.framebuffer),
        }
    }
}

impl Rasterizer for CpuRasterizer {
    fn upload_image(
        &mut self,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    ) -> MorphResult<ImageHandle> {
        let size = Canvas::non_empty(width, height)?;
        if rgba.len() != size.rgba8_len() {
            return Err(MorphError::render(format!(
                "image byte length mismatch: expected {}, got {}",
                size.rgba8_len(),
                rgba.len()
            )));
        }

        let handle = ImageHandle(self.next_image);
        self.next_image += 1;
        self.images.insert(handle, CpuSurface { size, data: rgba });
        Ok(handle)
    }

    fn release_image(&mut self, image: ImageHandle) {
        self.images.remove(&image);
    }

    fn image_size(&self, image: ImageHandle) -> Option<Canvas> {
        self.images.get(&image).map(|s| s.size)
    }

    fn create_target(&mut self, size: Canvas) -> MorphResult<TargetId> {
        let size = Canvas::non_empty(size.width, size.height)?;
        let id = TargetId(self.next_target);
        self.next_target += 1;
        self.targets.insert(id, CpuSurface::new(size));
        Ok(id)
    }

    fn release_target(&mut self, target: TargetId) {
        self.targets.remove(&target);
        if self.bound == Some(target) {
            self.bound = None;
        }
    }

    fn bind_target(&mut self, target: Option<TargetId>) -> MorphResult<()> {
        if let Some(id) = target
            && !self.targets.contains_key(&id)
        {
            return Err(MorphError::render(format!("unknown render target {id:?}")));
        }
        self.bound = target;
        Ok(())
    }

    fn bound_target(&self) -> Option<TargetId> {
        self.bound
    }

    fn viewport(&self) -> Canvas {
        self.bound_surface().map(|s| s.size).unwrap_or_default()
    }

    fn clear(&mut self, color: Rgba8) {
        let surface = match self.bound {
            Some(id) => match self.targets.get_mut(&id) {
                Some(s) => s,
                None => return,
            },
            None => &mut self.framebuffer,
        };
        let rgba = color.to_array();
        for px in surface.data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    fn set_blend(&mut self, alpha: Option<f32>) {
        self.blend = alpha.map(|a| a.clamp(0.0, 1.0));
    }

    fn blend(&self) -> Option<f32> {
        self.blend
    }

    fn draw_textured(
        &mut self,
        image: ImageHandle,
        vertices: &[Vec2f],
        texcoords: &[Vec2f],
        faces: &[Face],
    ) -> MorphResult<()> {
        if vertices.len() != texcoords.len() {
            return Err(MorphError::invalid_config(format!(
                "vertex/texcoord count mismatch: {} vs {}",
                vertices.len(),
                texcoords.len()
            )));
        }
        if let Some(i) = faces
            .iter()
            .flat_map(|f| f.indices())
            .find(|&i| i as usize >= vertices.len())
        {
            return Err(MorphError::invalid_config(format!(
                "face index {i} out of range (len {})",
                vertices.len()
            )));
        }

        let texture = self
            .images
            .get(&image)
            .ok_or_else(|| MorphError::render(format!("unknown image {image:?}")))?;
        let target = match self.bound {
            Some(id) => self
                .targets
                .get_mut(&id)
                .ok_or_else(|| MorphError::render(format!("target {id:?} was released")))?,
            None => &mut self.framebuffer,
        };
        if target.size.is_empty() {
            return Ok(());
        }

        let alpha = self.blend.map(unit_to_u8);
        for face in faces {
            let [a, b, c] = face.indices().map(|i| i as usize);
            fill_triangle(
                target,
                texture,
                [vertices[a], vertices[b], vertices[c]],
                [texcoords[a], texcoords[b], texcoords[c]],
                alpha,
            );
        }
        Ok(())
    }

    fn read_pixels(&self) -> MorphResult<FrameRGBA> {
        let s = self.bound_surface()?;
        if s.size.is_empty() {
            return Err(MorphError::render("nothing to read back: bound surface is empty"));
        }
        Ok(FrameRGBA {
            width: s.size.width,
            height: s.size.height,
            data: s.data.clone(),
        })
    }
}

type Fixed = (i64, i64);

fn fill_triangle(
    dst: &mut CpuSurface,
    tex: &CpuSurface,
    pos: [Vec2f; 3],
    uv: [Vec2f; 3],
    alpha: Option<u8>,
) {
    let (w, h) = (f64::from(dst.size.width), f64::from(dst.size.height));
    let (tw, th) = (f64::from(tex.size.width), f64::from(tex.size.height));
    // y-up normalized space onto y-down pixel space.
    let screen = pos.map(|p| Point::new(f64::from(p.x) * w, (1.0 - f64::from(p.y)) * h));
    let texel = uv.map(|p| Point::new(f64::from(p.x) * tw, (1.0 - f64::from(p.y)) * th));
    if screen.iter().chain(&texel).any(|p| !p.is_finite()) {
        return;
    }
    let Some(to_texture) = triangle_map(screen, texel) else {
        return;
    };

    let mut v: [Fixed; 3] = screen.map(|p| {
        let fixed = |c: f64| {
            (c.clamp(-GUARD_BAND_PX, GUARD_BAND_PX) * SUBPIXEL as f64).round() as i64
        };
        (fixed(p.x), fixed(p.y))
    });
    let area = edge(v[0], v[1], v[2]);
    if area == 0 {
        return;
    }
    if area < 0 {
        v.swap(1, 2);
    }
    let edges = [(v[1], v[2]), (v[2], v[0]), (v[0], v[1])];
    let bias = edges.map(|(a, b)| if is_top_left(a, b) { 0 } else { -1 });

    let min_x = v.iter().map(|p| p.0).min().unwrap_or(0);
    let max_x = v.iter().map(|p| p.0).max().unwrap_or(0);
    let min_y = v.iter().map(|p| p.1).min().unwrap_or(0);
    let max_y = v.iter().map(|p| p.1).max().unwrap_or(0);
    let x0 = (min_x >> SUBPIXEL_BITS).max(0);
    let x1 = ((max_x >> SUBPIXEL_BITS) + 1).min(i64::from(dst.size.width));
    let y0 = (min_y >> SUBPIXEL_BITS).max(0);
    let y1 = ((max_y >> SUBPIXEL_BITS) + 1).min(i64::from(dst.size.height));

    let stride = dst.size.width as usize * 4;
    for y in y0..y1 {
        for x in x0..x1 {
            let centre = (x * SUBPIXEL + SUBPIXEL / 2, y * SUBPIXEL + SUBPIXEL / 2);
            let inside = edges
                .iter()
                .zip(bias)
                .all(|(&(a, b), bias)| edge(a, b, centre) + bias >= 0);
            if !inside {
                continue;
            }

            let t = to_texture * Point::new(x as f64 + 0.5, y as f64 + 0.5);
            let src = sample_bilinear(tex, t.x - 0.5, t.y - 0.5);
            let i = y as usize * stride + x as usize * 4;
            let Some(px) = dst.data.get_mut(i..i + 4) else {
                continue;
            };
            let out = match alpha {
                None => src,
                Some(a) => blend_constant_alpha([px[0], px[1], px[2], px[3]], src, a),
            };
            px.copy_from_slice(&out);
        }
    }
}

/// Affine map taking triangle `from` onto triangle `to`, `None` when `from` is degenerate.
fn triangle_map(from: [Point; 3], to: [Point; 3]) -> Option<Affine> {
    let basis = |p: [Point; 3]| {
        let u = p[1] - p[0];
        let v = p[2] - p[0];
        Affine::new([u.x, u.y, v.x, v.y, p[0].x, p[0].y])
    };
    let src = basis(from);
    if src.determinant().abs() <= f64::EPSILON {
        return None;
    }
    Some(basis(to) * src.inverse())
}

fn edge(a: Fixed, b: Fixed, p: Fixed) -> i64 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

// Pixel-space y grows downward: a top edge is horizontal running right, a left edge runs up.
fn is_top_left(a: Fixed, b: Fixed) -> bool {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    (dy == 0 && dx > 0) || dy < 0
}

fn sample_bilinear(tex: &CpuSurface, x: f64, y: f64) -> [u8; 4] {
    let max_x = tex.size.width.saturating_sub(1);
    let max_y = tex.size.height.saturating_sub(1);
    let x = x.clamp(0.0, f64::from(max_x));
    let y = y.clamp(0.0, f64::from(max_y));
    let (fx, fy) = (x - x.floor(), y - y.floor());
    let (x0, y0) = (x.floor() as u32, y.floor() as u32);
    let (x1, y1) = ((x0 + 1).min(max_x), (y0 + 1).min(max_y));

    let p00 = tex.texel(x0, y0);
    let p10 = tex.texel(x1, y0);
    let p01 = tex.texel(x0, y1);
    let p11 = tex.texel(x1, y1);

    let mut out = [0u8; 4];
    for i in 0..4 {
        let top = f64::from(p00[i]) * (1.0 - fx) + f64::from(p10[i]) * fx;
        let bottom = f64::from(p01[i]) * (1.0 - fx) + f64::from(p11[i]) * fx;
        out[i] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
