use crate::foundation::error::{MorphError, MorphResult};
use crate::foundation::vec::Vec2f;

/// Smallest grid side length that still forms a cell.
pub const MIN_RESOLUTION: usize = 2;
/// Grid side length used for freshly created control meshes.
pub const DEFAULT_RESOLUTION: usize = 10;
/// Largest accepted magnitude of a control-point coordinate. Points live in `[0, 1]`; a small
/// margin outside is tolerated.
pub const MAX_COORDINATE: f32 = 16.0;

/// One triangle of a [`Faces`] list, as three indices into a [`Mesh`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Face {
    /// First corner.
    pub a: u32,
    /// Second corner.
    pub b: u32,
    /// Third corner.
    pub c: u32,
}

impl Face {
    /// Build a face; the three corners must be distinct.
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        debug_assert!(a != b && b != c && c != a, "degenerate face ({a}, {b}, {c})");
        Self { a, b, c }
    }

    /// Corner indices in winding order.
    pub fn indices(self) -> [u32; 3] {
        [self.a, self.b, self.c]
    }
}

/// Triangle list shared by both meshes of a blend. Depends on topology only.
pub type Faces = Vec<Face>;

/// Triangulate an `(xdiv + 1) x (ydiv + 1)` point grid laid out row-major.
///
/// Emits `2 * xdiv * ydiv` faces in scan order. For a cell with corners
/// `a` (top-left in index order), `b = a + 1`, `c = a + xdiv + 1` and `d = c + 1` the two
/// triangles are `(a, b, d)` and `(a, d, c)`.
pub fn generate_triangles(xdiv: u32, ydiv: u32) -> Faces {
    let xpts = xdiv + 1;
    let total = 2 * (xdiv as usize) * (ydiv as usize);
    let mut faces = Vec::with_capacity(total);

    for y in 0..ydiv {
        for x in 0..xdiv {
            let a = y * xpts + x;
            let b = a + 1;
            let c = a + xpts;
            let d = c + 1;
            faces.push(Face::new(a, b, d));
            faces.push(Face::new(a, d, c));
        }
    }

    debug_assert_eq!(faces.len(), total);
    faces
}

/// `true` when `n` is a perfect square.
pub fn is_square(n: usize) -> bool {
    let r = n.isqrt();
    r * r == n
}

/// A control mesh: `resolution x resolution` points in normalized `[0, 1]^2` space, row-major.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    points: Vec<Vec2f>,
}

impl Mesh {
    /// Regular grid with `resolution` points per side at `(j * d, i * d)`, `d = 1 / (resolution - 1)`.
    pub fn identity(resolution: usize) -> MorphResult<Self> {
        if resolution < MIN_RESOLUTION {
            return Err(MorphError::invalid_config(format!(
                "mesh resolution must be >= {MIN_RESOLUTION}, got {resolution}"
            )));
        }

        let d = 1.0 / (resolution - 1) as f32;
        let mut points = Vec::with_capacity(resolution * resolution);
        for i in 0..resolution {
            for j in 0..resolution {
                points.push(Vec2f::new(j as f32 * d, i as f32 * d));
            }
        }
        Ok(Self { points })
    }

    /// Wrap an existing point list; it must be non-empty and hold a square number of points
    /// describing at least a 2x2 grid.
    pub fn from_points(points: Vec<Vec2f>) -> MorphResult<Self> {
        if points.is_empty() {
            return Err(MorphError::mesh_format("mesh has no points"));
        }
        if !is_square(points.len()) {
            return Err(MorphError::mesh_format(format!(
                "mesh point count {} is not a perfect square",
                points.len()
            )));
        }
        if points.len().isqrt() < MIN_RESOLUTION {
            return Err(MorphError::mesh_format(format!(
                "mesh must have at least {MIN_RESOLUTION}x{MIN_RESOLUTION} points"
            )));
        }
        if let Some((i, p)) = points.iter().enumerate().find(|(_, p)| !in_range(**p)) {
            return Err(MorphError::mesh_format(format!(
                "point {i} ({p}) is not finite or exceeds +/-{MAX_COORDINATE}"
            )));
        }
        Ok(Self { points })
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// `true` when the mesh holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points per grid side (`sqrt(len)`).
    pub fn resolution(&self) -> usize {
        self.points.len().isqrt()
    }

    /// `true` when the point count is a perfect square.
    pub fn is_square(&self) -> bool {
        is_square(self.points.len())
    }

    /// Borrow the points in row-major order.
    pub fn points(&self) -> &[Vec2f] {
        &self.points
    }

    /// Point at `index`, if any.
    pub fn get(&self, index: usize) -> Option<Vec2f> {
        self.points.get(index).copied()
    }

    /// Overwrite the point at `index`.
    pub fn set(&mut self, index: usize, p: Vec2f) -> MorphResult<()> {
        if !in_range(p) {
            return Err(MorphError::invalid_config(format!(
                "point ({p}) is not finite or exceeds +/-{MAX_COORDINATE}"
            )));
        }
        let len = self.points.len();
        let slot = self.points.get_mut(index).ok_or_else(|| {
            MorphError::invalid_config(format!("point index {index} out of range (len {len})"))
        })?;
        *slot = p;
        Ok(())
    }

    /// Triangulation of this mesh's grid.
    pub fn faces(&self) -> Faces {
        let div = self.resolution().saturating_sub(1) as u32;
        generate_triangles(div, div)
    }

    /// Linear interpolation `a * (1 - t) + b * t`, point by point.
    pub fn interpolate(a: &Mesh, b: &Mesh, t: f32) -> MorphResult<Mesh> {
        let mut out = Mesh::default();
        Self::interpolate_into(a, b, t, &mut out)?;
        Ok(out)
    }

    /// [`Mesh::interpolate`] reusing the allocation of `out`.
    pub fn interpolate_into(a: &Mesh, b: &Mesh, t: f32, out: &mut Mesh) -> MorphResult<()> {
        if a.is_empty() {
            return Err(MorphError::invalid_config("cannot interpolate an empty mesh"));
        }
        if a.len() != b.len() {
            return Err(MorphError::invalid_config(format!(
                "mesh size mismatch: {} vs {}",
                a.len(),
                b.len()
            )));
        }
        if !(0.0..=1.0).contains(&t) {
            return Err(MorphError::invalid_config(format!(
                "blend factor {t} outside [0, 1]"
            )));
        }

        out.points.clear();
        out.points.extend(
            a.points
                .iter()
                .zip(&b.points)
                .map(|(&p, &q)| p * (1.0 - t) + q * t),
        );
        Ok(())
    }

    /// Serialize as whitespace-separated `"x y "` pairs in row-major order.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.points.len() * 12);
        for p in &self.points {
            out.push_str(&p.to_string());
            out.push(' ');
        }
        out
    }

    /// Parse the text form written by [`Mesh::to_text`].
    ///
    /// The point count is inferred from the number of token pairs and must form a square grid.
    pub fn parse_text(text: &str) -> MorphResult<Mesh> {
        let coords = text
            .split_whitespace()
            .map(|tok| {
                tok.parse::<f32>()
                    .map_err(|_| MorphError::mesh_format(format!("invalid coordinate '{tok}'")))
            })
            .collect::<MorphResult<Vec<f32>>>()?;

        if coords.len() % 2 != 0 {
            return Err(MorphError::mesh_format(format!(
                "odd number of coordinates ({})",
                coords.len()
            )));
        }

        let points = coords
            .chunks_exact(2)
            .map(|xy| Vec2f::new(xy[0], xy[1]))
            .collect();
        Mesh::from_points(points)
    }
}

fn in_range(p: Vec2f) -> bool {
    [p.x, p.y]
        .iter()
        .all(|c| c.is_finite() && c.abs() <= MAX_COORDINATE)
}

#[cfg(test)]
#[path = "../../tests/unit/mesh/grid.rs"]
mod tests;
