use std::fmt;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::core::{Canvas, ImageHandle};
use crate::foundation::error::{MorphError, MorphResult};
use crate::foundation::events::Emitter;
use crate::foundation::vec::{Vec2f, Vec2i, clamp, length};
use crate::mesh::grid::{DEFAULT_RESOLUTION, MIN_RESOLUTION, Mesh};

/// Default pick radius: twice the 3 px point size used when drawing control points.
pub const DEFAULT_PROXIMITY_RADIUS_PX: f32 = 6.0;

/// Change notifications emitted by a [`ControlMesh`].
///
/// Notifications are edge-triggered: setting a value to what it already is emits nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshEvent {
    /// The selected point changed (`None` = no selection).
    SelectionChanged(Option<usize>),
    /// The grid was rebuilt with a new number of points per side.
    ResolutionChanged(usize),
    /// Unsaved edits are about to be discarded.
    DestructiveChange,
}

/// An image bound to an independently deformable control mesh.
///
/// Owns its [`Mesh`], the handle of the bound image (if any), the point selection and a dirty
/// flag that tracks edits since the last save/load.
pub struct ControlMesh {
    mesh: Mesh,
    image: Option<ImageHandle>,
    uri: Option<PathBuf>,
    selection: Option<usize>,
    modified: bool,
    proximity_radius_px: f32,
    listeners: Emitter<MeshEvent>,
}

impl fmt::Debug for ControlMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlMesh")
            .field("resolution", &self.resolution())
            .field("image", &self.image)
            .field("uri", &self.uri)
            .field("selection", &self.selection)
            .field("modified", &self.modified)
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl Default for ControlMesh {
    fn default() -> Self {
        Self {
            mesh: Mesh::identity(DEFAULT_RESOLUTION).unwrap_or_default(),
            image: None,
            uri: None,
            selection: None,
            modified: false,
            proximity_radius_px: DEFAULT_PROXIMITY_RADIUS_PX,
            listeners: Emitter::default(),
        }
    }
}

impl ControlMesh {
    /// Create an unbound control mesh with a regular `resolution x resolution` grid.
    pub fn new(resolution: usize) -> MorphResult<Self> {
        Ok(Self {
            mesh: Mesh::identity(resolution)?,
            ..Self::default()
        })
    }

    /// Override the pick radius (in screen pixels).
    pub fn with_proximity_radius(mut self, radius_px: f32) -> Self {
        self.proximity_radius_px = radius_px;
        self
    }

    /// Register a change listener.
    pub fn subscribe(&mut self, listener: impl FnMut(&MeshEvent) + 'static) {
        self.listeners.subscribe(listener);
    }

    /// Borrow the control points.
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Points per grid side.
    pub fn resolution(&self) -> usize {
        self.mesh.resolution()
    }

    /// Bound image, if any.
    pub fn image(&self) -> Option<ImageHandle> {
        self.image
    }

    /// Source path of the bound image, if known.
    pub fn uri(&self) -> Option<&Path> {
        self.uri.as_deref()
    }

    /// Selected point index.
    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    /// `true` when a point is selected.
    pub fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    /// `true` when the mesh or image changed since the last save/load.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Pick radius in screen pixels.
    pub fn proximity_radius_px(&self) -> f32 {
        self.proximity_radius_px
    }

    /// Replace the bound image. Marks the mesh dirty when the handle actually changes.
    pub fn bind_image(&mut self, image: Option<ImageHandle>) {
        if self.image != image {
            self.image = image;
            self.modified = true;
        }
    }

    /// Record where the bound image was loaded from.
    pub fn set_uri(&mut self, uri: Option<PathBuf>) {
        self.uri = uri;
    }

    /// Nearest control point to `p` (normalized coordinates) within the pick radius.
    ///
    /// The radius is `proximity_radius_px / viewport.diagonal()`. Points are scanned in index
    /// order and a later point only wins with a strictly smaller distance, so the earliest point
    /// wins ties.
    pub fn pick(&self, p: Vec2f, viewport: Canvas) -> Option<usize> {
        if self.mesh.is_empty() || viewport.is_empty() {
            return None;
        }

        let radius = self.proximity_radius_px / viewport.diagonal();
        let mut best: Option<(usize, f32)> = None;
        for (i, &q) in self.mesh.points().iter().enumerate() {
            let r = length(p - q);
            if r <= radius && best.is_none_or(|(_, best_r)| r < best_r) {
                best = Some((i, r));
            }
        }
        best.map(|(i, _)| i)
    }

    /// [`ControlMesh::pick`] followed by [`ControlMesh::set_selection`].
    pub fn select_at(&mut self, p: Vec2f, viewport: Canvas) -> Option<usize> {
        let picked = self.pick(p, viewport);
        self.apply_selection(picked);
        picked
    }

    /// Select a point (or clear the selection with `None`).
    ///
    /// Emits [`MeshEvent::SelectionChanged`] only when the selection actually changes.
    pub fn set_selection(&mut self, selection: Option<usize>) -> MorphResult<()> {
        if let Some(i) = selection
            && i >= self.mesh.len()
        {
            return Err(MorphError::invalid_config(format!(
                "selection {i} out of range (len {})",
                self.mesh.len()
            )));
        }
        self.apply_selection(selection);
        Ok(())
    }

    pub(crate) fn apply_selection(&mut self, selection: Option<usize>) {
        if self.selection != selection {
            self.selection = selection;
            self.emit(MeshEvent::SelectionChanged(selection));
        }
    }

    /// Overwrite one control point and mark the mesh dirty.
    pub fn move_point(&mut self, index: usize, pos: Vec2f) -> MorphResult<()> {
        self.mesh.set(index, pos)?;
        self.modified = true;
        Ok(())
    }

    /// Move the selected point, if any. Returns `true` when a point moved.
    pub fn move_selection_to(&mut self, pos: Vec2f) -> bool {
        match self.selection {
            Some(i) => self.move_point(i, pos).is_ok(),
            None => false,
        }
    }

    /// Rebuild the grid with `resolution` points per side.
    ///
    /// Emits [`MeshEvent::DestructiveChange`] first when there are unsaved edits, clears the
    /// selection without notification, then emits [`MeshEvent::ResolutionChanged`].
    pub fn set_resolution(&mut self, resolution: usize) -> MorphResult<()> {
        let mesh = Mesh::identity(resolution)?;
        self.warn_changes();
        self.selection = None;
        self.mesh = mesh;
        self.emit(MeshEvent::ResolutionChanged(resolution));
        Ok(())
    }

    /// Adopt an externally built mesh (e.g. loaded from a project).
    pub fn set_mesh(&mut self, mesh: Mesh) -> MorphResult<()> {
        if mesh.is_empty() || !mesh.is_square() {
            return Err(MorphError::mesh_format("mesh must be a non-empty square grid"));
        }
        self.warn_changes();
        self.apply_selection(None);
        let resolution = mesh.resolution();
        self.mesh = mesh;
        self.emit(MeshEvent::ResolutionChanged(resolution));
        self.modified = false;
        Ok(())
    }

    /// Load mesh text (see [`Mesh::parse_text`]). On failure the current state is unchanged.
    pub fn load_mesh_text(&mut self, text: &str) -> MorphResult<()> {
        let mesh = Mesh::parse_text(text)?;
        self.set_mesh(mesh)
    }

    /// Read mesh text from `input`. On failure the current state is unchanged.
    pub fn load_mesh<R: Read>(&mut self, mut input: R) -> MorphResult<()> {
        let mut text = String::new();
        input
            .read_to_string(&mut text)
            .context("read mesh text")?;
        self.load_mesh_text(&text)
    }

    /// Write the mesh text to `out` and clear the dirty flag.
    pub fn save_mesh<W: Write>(&mut self, mut out: W) -> MorphResult<()> {
        out.write_all(self.mesh.to_text().as_bytes())
            .context("write mesh text")?;
        self.clear_modification();
        Ok(())
    }

    /// Mesh text for persistence; clears the dirty flag.
    pub fn save_mesh_text(&mut self) -> String {
        self.clear_modification();
        self.mesh.to_text()
    }

    /// Reset the grid at the current resolution and unbind the image.
    pub fn clear(&mut self) {
        self.warn_changes();
        self.selection = None;
        self.mesh = Mesh::identity(self.resolution().max(MIN_RESOLUTION)).unwrap_or_default();
        self.image = None;
        self.uri = None;
        self.modified = false;
    }

    /// Forget unsaved-edit tracking.
    pub fn clear_modification(&mut self) {
        self.modified = false;
    }

    /// Map a pixel position (origin top-left) into normalized mesh space (origin bottom-left).
    pub fn normalize_screen(x: i32, y: i32, viewport: Canvas) -> Vec2f {
        if viewport.is_empty() {
            return Vec2f::default();
        }
        let w = i32::try_from(viewport.width).unwrap_or(i32::MAX);
        let h = i32::try_from(viewport.height).unwrap_or(i32::MAX);
        let p = clamp(
            Vec2i::new(x, h.saturating_sub(y)),
            Vec2i::new(0, 0),
            Vec2i::new(w, h),
        );
        Vec2f::new(p.x as f32 / w as f32, p.y as f32 / h as f32).clamp_scalar(0.0, 1.0)
    }

    /// Pointer press at pixel `(x, y)`: select the nearest point under the cursor.
    pub fn press(&mut self, x: i32, y: i32, viewport: Canvas) -> Option<usize> {
        self.select_at(Self::normalize_screen(x, y, viewport), viewport)
    }

    /// Pointer drag to pixel `(x, y)`: move the selected point there.
    pub fn drag_to(&mut self, x: i32, y: i32, viewport: Canvas) -> bool {
        self.move_selection_to(Self::normalize_screen(x, y, viewport))
    }

    fn warn_changes(&mut self) {
        if self.modified {
            self.emit(MeshEvent::DestructiveChange);
            self.modified = false;
        }
    }

    fn emit(&mut self, event: MeshEvent) {
        self.listeners.emit(event);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mesh/control.rs"]
mod tests;
