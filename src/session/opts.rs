use crate::anim::controller::MAX_EXPORT_FPS;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{MorphError, MorphResult};
use crate::mesh::control::DEFAULT_PROXIMITY_RADIUS_PX;
use crate::mesh::grid::{DEFAULT_RESOLUTION, MIN_RESOLUTION};

/// Options controlling a [`crate::MorphSession`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SessionOpts {
    /// Grid side length of freshly created meshes.
    pub default_resolution: usize,
    /// Pick radius for control points, in screen pixels.
    pub proximity_radius_px: f32,
    /// Background drawn under every frame.
    pub clear_rgba: Rgba8,
    /// Export frame-rate ceiling; also defines the export delay tick (`1 / max_export_fps` s).
    pub max_export_fps: u32,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            default_resolution: DEFAULT_RESOLUTION,
            proximity_radius_px: DEFAULT_PROXIMITY_RADIUS_PX,
            clear_rgba: Rgba8::WHITE,
            max_export_fps: MAX_EXPORT_FPS,
        }
    }
}

impl SessionOpts {
    /// Return options with a different background color.
    pub fn with_clear_rgba(mut self, clear: Rgba8) -> Self {
        self.clear_rgba = clear;
        self
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> MorphResult<()> {
        if self.default_resolution < MIN_RESOLUTION {
            return Err(MorphError::invalid_config(format!(
                "default_resolution must be >= {MIN_RESOLUTION}, got {}",
                self.default_resolution
            )));
        }
        if !(self.proximity_radius_px.is_finite() && self.proximity_radius_px > 0.0) {
            return Err(MorphError::invalid_config(format!(
                "proximity_radius_px must be positive, got {}",
                self.proximity_radius_px
            )));
        }
        if self.max_export_fps == 0 {
            return Err(MorphError::invalid_config("max_export_fps must be non-zero"));
        }
        Ok(())
    }

    /// Length of one export delay tick in milliseconds.
    pub fn export_tick_ms(&self) -> u32 {
        1000 / self.max_export_fps.max(1)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/opts.rs"]
mod tests;
