use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::assets::library::ImageLibrary;
use crate::foundation::core::ImageHandle;
use crate::foundation::error::{MorphError, MorphResult};
use crate::mesh::grid::Mesh;
use crate::render::backend::Rasterizer;
use crate::session::morph::{MorphSession, Side};

/// Highest playback fps a project may request.
pub const MAX_PROJECT_FPS: u32 = 60;
/// Shortest animation a project may request, in milliseconds.
pub const MIN_PROJECT_LEN_MS: u32 = 100;
/// Longest animation a project may request, in milliseconds.
pub const MAX_PROJECT_LEN_MS: u32 = 10_000;

/// Persisted state of one side: where its image lives and its mesh in text form.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProjectSide {
    /// Image path, relative to the project file when it lives below it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<PathBuf>,
    /// Mesh points as whitespace-separated `x y` pairs.
    pub mesh: String,
}

/// A saved morph: playback settings plus both images and meshes.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Project {
    /// Playback frames per second.
    pub fps: u32,
    /// Animation length in milliseconds.
    pub len: u32,
    /// Source side.
    pub src: ProjectSide,
    /// Destination side.
    pub dst: ProjectSide,
}

impl Project {
    /// Snapshot `session`. Image paths below `base_dir` are stored relative to it.
    pub fn capture(session: &MorphSession, base_dir: Option<&Path>) -> Self {
        let capture_side = |side: Side| {
            let mesh = session.mesh(side);
            ProjectSide {
                image: mesh.uri().map(|uri| relative_to(uri, base_dir)),
                mesh: mesh.mesh().to_text(),
            }
        };
        Self {
            fps: session.animation().fps(),
            len: session.animation().duration_ms(),
            src: capture_side(Side::Source),
            dst: capture_side(Side::Destination),
        }
    }

    /// Check the playback settings against the supported ranges.
    pub fn validate(&self) -> MorphResult<()> {
        if self.fps > MAX_PROJECT_FPS {
            return Err(MorphError::invalid_config(format!(
                "project fps must be <= {MAX_PROJECT_FPS}, got {}",
                self.fps
            )));
        }
        if !(MIN_PROJECT_LEN_MS..=MAX_PROJECT_LEN_MS).contains(&self.len) {
            return Err(MorphError::invalid_config(format!(
                "project len must be in {MIN_PROJECT_LEN_MS}..={MAX_PROJECT_LEN_MS} ms, got {}",
                self.len
            )));
        }
        Ok(())
    }

    /// Parse a project from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> MorphResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| MorphError::serde(format!("parse project JSON: {e}")))
    }

    /// Read a project file.
    #[tracing::instrument]
    pub fn load(path: &Path) -> MorphResult<Self> {
        let f = File::open(path)
            .with_context(|| format!("open project '{}'", path.display()))?;
        Self::from_reader(BufReader::new(f))
    }

    /// Write the project as pretty-printed JSON.
    #[tracing::instrument(skip(self))]
    pub fn save(&self, path: &Path) -> MorphResult<()> {
        let f = File::create(path)
            .with_context(|| format!("create project '{}'", path.display()))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, self)
            .map_err(|e| MorphError::serde(format!("write project JSON: {e}")))?;
        w.flush()
            .with_context(|| format!("flush project '{}'", path.display()))?;
        Ok(())
    }

    /// Capture `session`, save it to `path` and clear the session's unsaved-edit flags.
    pub fn save_session(session: &mut MorphSession, path: &Path) -> MorphResult<Self> {
        let project = Self::capture(session, path.parent());
        project.save(path)?;
        session.clear_modifications();
        Ok(project)
    }

    /// Load `path` and apply it to `session`, resolving images relative to the project file.
    pub fn open(
        path: &Path,
        session: &mut MorphSession,
        library: &mut ImageLibrary,
        rasterizer: &mut dyn Rasterizer,
    ) -> MorphResult<Self> {
        let project = Self::load(path)?;
        project.apply(session, library, rasterizer, path.parent())?;
        Ok(project)
    }

    /// Image path of `side`, joined onto `base_dir` when relative.
    pub fn image_path(&self, side: Side, base_dir: Option<&Path>) -> Option<PathBuf> {
        let s = match side {
            Side::Source => &self.src,
            Side::Destination => &self.dst,
        };
        let image = s.image.as_deref()?;
        match base_dir {
            Some(dir) if image.is_relative() => Some(dir.join(image)),
            _ => Some(image.to_path_buf()),
        }
    }

    /// Load images and meshes into `session`.
    ///
    /// Settings, meshes and images are all validated and loaded before the session changes, so
    /// a bad project leaves it untouched. Images uploaded for a project that then fails to load
    /// are released from `library` again.
    pub fn apply(
        &self,
        session: &mut MorphSession,
        library: &mut ImageLibrary,
        rasterizer: &mut dyn Rasterizer,
        base_dir: Option<&Path>,
    ) -> MorphResult<()> {
        self.validate()?;
        let src_mesh = Mesh::parse_text(&self.src.mesh)?;
        let dst_mesh = Mesh::parse_text(&self.dst.mesh)?;
        if src_mesh.len() != dst_mesh.len() {
            return Err(MorphError::invalid_config(format!(
                "source and destination meshes differ in size: {} vs {}",
                src_mesh.len(),
                dst_mesh.len()
            )));
        }

        // Images this call uploads are released again if a later step fails.
        let mut fresh = Vec::new();
        let mut images = Vec::with_capacity(2);
        for side in [Side::Source, Side::Destination] {
            let image = match self.image_path(side, base_dir) {
                Some(path) => {
                    let known = library.find(&path).is_some();
                    match library.load(rasterizer, &path) {
                        Ok(handle) => {
                            if !known {
                                fresh.push(handle);
                            }
                            Some((handle, path))
                        }
                        Err(e) => {
                            release_all(library, rasterizer, &fresh);
                            return Err(e);
                        }
                    }
                }
                None => None,
            };
            images.push((side, image));
        }

        if let Err(e) = session.set_meshes(src_mesh, dst_mesh) {
            release_all(library, rasterizer, &fresh);
            return Err(e);
        }
        for (side, image) in images {
            match image {
                Some((handle, path)) => session.bind_image(side, Some(handle), Some(path)),
                None => session.bind_image(side, None, None),
            }
        }
        let anim = session.animation_mut();
        anim.set_fps(self.fps);
        anim.set_duration_ms(self.len);
        session.clear_modifications();
        Ok(())
    }
}

fn release_all(
    library: &mut ImageLibrary,
    rasterizer: &mut dyn Rasterizer,
    handles: &[ImageHandle],
) {
    for &handle in handles {
        library.release(rasterizer, handle);
    }
}

fn relative_to(path: &Path, base_dir: Option<&Path>) -> PathBuf {
    base_dir
        .and_then(|dir| path.strip_prefix(dir).ok())
        .unwrap_or(path)
        .to_path_buf()
}

#[cfg(test)]
#[path = "../../tests/unit/session/project.rs"]
mod tests;
