use std::path::{Path, PathBuf};

use crate::assets::decode::{DecodedImage, load_image_file};
use crate::foundation::core::{Canvas, ImageHandle};
use crate::foundation::error::{MorphError, MorphResult};
use crate::render::backend::Rasterizer;

/// An image uploaded to the rasterizer together with where it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageResource {
    /// Path the image was loaded from.
    pub uri: PathBuf,
    /// File name shown to the user.
    pub name: String,
    /// Rasterizer handle.
    pub handle: ImageHandle,
    /// Native size.
    pub size: Canvas,
}

/// Outcome of [`ImageLibrary::load_many`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Files now available in the library (including ones that already were).
    pub loaded: usize,
    /// Files that could not be loaded, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl LoadReport {
    /// `true` when every requested file loaded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// One-line status, e.g. `"3 files loaded"`.
    pub fn summary(&self) -> String {
        match self.loaded {
            1 => "1 file loaded".to_string(),
            n => format!("{n} files loaded"),
        }
    }
}

/// Ordered set of loaded images, unique by path.
#[derive(Clone, Debug, Default)]
pub struct ImageLibrary {
    resources: Vec<ImageResource>,
}

impl ImageLibrary {
    /// Empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and upload the image at `path`. A path that is already loaded returns its handle.
    pub fn load(
        &mut self,
        rasterizer: &mut dyn Rasterizer,
        path: &Path,
    ) -> MorphResult<ImageHandle> {
        if path.as_os_str().is_empty() {
            return Err(MorphError::invalid_config("image path is empty"));
        }
        if let Some(existing) = self.find(path) {
            return Ok(existing.handle);
        }
        let decoded = load_image_file(path)?;
        self.insert(rasterizer, path, decoded)
    }

    /// Upload already decoded pixels under `uri`. A known `uri` returns the existing handle.
    pub fn insert(
        &mut self,
        rasterizer: &mut dyn Rasterizer,
        uri: &Path,
        image: DecodedImage,
    ) -> MorphResult<ImageHandle> {
        if let Some(existing) = self.find(uri) {
            return Ok(existing.handle);
        }
        let size = image.canvas();
        let handle = rasterizer.upload_image(image.width, image.height, image.rgba8)?;
        let name = uri
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.resources.push(ImageResource {
            uri: uri.to_path_buf(),
            name,
            handle,
            size,
        });
        Ok(handle)
    }

    /// Load every path, continuing past failures.
    #[tracing::instrument(skip_all, fields(count = paths.len()))]
    pub fn load_many(
        &mut self,
        rasterizer: &mut dyn Rasterizer,
        paths: &[PathBuf],
    ) -> LoadReport {
        let mut report = LoadReport::default();
        for path in paths {
            match self.load(rasterizer, path) {
                Ok(_) => report.loaded += 1,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to load image");
                    report.failed.push((path.clone(), e.to_string()));
                }
            }
        }
        tracing::debug!(loaded = report.loaded, failed = report.failed.len(), "batch load done");
        report
    }

    /// Resource at `index` in load order.
    pub fn get(&self, index: usize) -> Option<&ImageResource> {
        self.resources.get(index)
    }

    /// Resource loaded from `uri`.
    pub fn find(&self, uri: &Path) -> Option<&ImageResource> {
        self.resources.iter().find(|r| r.uri == uri)
    }

    /// Resource owning `handle`.
    pub fn find_handle(&self, handle: ImageHandle) -> Option<&ImageResource> {
        self.resources.iter().find(|r| r.handle == handle)
    }

    /// All resources in load order.
    pub fn resources(&self) -> &[ImageResource] {
        &self.resources
    }

    /// Number of loaded images.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// `true` when nothing is loaded.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Release one image from the rasterizer and forget it. Returns `false` for unknown handles.
    pub fn release(&mut self, rasterizer: &mut dyn Rasterizer, handle: ImageHandle) -> bool {
        match self.resources.iter().position(|r| r.handle == handle) {
            Some(i) => {
                self.resources.remove(i);
                rasterizer.release_image(handle);
                true
            }
            None => false,
        }
    }

    /// Release every image from the rasterizer and forget it.
    pub fn clear(&mut self, rasterizer: &mut dyn Rasterizer) {
        for r in self.resources.drain(..) {
            rasterizer.release_image(r.handle);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/library.rs"]
mod tests;
