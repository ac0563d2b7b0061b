//! ffd-morph is a 2D free-form deformation image morphing engine.
//!
//! Two images each carry a square grid of control points. Moving points on either grid warps
//! its image, and a blend factor `t` interpolates both the grids and the images between the
//! source and the destination. The public API is session-oriented:
//!
//! - Edit meshes and bind images through a [`MorphSession`]
//! - Draw blended frames with any [`Rasterizer`], such as the software [`CpuRasterizer`]
//! - Export the full animation into a [`FrameSink`] or straight to an animated GIF
//! - Persist everything as a JSON [`Project`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod anim;
pub(crate) mod assets;
pub(crate) mod encode;
pub(crate) mod mesh;
pub(crate) mod render;
pub(crate) mod session;

pub use crate::foundation::core::{Canvas, ImageHandle, Rgba8, TargetId};
pub use crate::foundation::error::{MorphError, MorphResult};
/// Generic 2/3/4-component vectors and the geometry helpers built on them.
pub use crate::foundation::vec;
pub use crate::foundation::vec::{Vec2, Vec2f};

pub use crate::anim::controller::{
    AnimEvent, AnimationController, DEFAULT_BLEND_FACTOR, DEFAULT_DURATION_MS, Direction,
    MAX_EXPORT_FPS,
};
pub use crate::anim::snapshot::{AnimationSnapshot, ExportGuard};
pub use crate::assets::decode::{DecodedImage, decode_image, load_image_file};
pub use crate::assets::library::{ImageLibrary, ImageResource, LoadReport};
pub use crate::encode::animation::{Animation, Frame, OnFrameAdded};
pub use crate::encode::gif::GifSink;
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::encode::still::save_frame_png;
pub use crate::mesh::control::{ControlMesh, DEFAULT_PROXIMITY_RADIUS_PX, MeshEvent};
pub use crate::mesh::grid::{
    DEFAULT_RESOLUTION, Face, Faces, MAX_COORDINATE, MIN_RESOLUTION, Mesh, generate_triangles,
    is_square,
};
pub use crate::render::backend::{FrameRGBA, Rasterizer};
pub use crate::render::blend::{BlendLayer, render_blended};
pub use crate::render::capture::{CaptureSession, capture_dimensions, with_offscreen};
pub use crate::render::cpu::CpuRasterizer;
pub use crate::session::morph::{MorphSession, Side};
pub use crate::session::opts::SessionOpts;
pub use crate::session::project::{
    MAX_PROJECT_FPS, MAX_PROJECT_LEN_MS, MIN_PROJECT_LEN_MS, Project, ProjectSide,
};
