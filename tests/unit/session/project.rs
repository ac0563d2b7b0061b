use super::*;
use crate::foundation::vec::Vec2f;
use crate::render::cpu::CpuRasterizer;
use crate::session::opts::SessionOpts;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "ffd_morph_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_png(path: &Path, w: u32, h: u32, rgba: [u8; 4]) {
    image::RgbaImage::from_pixel(w, h, image::Rgba(rgba))
        .save(path)
        .unwrap();
}

fn session() -> MorphSession {
    MorphSession::new(SessionOpts::default()).unwrap()
}

fn sample(mesh: &str) -> Project {
    Project {
        fps: 12,
        len: 1500,
        src: ProjectSide {
            image: None,
            mesh: mesh.to_string(),
        },
        dst: ProjectSide {
            image: None,
            mesh: mesh.to_string(),
        },
    }
}

const QUAD: &str = "0 0 1 0 0 1 1 1";

#[test]
fn validate_checks_playback_ranges() {
    assert!(sample(QUAD).validate().is_ok());
    let mut p = sample(QUAD);
    p.fps = 61;
    assert!(p.validate().unwrap_err().is_invalid_configuration());
    let mut p = sample(QUAD);
    p.len = 99;
    assert!(p.validate().is_err());
    p.len = 10_001;
    assert!(p.validate().is_err());
    p.len = 10_000;
    assert!(p.validate().is_ok());
}

#[test]
fn parse_reports_bad_json_as_serde_error() {
    let err = Project::from_reader("{ not json".as_bytes()).unwrap_err();
    assert!(matches!(err, MorphError::Serde(_)));

    let p = Project::from_reader(
        r#"{"fps":5,"len":200,"src":{"mesh":"0 0 1 0 0 1 1 1"},"dst":{"image":"b.png","mesh":""}}"#
            .as_bytes(),
    )
    .unwrap();
    assert_eq!(p.src.image, None);
    assert_eq!(p.dst.image, Some(PathBuf::from("b.png")));
}

#[test]
fn capture_stores_relative_paths_and_mesh_text() {
    let mut s = session();
    s.mesh_mut(Side::Source)
        .move_point(0, Vec2f::new(0.25, 0.5))
        .unwrap();
    s.bind_image(Side::Source, None, Some(PathBuf::from("/data/proj/img/a.png")));
    s.bind_image(Side::Destination, None, Some(PathBuf::from("/elsewhere/b.png")));

    let p = Project::capture(&s, Some(Path::new("/data/proj")));
    assert_eq!(p.src.image, Some(PathBuf::from("img/a.png")));
    assert_eq!(p.dst.image, Some(PathBuf::from("/elsewhere/b.png")));
    assert_eq!(p.fps, s.animation().fps());
    assert_eq!(p.len, s.animation().duration_ms());
    assert_eq!(Mesh::parse_text(&p.src.mesh).unwrap(), *s.mesh(Side::Source).mesh());
}

#[test]
fn image_path_resolves_against_base_dir() {
    let mut p = sample(QUAD);
    p.src.image = Some(PathBuf::from("a.png"));
    p.dst.image = Some(PathBuf::from("/abs/b.png"));
    let base = Path::new("/proj");
    assert_eq!(
        p.image_path(Side::Source, Some(base)),
        Some(PathBuf::from("/proj/a.png"))
    );
    assert_eq!(
        p.image_path(Side::Destination, Some(base)),
        Some(PathBuf::from("/abs/b.png"))
    );
    assert_eq!(p.image_path(Side::Source, None), Some(PathBuf::from("a.png")));
    p.src.image = None;
    assert_eq!(p.image_path(Side::Source, Some(base)), None);
}

#[test]
fn save_and_open_round_trip() {
    let dir = temp_dir("project_round_trip");
    write_png(&dir.join("a.png"), 4, 4, [255, 0, 0, 255]);
    write_png(&dir.join("b.png"), 4, 4, [0, 0, 255, 255]);

    let mut r = CpuRasterizer::default();
    let mut lib = ImageLibrary::new();
    let mut s = session();
    let a = lib.load(&mut r, &dir.join("a.png")).unwrap();
    let b = lib.load(&mut r, &dir.join("b.png")).unwrap();
    s.bind_image(Side::Source, Some(a), Some(dir.join("a.png")));
    s.bind_image(Side::Destination, Some(b), Some(dir.join("b.png")));
    s.mesh_mut(Side::Destination)
        .move_point(4, Vec2f::new(0.6, 0.4))
        .unwrap();
    s.animation_mut().set_fps(8);
    s.animation_mut().set_duration_ms(2000);
    assert!(s.is_modified());

    let path = dir.join("morph.json");
    let saved = Project::save_session(&mut s, &path).unwrap();
    assert!(!s.is_modified());
    assert_eq!(saved.src.image, Some(PathBuf::from("a.png")));

    let mut r2 = CpuRasterizer::default();
    let mut lib2 = ImageLibrary::new();
    let mut s2 = session();
    let opened = Project::open(&path, &mut s2, &mut lib2, &mut r2).unwrap();
    assert_eq!(opened, saved);
    assert_eq!(lib2.len(), 2);
    assert!(s2.can_paint());
    assert!(!s2.is_modified());
    assert_eq!(s2.animation().fps(), 8);
    assert_eq!(s2.animation().duration_ms(), 2000);
    assert_eq!(s2.mesh(Side::Destination).mesh(), s.mesh(Side::Destination).mesh());
    assert_eq!(s2.mesh(Side::Source).uri(), Some(dir.join("a.png").as_path()));
}

#[test]
fn apply_leaves_session_untouched_on_bad_input() {
    let mut r = CpuRasterizer::default();
    let mut lib = ImageLibrary::new();
    let mut s = session();
    let before = s.mesh(Side::Source).mesh().clone();

    let mut p = sample(QUAD);
    p.dst.mesh = "0 0 1 0 0 1".to_string();
    assert!(p.apply(&mut s, &mut lib, &mut r, None).is_err());

    let mut p = sample(QUAD);
    p.src.mesh = "0 0 1".to_string();
    assert!(matches!(
        p.apply(&mut s, &mut lib, &mut r, None).unwrap_err(),
        MorphError::MeshFormat(_)
    ));

    let mut p = sample(QUAD);
    p.src.image = Some(PathBuf::from("does-not-exist.png"));
    assert!(p.apply(&mut s, &mut lib, &mut r, None).is_err());

    assert_eq!(s.mesh(Side::Source).mesh(), &before);
    assert_eq!(s.resolution(), before.resolution());
}

#[test]
fn apply_without_images_unbinds_both_sides() {
    let mut r = CpuRasterizer::default();
    let mut lib = ImageLibrary::new();
    let mut s = session();
    let h = r.upload_image(1, 1, vec![0, 0, 0, 255]).unwrap();
    s.bind_image(Side::Source, Some(h), None);

    sample(QUAD).apply(&mut s, &mut lib, &mut r, None).unwrap();
    assert!(!s.can_paint());
    assert_eq!(s.resolution(), 2);
    assert_eq!(s.faces().len(), 2);
    assert_eq!(s.animation().fps(), 12);
}

#[test]
fn load_missing_file_is_an_error() {
    let dir = temp_dir("project_missing");
    assert!(Project::load(&dir.join("nope.json")).is_err());
}

#[test]
fn failed_image_load_releases_images_uploaded_for_the_project() {
    let dir = temp_dir("project_rollback");
    write_png(&dir.join("a.png"), 2, 2, [255, 0, 0, 255]);

    let mut r = CpuRasterizer::default();
    let mut lib = ImageLibrary::new();
    let mut s = session();
    let mut p = sample(QUAD);
    p.src.image = Some(PathBuf::from("a.png"));
    p.dst.image = Some(PathBuf::from("missing.png"));

    assert!(p.apply(&mut s, &mut lib, &mut r, Some(dir.as_path())).is_err());
    assert!(lib.is_empty());
    assert_eq!(r.image_size(ImageHandle(1)), None);
    assert!(!s.can_paint());
}

#[test]
fn failed_load_keeps_images_the_library_already_had() {
    let dir = temp_dir("project_keep");
    write_png(&dir.join("a.png"), 2, 2, [255, 0, 0, 255]);

    let mut r = CpuRasterizer::default();
    let mut lib = ImageLibrary::new();
    let existing = lib.load(&mut r, &dir.join("a.png")).unwrap();
    let mut p = sample(QUAD);
    p.src.image = Some(PathBuf::from("a.png"));
    p.dst.image = Some(PathBuf::from("missing.png"));

    assert!(p.apply(&mut session(), &mut lib, &mut r, Some(dir.as_path())).is_err());
    assert_eq!(lib.len(), 1);
    assert_eq!(r.image_size(existing), Some(crate::foundation::core::Canvas::new(2, 2)));
}

#[test]
fn huge_mesh_coordinates_are_a_format_error() {
    let mut p = sample(QUAD);
    p.src.mesh = "0 0 1 0 0 1 1e9 1e9".to_string();
    p.dst.mesh = p.src.mesh.clone();
    let mut r = CpuRasterizer::default();
    let mut lib = ImageLibrary::new();
    let err = p.apply(&mut session(), &mut lib, &mut r, None).unwrap_err();
    assert!(matches!(err, MorphError::MeshFormat(_)));
}
