use super::*;
use crate::render::cpu::CpuRasterizer;

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

fn write_png(path: &Path, w: u32, h: u32) {
    image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]))
        .save(path)
        .unwrap();
}

#[test]
fn load_dedupes_by_path() {
    let dir = temp_dir("library_dedupe");
    let a = dir.join("a.png");
    write_png(&a, 3, 2);

    let mut r = CpuRasterizer::default();
    let mut lib = ImageLibrary::new();
    let h1 = lib.load(&mut r, &a).unwrap();
    let h2 = lib.load(&mut r, &a).unwrap();
    assert_eq!(h1, h2);
    assert_eq!(lib.len(), 1);

    let res = lib.get(0).unwrap();
    assert_eq!(res.name, "a.png");
    assert_eq!(res.size, Canvas::new(3, 2));
    assert_eq!(r.image_size(h1), Some(Canvas::new(3, 2)));
    assert_eq!(lib.find_handle(h1).map(|r| r.uri.clone()), Some(a));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn batch_load_keeps_going_after_failures() {
    let dir = temp_dir("library_batch");
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    let bad = dir.join("bad.png");
    write_png(&a, 1, 1);
    write_png(&b, 2, 2);
    std::fs::write(&bad, b"not a png").unwrap();

    let mut r = CpuRasterizer::default();
    let mut lib = ImageLibrary::new();
    let report = lib.load_many(
        &mut r,
        &[a.clone(), bad.clone(), dir.join("missing.png"), b.clone()],
    );

    assert_eq!(report.loaded, 2);
    assert_eq!(report.failed.len(), 2);
    assert_eq!(report.failed[0].0, bad);
    assert!(!report.is_complete());
    assert_eq!(report.summary(), "2 files loaded");
    assert_eq!(lib.len(), 2);
    assert!(lib.find(&b).is_some());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn empty_path_is_rejected() {
    let mut r = CpuRasterizer::default();
    let mut lib = ImageLibrary::new();
    assert!(lib.load(&mut r, Path::new("")).is_err());
    assert!(lib.is_empty());
}

#[test]
fn clear_releases_uploaded_images() {
    let mut r = CpuRasterizer::default();
    let mut lib = ImageLibrary::new();
    let img = DecodedImage {
        width: 1,
        height: 1,
        rgba8: vec![0, 0, 0, 255],
    };
    let h = lib.insert(&mut r, Path::new("mem.png"), img).unwrap();
    assert!(r.image_size(h).is_some());

    lib.clear(&mut r);
    assert!(lib.is_empty());
    assert!(r.image_size(h).is_none());
}

#[test]
fn summary_is_singular_for_one() {
    let report = LoadReport {
        loaded: 1,
        failed: Vec::new(),
    };
    assert_eq!(report.summary(), "1 file loaded");
    assert!(report.is_complete());
}

#[test]
fn release_forgets_one_image() {
    let dir = temp_dir("library_release");
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    write_png(&a, 1, 1);
    write_png(&b, 2, 2);

    let mut r = CpuRasterizer::default();
    let mut lib = ImageLibrary::new();
    let ha = lib.load(&mut r, &a).unwrap();
    let hb = lib.load(&mut r, &b).unwrap();

    assert!(lib.release(&mut r, ha));
    assert!(!lib.release(&mut r, ha));
    assert_eq!(lib.len(), 1);
    assert_eq!(r.image_size(ha), None);
    assert_eq!(lib.find(&b).map(|res| res.handle), Some(hb));
}
