use super::*;
use crate::anim::controller::Direction;
use crate::anim::snapshot::AnimationSnapshot;
use crate::encode::sink::InMemorySink;
use crate::render::cpu::CpuRasterizer;

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn session() -> MorphSession {
    let opts = SessionOpts {
        default_resolution: 3,
        ..SessionOpts::default()
    };
    MorphSession::new(opts).unwrap()
}

fn bound(r: &mut CpuRasterizer) -> MorphSession {
    let mut s = session();
    let red = r.upload_image(4, 4, RED.repeat(16)).unwrap();
    let blue = r.upload_image(2, 6, BLUE.repeat(12)).unwrap();
    s.bind_image(Side::Source, Some(red), Some(PathBuf::from("red.png")));
    s.bind_image(Side::Destination, Some(blue), None);
    s
}

#[test]
fn new_rejects_invalid_options() {
    let opts = SessionOpts {
        max_export_fps: 0,
        ..SessionOpts::default()
    };
    assert!(MorphSession::new(opts).is_err());
    let s = session();
    assert_eq!(s.resolution(), 3);
    assert_eq!(s.faces().len(), 8);
    assert_eq!(s.mesh(Side::Source).proximity_radius_px(), 6.0);
}

#[test]
fn resolution_changes_follow_on_both_sides() {
    let mut s = session();
    s.set_resolution(5).unwrap();
    assert_eq!(s.mesh(Side::Source).resolution(), 5);
    assert_eq!(s.mesh(Side::Destination).resolution(), 5);
    assert_eq!(s.faces().len(), 2 * 4 * 4);

    assert!(s.set_resolution(1).is_err());
    assert_eq!(s.resolution(), 5);
    assert_eq!(s.faces().len(), 32);
}

#[test]
fn selection_is_mirrored() {
    let mut s = session();
    let view = Canvas::new(100, 100);
    s.mesh_mut(Side::Destination)
        .move_point(4, Vec2f::new(0.9, 0.1))
        .unwrap();

    assert_eq!(
        s.select_point(Side::Source, Vec2f::new(0.5, 0.5), view),
        Some(4)
    );
    assert_eq!(s.mesh(Side::Destination).selection(), Some(4));

    assert!(s.move_selected(Side::Source, Vec2f::new(0.4, 0.4)));
    assert_eq!(
        s.mesh(Side::Source).mesh().get(4),
        Some(Vec2f::new(0.4, 0.4))
    );
    assert_eq!(
        s.mesh(Side::Destination).mesh().get(4),
        Some(Vec2f::new(0.9, 0.1))
    );

    assert_eq!(
        s.select_point(Side::Destination, Vec2f::new(0.3, 0.3), view),
        None
    );
    assert_eq!(s.mesh(Side::Source).selection(), None);
}

#[test]
fn set_meshes_validates_both_first() {
    let mut s = session();
    let before = s.mesh(Side::Source).mesh().clone();
    let err = s
        .set_meshes(Mesh::identity(4).unwrap(), Mesh::identity(3).unwrap())
        .unwrap_err();
    assert!(err.is_invalid_configuration());
    assert_eq!(s.mesh(Side::Source).mesh(), &before);

    s.set_meshes(Mesh::identity(4).unwrap(), Mesh::identity(4).unwrap())
        .unwrap();
    assert_eq!(s.resolution(), 4);
    assert_eq!(s.faces().len(), 18);
}

#[test]
fn can_paint_needs_one_image() {
    let mut r = CpuRasterizer::default();
    let mut s = session();
    assert!(!s.can_paint());
    let img = r.upload_image(1, 1, RED.to_vec()).unwrap();
    s.bind_image(Side::Destination, Some(img), None);
    assert!(s.can_paint());
    assert!(s.is_modified());
    s.clear_modifications();
    assert!(!s.is_modified());
}

#[test]
fn capture_frame_uses_the_larger_image() {
    let mut r = CpuRasterizer::default();
    let mut s = bound(&mut r);
    s.animation_mut().set_t(0.0);

    let frame = s.capture_frame(&mut r).unwrap();
    assert_eq!(frame.canvas(), Canvas::new(4, 6));
    assert!(frame.data.chunks_exact(4).all(|px| px == RED));
    assert_eq!(r.bound_target(), None);
    assert_eq!(r.target_count(), 0);
}

#[test]
fn capture_frame_without_images_fails() {
    let mut r = CpuRasterizer::default();
    let s = session();
    assert!(s.capture_frame(&mut r).is_err());
}

#[test]
fn source_preview_is_undeformed_and_native_size() {
    let mut r = CpuRasterizer::default();
    let mut s = session();
    #[rustfmt::skip]
    let data = vec![
        1, 2, 3, 255,   4, 5, 6, 255,   7, 8, 9, 255,
        10, 11, 12, 255, 13, 14, 15, 255, 16, 17, 18, 255,
    ];
    let img = r.upload_image(3, 2, data.clone()).unwrap();
    s.bind_image(Side::Source, Some(img), None);
    s.mesh_mut(Side::Source)
        .move_point(4, Vec2f::new(0.1, 0.9))
        .unwrap();

    let preview = s.capture_source_preview(&mut r, Side::Source).unwrap();
    assert_eq!(preview.canvas(), Canvas::new(3, 2));
    assert_eq!(preview.data, data);
    assert!(s.capture_source_preview(&mut r, Side::Destination).is_err());
}

#[test]
fn export_produces_nineteen_unit_delay_frames() {
    let mut r = CpuRasterizer::default();
    let mut s = bound(&mut r);
    s.animation_mut().set_animated(true);
    s.animation_mut().set_direction(Direction::Backward);
    let before = AnimationSnapshot::capture(s.animation());

    let mut sink = InMemorySink::new();
    assert_eq!(s.export_animation(&mut r, &mut sink).unwrap(), 19);

    assert_eq!(sink.frames().len(), 19);
    assert!(sink.is_finished());
    assert!(sink.frames().iter().all(|(_, f)| f.delay == 1));
    assert!(
        sink.frames()
            .iter()
            .all(|(_, f)| (f.width, f.height) == (4, 6))
    );
    // First and last frames are pure source; the turnaround frame is pure destination.
    assert!(sink.frames()[0].1.data.chunks_exact(4).all(|px| px == RED));
    assert!(sink.frames()[18].1.data.chunks_exact(4).all(|px| px == RED));
    assert!(sink.frames()[9].1.data.chunks_exact(4).all(|px| px == BLUE));

    assert_eq!(AnimationSnapshot::capture(s.animation()), before);
    assert_eq!(r.bound_target(), None);
}

#[test]
fn slow_animations_export_fewer_longer_frames() {
    let mut r = CpuRasterizer::default();
    let mut s = bound(&mut r);
    s.animation_mut().set_fps(5);
    s.animation_mut().set_bidirectional(false);

    let mut sink = InMemorySink::new();
    assert_eq!(s.export_animation(&mut r, &mut sink).unwrap(), 5);
    assert!(sink.frames().iter().all(|(_, f)| f.delay == 2));
}

#[test]
fn fast_animations_are_capped() {
    let mut r = CpuRasterizer::default();
    let mut s = bound(&mut r);
    s.animation_mut().set_fps(30);

    let mut sink = InMemorySink::new();
    assert_eq!(s.export_animation(&mut r, &mut sink).unwrap(), 19);
    assert_eq!(s.animation().fps(), 30);
}

#[test]
fn failed_export_restores_state() {
    let mut r = CpuRasterizer::default();
    let mut s = bound(&mut r);
    s.animation_mut().set_fps(1);
    s.animation_mut().set_t(0.3);
    let before = AnimationSnapshot::capture(s.animation());

    let mut sink = InMemorySink::new();
    let err = s.export_animation(&mut r, &mut sink).unwrap_err();
    assert!(err.is_invalid_configuration());
    assert!(sink.config().is_none());
    assert_eq!(AnimationSnapshot::capture(s.animation()), before);
    assert_eq!(r.target_count(), 0);
}

#[test]
fn cancelled_export_stops_early() {
    let mut r = CpuRasterizer::default();
    let mut s = bound(&mut r);
    let mut anim = Animation::with_callback(|n| n < 4);
    assert!(s.collect_frames(&mut r, &mut anim).is_err());
    assert_eq!(anim.frame_count(), 4);
    assert_eq!(s.animation().t(), 0.5);
}

#[test]
fn tick_steps_then_renders() {
    let mut r = CpuRasterizer::new(Canvas::new(4, 4));
    let mut s = bound(&mut r);
    s.animation_mut().set_t(0.0);
    assert!(!s.tick(&mut r).unwrap());

    s.animation_mut().set_animated(true);
    assert!(s.tick(&mut r).unwrap());
    assert_eq!(s.animation().frame_number().unwrap(), 1);
    let frame = r.read_pixels().unwrap();
    assert!(frame.data.chunks_exact(4).all(|px| px != [255, 255, 255, 255]));
}

#[test]
fn clear_resets_everything() {
    let mut r = CpuRasterizer::default();
    let mut s = bound(&mut r);
    s.animation_mut().set_fps(3);
    s.clear();
    assert!(!s.can_paint());
    assert!(!s.is_modified());
    assert_eq!(s.animation().fps(), 10);
    assert_eq!(s.faces().len(), 8);
}

#[cfg(target_os = "linux")]
#[test]
fn gif_export_to_full_device_fails_and_restores_state() {
    let mut r = CpuRasterizer::default();
    let mut s = bound(&mut r);
    s.animation_mut().set_t(0.25);
    assert!(s.export_gif(&mut r, Path::new("/dev/full")).is_err());
    assert_eq!(s.animation().t(), 0.25);
}

#[test]
fn same_resolution_still_resets_both_grids() {
    let mut s = session();
    let view = Canvas::new(100, 100);
    s.mesh_mut(Side::Source)
        .move_point(0, Vec2f::new(0.1, 0.1))
        .unwrap();
    s.select_point(Side::Destination, Vec2f::new(1.0, 1.0), view);
    assert!(s.mesh(Side::Source).has_selection());

    s.set_resolution(3).unwrap();
    assert_eq!(s.mesh(Side::Source).mesh(), &Mesh::identity(3).unwrap());
    assert!(!s.mesh(Side::Source).has_selection());
    assert!(!s.mesh(Side::Destination).has_selection());
    assert_eq!(s.faces().len(), 8);
}
