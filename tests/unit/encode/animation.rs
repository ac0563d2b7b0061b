use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::encode::sink::InMemorySink;

fn pixels(w: u32, h: u32, v: u8) -> Vec<u8> {
    vec![v; (w * h * 4) as usize]
}

#[test]
fn add_frame_validates_buffer_length() {
    let mut anim = Animation::new();
    let err = anim.add_frame(2, 2, vec![0; 15], 1).unwrap_err();
    assert!(err.to_string().starts_with("encode error: "));
    assert!(anim.add_frame(0, 2, Vec::new(), 1).is_err());
    assert!(anim.is_empty());

    anim.add_frame(2, 2, pixels(2, 2, 7), 3).unwrap();
    assert_eq!(anim.frame_count(), 1);
    assert_eq!(anim.frames()[0].delay, 3);
}

#[test]
fn callback_sees_running_count_and_can_abort() {
    let seen = Rc::new(Cell::new(0));
    let counter = Rc::clone(&seen);
    let mut anim = Animation::with_callback(move |n| {
        counter.set(n);
        n < 3
    });

    anim.add_frame(1, 1, pixels(1, 1, 0), 1).unwrap();
    anim.add_frame(1, 1, pixels(1, 1, 0), 1).unwrap();
    assert!(anim.add_frame(1, 1, pixels(1, 1, 0), 1).is_err());
    assert_eq!(seen.get(), 3);
}

#[test]
fn write_to_feeds_frames_in_order() {
    let mut anim = Animation::new();
    anim.reserve(3);
    for v in 0..3 {
        anim.add_frame(2, 1, pixels(2, 1, v), 2).unwrap();
    }

    let mut sink = InMemorySink::new();
    anim.write_to(&mut sink).unwrap();
    assert_eq!(
        sink.config(),
        Some(SinkConfig {
            width: 2,
            height: 1,
            frame_count: 3
        })
    );
    assert!(sink.is_finished());
    let order: Vec<(usize, u8)> = sink.frames().iter().map(|(i, f)| (*i, f.data[0])).collect();
    assert_eq!(order, vec![(0, 0), (1, 1), (2, 2)]);
}

#[test]
fn empty_animation_cannot_be_written() {
    let anim = Animation::new();
    let mut sink = InMemorySink::new();
    assert!(anim.write_to(&mut sink).is_err());
    assert!(sink.config().is_none());
    assert!(anim.save_gif(Path::new("unused.gif"), 100).is_err());
}

#[test]
fn empty_path_is_rejected() {
    let mut anim = Animation::new();
    anim.add_frame(1, 1, pixels(1, 1, 0), 1).unwrap();
    assert!(anim.save_gif(Path::new(""), 100).is_err());
}

#[test]
fn clear_drops_frames() {
    let mut anim = Animation::new();
    anim.add_frame(1, 1, pixels(1, 1, 0), 1).unwrap();
    anim.clear();
    assert!(anim.is_empty());
}

#[test]
fn frame_from_readback() {
    let rgba = FrameRGBA {
        width: 1,
        height: 2,
        data: pixels(1, 2, 9),
    };
    let frame = Frame::from_rgba(rgba, 4).unwrap();
    assert_eq!((frame.width, frame.height, frame.delay), (1, 2, 4));
}
