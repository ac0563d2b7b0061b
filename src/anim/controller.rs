use std::time::Duration;

use crate::foundation::error::{MorphError, MorphResult};
use crate::foundation::events::Emitter;

/// Blend factor of a freshly created or cleared controller.
pub const DEFAULT_BLEND_FACTOR: f32 = 0.5;
/// Default animation length in milliseconds.
pub const DEFAULT_DURATION_MS: u32 = 1000;
/// Highest frame rate the exported animation format plays back reliably; also the default fps.
pub const MAX_EXPORT_FPS: u32 = 10;

/// Which way [`AnimationController::step`] moves through the frames.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards the destination image (`t` increasing).
    #[default]
    Forward,
    /// Back towards the source image (`t` decreasing).
    Backward,
}

impl Direction {
    /// Frame increment: `+1` forward, `-1` backward.
    pub fn delta(self) -> i64 {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }
}

/// Change notifications emitted by an [`AnimationController`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnimEvent {
    /// Playback was switched on or off.
    AnimatedChanged(bool),
    /// The blend factor changed.
    BlendFactorChanged(f32),
}

/// Blend factor plus the stepping state machine that drives playback and export.
///
/// Frames are numbered `0..unidirectional_frame_count()`, frame `n` showing
/// `t = n / (unidirectional_frame_count() - 1)`. A bidirectional animation sweeps forward and
/// then back without repeating the turnaround frame.
#[derive(Debug)]
pub struct AnimationController {
    t: f32,
    direction: Direction,
    bidirectional: bool,
    animated: bool,
    fps: u32,
    duration_ms: u32,
    listeners: Emitter<AnimEvent>,
}

impl Default for AnimationController {
    fn default() -> Self {
        Self {
            t: DEFAULT_BLEND_FACTOR,
            direction: Direction::Forward,
            bidirectional: true,
            animated: false,
            fps: MAX_EXPORT_FPS,
            duration_ms: DEFAULT_DURATION_MS,
            listeners: Emitter::default(),
        }
    }
}

impl AnimationController {
    /// Controller with default settings (`t = 0.5`, 10 fps, 1000 ms, bidirectional, stopped).
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a change listener.
    pub fn subscribe(&mut self, listener: impl FnMut(&AnimEvent) + 'static) {
        self.listeners.subscribe(listener);
    }

    /// Current blend factor in `[0, 1]`.
    pub fn t(&self) -> f32 {
        self.t
    }

    /// Set the blend factor, clamped to `[0, 1]`. Non-finite values are ignored.
    pub fn set_t(&mut self, t: f32) {
        if !t.is_finite() {
            return;
        }
        let t = t.clamp(0.0, 1.0);
        if self.t != t {
            self.t = t;
            self.listeners.emit(AnimEvent::BlendFactorChanged(t));
        }
    }

    /// Current stepping direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Set the stepping direction.
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// `true` when playback ping-pongs instead of wrapping.
    pub fn is_bidirectional(&self) -> bool {
        self.bidirectional
    }

    /// Choose between ping-pong and wrap-around playback.
    pub fn set_bidirectional(&mut self, bidirectional: bool) {
        self.bidirectional = bidirectional;
    }

    /// `true` while playback is running.
    pub fn is_animated(&self) -> bool {
        self.animated
    }

    /// Start or stop playback. Emits [`AnimEvent::AnimatedChanged`] only on an actual change.
    pub fn set_animated(&mut self, animated: bool) {
        if self.animated != animated {
            self.animated = animated;
            self.listeners.emit(AnimEvent::AnimatedChanged(animated));
        }
    }

    /// Frames per second.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Frames per second. `0` is accepted and stops the playback timer.
    pub fn set_fps(&mut self, fps: u32) {
        self.fps = fps;
    }

    /// Animation length in milliseconds.
    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    /// Animation length in milliseconds; `0` is ignored.
    pub fn set_duration_ms(&mut self, duration_ms: u32) {
        if duration_ms > 0 {
            self.duration_ms = duration_ms;
        }
    }

    /// `fps * duration_ms / 1000`: frames in one sweep.
    pub fn unidirectional_frame_count(&self) -> u32 {
        let n = u64::from(self.fps) * u64::from(self.duration_ms) / 1000;
        u32::try_from(n).unwrap_or(u32::MAX)
    }

    /// `2 * unidirectional - 1`: a forward sweep followed by a backward sweep sharing the turn frame.
    pub fn bidirectional_frame_count(&self) -> u32 {
        self.unidirectional_frame_count()
            .saturating_mul(2)
            .saturating_sub(1)
    }

    /// Frames in one full period of the configured animation.
    pub fn total_frame_count(&self) -> u32 {
        if self.bidirectional {
            self.bidirectional_frame_count()
        } else {
            self.unidirectional_frame_count()
        }
    }

    fn frame_span(&self) -> MorphResult<u32> {
        let n = self.unidirectional_frame_count();
        if n < 2 {
            return Err(MorphError::invalid_config(format!(
                "animation needs at least 2 frames, got {n} ({} fps x {} ms)",
                self.fps, self.duration_ms
            )));
        }
        Ok(n - 1)
    }

    /// Frame closest to the current blend factor.
    pub fn frame_number(&self) -> MorphResult<u32> {
        let span = self.frame_span()?;
        Ok((self.t * span as f32).round() as u32)
    }

    /// Jump to frame `n`.
    pub fn set_frame_number(&mut self, n: u32) -> MorphResult<()> {
        let span = self.frame_span()?;
        if n > span {
            return Err(MorphError::invalid_config(format!(
                "frame {n} out of range (0..={span})"
            )));
        }
        self.set_t(n as f32 / span as f32);
        Ok(())
    }

    /// Advance one frame in the current direction, turning or wrapping at the ends.
    ///
    /// Returns the new frame number.
    pub fn step(&mut self) -> MorphResult<u32> {
        let count = i64::from(self.frame_span()?) + 1;
        let mut frame = i64::from(self.frame_number()?) + self.direction.delta();

        if frame >= count {
            if self.bidirectional {
                frame = (count - 2).max(0);
                self.direction = Direction::Backward;
            } else {
                frame = 0;
            }
        } else if frame < 0 {
            frame = 1;
            self.direction = Direction::Forward;
        }

        let frame = frame as u32;
        self.set_frame_number(frame)?;
        Ok(frame)
    }

    /// Timer callback: step when playback is running. Returns whether a step happened.
    pub fn tick(&mut self) -> MorphResult<bool> {
        if !self.animated {
            return Ok(false);
        }
        self.step()?;
        Ok(true)
    }

    /// Slider binding: set `t = percent / 100`.
    pub fn set_percent(&mut self, percent: u32) -> MorphResult<()> {
        if percent > 100 {
            return Err(MorphError::invalid_config(format!(
                "percent {percent} outside 0..=100"
            )));
        }
        self.set_t(percent as f32 / 100.0);
        Ok(())
    }

    /// Slider position for the current blend factor.
    pub fn percent(&self) -> u32 {
        (self.t * 100.0) as u32
    }

    /// Period of the playback timer, `None` when `fps == 0`.
    pub fn tick_interval(&self) -> Option<Duration> {
        (self.fps > 0).then(|| Duration::from_millis(u64::from(1000 / self.fps)))
    }

    /// Restore every setting to its default.
    pub fn clear(&mut self) {
        self.direction = Direction::Forward;
        self.set_animated(false);
        self.bidirectional = true;
        self.duration_ms = DEFAULT_DURATION_MS;
        self.fps = MAX_EXPORT_FPS;
        self.set_t(DEFAULT_BLEND_FACTOR);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/anim/controller.rs"]
mod tests;
