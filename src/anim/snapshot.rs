use std::ops::{Deref, DerefMut};

use crate::anim::controller::{AnimationController, Direction};

/// The part of an [`AnimationController`] that exporting temporarily overrides.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationSnapshot {
    /// Playback flag.
    pub animated: bool,
    /// Stepping direction.
    pub direction: Direction,
    /// Frames per second.
    pub fps: u32,
    /// Blend factor.
    pub t: f32,
}

impl AnimationSnapshot {
    /// Record the current state of `controller`.
    pub fn capture(controller: &AnimationController) -> Self {
        Self {
            animated: controller.is_animated(),
            direction: controller.direction(),
            fps: controller.fps(),
            t: controller.t(),
        }
    }

    /// Put `controller` back into the recorded state.
    pub fn restore(self, controller: &mut AnimationController) {
        controller.set_animated(self.animated);
        controller.set_direction(self.direction);
        controller.set_fps(self.fps);
        controller.set_t(self.t);
    }
}

/// Exclusive access to a controller configured for export.
///
/// On creation playback stops, the direction is forced forward, `t` rewinds to 0 and fps is
/// clamped to `1..=fps_cap`. Dropping the guard restores the captured [`AnimationSnapshot`].
#[derive(Debug)]
pub struct ExportGuard<'a> {
    controller: &'a mut AnimationController,
    snapshot: AnimationSnapshot,
    fps_cap: u32,
}

impl<'a> ExportGuard<'a> {
    /// Snapshot `controller` and apply the export setup.
    pub fn new(controller: &'a mut AnimationController, fps_cap: u32) -> Self {
        let snapshot = AnimationSnapshot::capture(controller);
        let fps_cap = fps_cap.max(1);

        controller.set_animated(false);
        controller.set_direction(Direction::Forward);
        controller.set_fps(snapshot.fps.max(1).min(fps_cap));
        controller.set_t(0.0);

        Self {
            controller,
            snapshot,
            fps_cap,
        }
    }

    /// State that will be restored on drop.
    pub fn snapshot(&self) -> AnimationSnapshot {
        self.snapshot
    }

    /// Per-frame delay in ticks of `1 / fps_cap` seconds: `ceil(fps_cap / fps)`.
    pub fn delay(&self) -> u32 {
        self.fps_cap.div_ceil(self.controller.fps().max(1))
    }

    /// Ceiling the export fps was clamped to.
    pub fn fps_cap(&self) -> u32 {
        self.fps_cap
    }
}

impl Deref for ExportGuard<'_> {
    type Target = AnimationController;

    fn deref(&self) -> &Self::Target {
        self.controller
    }
}

impl DerefMut for ExportGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.controller
    }
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        self.snapshot.restore(self.controller);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/anim/snapshot.rs"]
mod tests;
