//! Cooperative rotation animation for mandala mode.
//!
//! The host drives frames (typically once per display refresh) by handing
//! back the token returned from the previous call. Stopping invalidates the
//! pending token, so a frame that was already scheduled becomes a no-op.
//!
//! Each frame renders the content captured when the animation (re)based,
//! rotated by the accumulated angle, so small per-frame increments never
//! round away.

use crate::raster::{RasterSurface, Sampling};
use kurbo::{Affine, Point};
use std::f64::consts::TAU;

/// Radians rotated per frame.
pub const DEFAULT_ROTATION_SPEED: f64 = 0.01;

/// Identifies one scheduled animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken {
    generation: u64,
    sequence: u64,
}

impl FrameToken {
    /// Renderer binding this frame was scheduled for.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone)]
pub struct RotationAnimation {
    speed: f64,
    pending: Option<FrameToken>,
    sequence: u64,
    /// Unrotated content the frames are rendered from.
    base: Option<RasterSurface>,
    /// What the last frame left on the surface. Anything else means the
    /// surface was edited or resized and the base is stale.
    rendered: Option<RasterSurface>,
    angle: f64,
}

impl Default for RotationAnimation {
    fn default() -> Self {
        Self {
            speed: DEFAULT_ROTATION_SPEED,
            pending: None,
            sequence: 0,
            base: None,
            rendered: None,
            angle: 0.0,
        }
    }
}

impl RotationAnimation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() {
            self.speed = speed;
        }
    }

    pub fn is_animating(&self) -> bool {
        self.pending.is_some()
    }

    fn next_token(&mut self, generation: u64) -> FrameToken {
        self.sequence += 1;
        FrameToken {
            generation,
            sequence: self.sequence,
        }
    }

    /// Begin animating. Returns the first frame token, or `None` if already running.
    pub fn start(&mut self, generation: u64) -> Option<FrameToken> {
        if self.pending.is_some() {
            return None;
        }
        let token = self.next_token(generation);
        self.pending = Some(token);
        Some(token)
    }

    /// Cancel the pending frame. Returns whether the animation was running.
    pub fn stop(&mut self) -> bool {
        self.base = None;
        self.rendered = None;
        self.angle = 0.0;
        self.pending.take().is_some()
    }

    /// Accumulated rotation of the current base, in radians.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Run one frame: advance the angle, redraw `surface` as the base
    /// rotated about `center`, and schedule the next.
    ///
    /// If the surface no longer holds the previous frame, its current
    /// content becomes the new base.
    ///
    /// Inert (returns `None`, leaves pixels alone) unless `token` is the
    /// pending one.
    pub fn frame(
        &mut self,
        token: FrameToken,
        surface: &mut RasterSurface,
        center: Point,
    ) -> Option<FrameToken> {
        if self.pending != Some(token) {
            log::trace!("Dropping stale animation frame {:?}", token);
            return None;
        }
        if self.base.is_none() || self.rendered.as_ref() != Some(&*surface) {
            log::debug!("Rebasing rotation on current surface content");
            self.angle = 0.0;
            self.base = Some(surface.clone());
        }
        let base = self.base.as_ref()?;
        self.angle = (self.angle + self.speed).rem_euclid(TAU);
        surface.clear_all();
        surface.draw_surface(
            base,
            Affine::rotate_about(self.angle, center),
            Sampling::Bilinear,
            None,
        );
        self.rendered = Some(surface.clone());

        let next = self.next_token(token.generation);
        self.pending = Some(next);
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;

    fn marked_surface() -> RasterSurface {
        let mut surface = RasterSurface::new(20, 20).unwrap();
        surface.set_pixel(18, 10, Rgba::BLACK);
        surface
    }

    #[test]
    fn test_frames_chain_tokens() {
        let mut animation = RotationAnimation::new();
        animation.set_speed(std::f64::consts::FRAC_PI_2);
        let mut surface = marked_surface();
        let center = Point::new(10.0, 10.0);

        let first = animation.start(7).unwrap();
        assert_eq!(first.generation(), 7);
        let second = animation.frame(first, &mut surface, center).unwrap();
        assert_ne!(first, second);
        assert_eq!(surface.pixel(18, 10), Some(Rgba::TRANSPARENT));

        // The consumed token cannot drive another frame.
        let before = surface.clone();
        assert!(animation.frame(first, &mut surface, center).is_none());
        assert_eq!(surface, before);
    }

    #[test]
    fn test_small_steps_accumulate_near_center() {
        let mut surface = RasterSurface::new(100, 100).unwrap();
        for y in 49..=51 {
            for x in 79..=81 {
                surface.set_pixel(x, y, Rgba::BLACK);
            }
        }
        let center = Point::new(50.0, 50.0);
        let mut animation = RotationAnimation::new();
        let mut token = animation.start(0).unwrap();
        // About a quarter turn at the default speed.
        for _ in 0..157 {
            token = animation.frame(token, &mut surface, center).unwrap();
        }
        assert!((animation.angle() - 1.57).abs() < 1e-9);
        assert!(surface.pixel(49, 80).unwrap().a > 200);
        assert_eq!(surface.pixel(80, 50).unwrap().a, 0);
    }

    #[test]
    fn test_edits_between_frames_are_rebased() {
        let mut animation = RotationAnimation::new();
        animation.set_speed(std::f64::consts::FRAC_PI_2);
        let mut surface = marked_surface();
        let center = Point::new(10.0, 10.0);

        let token = animation.start(0).unwrap();
        let token = animation.frame(token, &mut surface, center).unwrap();
        assert!(surface.pixel(9, 18).unwrap().a > 200);

        surface.set_pixel(18, 10, Rgba::BLACK);
        animation.frame(token, &mut surface, center).unwrap();
        // Both marks turn one step from where they were when edited.
        assert!(surface.pixel(9, 18).unwrap().a > 200);
        assert!(surface.pixel(1, 9).unwrap().a > 200);
        assert!((animation.angle() - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_start_twice_is_noop() {
        let mut animation = RotationAnimation::new();
        assert!(animation.start(0).is_some());
        assert!(animation.start(0).is_none());
        assert!(animation.is_animating());
    }

    #[test]
    fn test_frame_after_stop_is_inert() {
        let mut animation = RotationAnimation::new();
        let mut surface = marked_surface();
        let token = animation.start(0).unwrap();
        assert!(animation.stop());

        let before = surface.clone();
        assert!(animation.frame(token, &mut surface, Point::new(10.0, 10.0)).is_none());
        assert_eq!(surface, before);
        assert!(!animation.is_animating());
        assert!(!animation.stop());
    }

    #[test]
    fn test_restart_invalidates_old_token() {
        let mut animation = RotationAnimation::new();
        let mut surface = marked_surface();
        let old = animation.start(0).unwrap();
        animation.stop();
        let fresh = animation.start(0).unwrap();

        assert!(animation.frame(old, &mut surface, Point::new(10.0, 10.0)).is_none());
        assert!(animation.frame(fresh, &mut surface, Point::new(10.0, 10.0)).is_some());
    }
}
