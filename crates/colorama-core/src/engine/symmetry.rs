//! Radial symmetry ("mandala") renderer.

use super::animation::{FrameToken, RotationAnimation};
use super::{StrokeRenderer, StrokeStyle};
use crate::color::Rgba;
use crate::config::DrawingConfig;
use crate::input::StrokePoint;
use crate::raster::{Paint, RasterSurface, Sampling, SurfaceError};
use kurbo::{Affine, BezPath, Point, Vec2};
use std::f64::consts::{FRAC_PI_8, TAU};

const GUIDE_LINE: Rgba = Rgba::new(128, 128, 128, 255);

/// Replicate `point` around `center` into `segments` rotated copies, each
/// followed by its reflection when `mirror` is set.
///
/// Reflection negates the polar angle before rotating, so the mirror axis is
/// the horizontal line through the center.
pub fn replicate(center: Point, segments: u32, mirror: bool, point: Point) -> Vec<Point> {
    let segments = segments.max(1);
    let step = TAU / segments as f64;
    let offset = point - center;
    let radius = offset.hypot();
    let angle = offset.y.atan2(offset.x);

    let at = |theta: f64| center + Vec2::from_angle(theta) * radius;
    let mut points = Vec::with_capacity(segments as usize * if mirror { 2 } else { 1 });
    for k in 0..segments {
        let rotation = step * k as f64;
        points.push(at(angle + rotation));
        if mirror {
            points.push(at(-angle + rotation));
        }
    }
    points
}

#[derive(Debug, Clone)]
struct SymmetryStroke {
    paint: Paint,
    width: f64,
    last: Option<Point>,
}

#[derive(Debug, Clone)]
pub struct SymmetryRenderer {
    segments: u32,
    mirror: bool,
    show_guides: bool,
    center: Point,
    overlay: RasterSurface,
    stroke: Option<SymmetryStroke>,
    animation: RotationAnimation,
}

impl SymmetryRenderer {
    pub fn new(surface: &RasterSurface, config: &DrawingConfig) -> Result<Self, SurfaceError> {
        let mut renderer = Self {
            segments: config.symmetry_segments(),
            mirror: true,
            show_guides: true,
            center: Self::center_of(surface),
            overlay: RasterSurface::new(surface.width(), surface.height())?,
            stroke: None,
            animation: RotationAnimation::new(),
        };
        renderer.draw_guides();
        Ok(renderer)
    }

    fn center_of(surface: &RasterSurface) -> Point {
        Point::new(surface.width() as f64 / 2.0, surface.height() as f64 / 2.0)
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn segments(&self) -> u32 {
        self.segments
    }

    pub fn mirror(&self) -> bool {
        self.mirror
    }

    pub fn set_mirror_mode(&mut self, mirror: bool) {
        self.mirror = mirror;
        self.draw_guides();
    }

    pub fn show_guides(&self) -> bool {
        self.show_guides
    }

    pub fn toggle_guides(&mut self) {
        self.show_guides = !self.show_guides;
        self.draw_guides();
    }

    pub fn animation(&self) -> &RotationAnimation {
        &self.animation
    }

    pub fn set_rotation_speed(&mut self, speed: f64) {
        self.animation.set_speed(speed);
    }

    pub fn start_animation(&mut self, generation: u64) -> Option<FrameToken> {
        self.animation.start(generation)
    }

    pub fn stop_animation(&mut self) -> bool {
        self.animation.stop()
    }

    pub fn animation_frame(&mut self, token: FrameToken, surface: &mut RasterSurface) -> Option<FrameToken> {
        self.animation.frame(token, surface, self.center)
    }

    /// Replicas of `point` under the current settings.
    pub fn replicas(&self, point: Point) -> Vec<Point> {
        replicate(self.center, self.segments, self.mirror, point)
    }

    fn draw_guides(&mut self) {
        self.overlay.clear_all();
        if !self.show_guides {
            return;
        }
        let (w, h) = (self.overlay.width() as f64, self.overlay.height() as f64);
        let line = Paint::new(GUIDE_LINE).with_opacity(0.3);

        self.overlay
            .fill_circle(self.center, 3.0, &Paint::new(GUIDE_LINE).with_opacity(0.5));

        let reach = w.max(h);
        let step = TAU / self.segments as f64;
        let mut spokes = BezPath::new();
        for i in 0..self.segments {
            spokes.move_to(self.center);
            spokes.line_to(self.center + Vec2::from_angle(step * i as f64) * reach);
        }
        self.overlay.stroke_path(&spokes, 1.0, &line);

        let max_radius = w.min(h) / 2.0;
        for quarter in 1..4 {
            let radius = max_radius * quarter as f64 / 4.0;
            self.overlay.stroke_circle(self.center, radius, 1.0, &line);
        }
    }

    /// The wedge `[k·step, (k+1)·step)` as a closed polygon reaching past
    /// every corner of a `w × h` surface.
    fn wedge(&self, k: u32, step: f64, w: f64, h: f64) -> BezPath {
        let reach = 2.0 * w.hypot(h);
        let start = step * k as f64;
        let pieces = (step / FRAC_PI_8).ceil().max(1.0) as u32;
        let mut path = BezPath::new();
        path.move_to(self.center);
        for i in 0..=pieces {
            let theta = start + step * i as f64 / pieces as f64;
            path.line_to(self.center + Vec2::from_angle(theta) * reach);
        }
        path.close_path();
        path
    }

    /// Tile the first wedge `[0, 2π/segments)` of the surface into every
    /// wedge. With mirror mode on, the reflected wedge is composited on top.
    pub fn apply_kaleidoscope(&self, surface: &mut RasterSurface) {
        let source = surface.clone();
        surface.clear_all();
        let step = TAU / self.segments as f64;
        let (w, h) = (surface.width() as f64, surface.height() as f64);
        let flip = Affine::translate(self.center.to_vec2())
            * Affine::FLIP_Y
            * Affine::translate(-self.center.to_vec2());

        for k in 0..self.segments {
            let clip = self.wedge(k, step, w, h);
            let rotation = Affine::rotate_about(step * k as f64, self.center);
            surface.draw_surface(&source, rotation, Sampling::Nearest, Some(&clip));
            if self.mirror {
                surface.draw_surface(&source, rotation * flip, Sampling::Nearest, Some(&clip));
            }
        }
    }
}

impl StrokeRenderer for SymmetryRenderer {
    fn on_start(&mut self, surface: &mut RasterSurface, point: StrokePoint, style: &StrokeStyle) {
        let stroke = SymmetryStroke {
            paint: style.paint(),
            width: style.brush_size,
            last: Some(point.position),
        };
        for p in self.replicas(point.position) {
            surface.fill_circle(p, stroke.width / 2.0, &stroke.paint);
        }
        self.stroke = Some(stroke);
    }

    fn on_move(&mut self, surface: &mut RasterSurface, point: StrokePoint) {
        let Some(last) = self.stroke.as_ref().and_then(|s| s.last) else {
            return;
        };
        let from = self.replicas(last);
        let to = self.replicas(point.position);
        if let Some(stroke) = self.stroke.as_mut() {
            for (a, b) in from.into_iter().zip(to) {
                surface.stroke_line(a, b, stroke.width, &stroke.paint);
            }
            stroke.last = Some(point.position);
        }
    }

    fn on_end(&mut self, _surface: &mut RasterSurface) -> bool {
        self.stroke
            .take()
            .is_some_and(|stroke| stroke.last.is_some())
    }

    fn abandon(&mut self) {
        self.stroke = None;
    }

    fn sync_config(
        &mut self,
        _surface: &mut RasterSurface,
        config: &DrawingConfig,
    ) -> Result<(), SurfaceError> {
        let segments = config.symmetry_segments();
        if segments != self.segments {
            self.segments = segments;
            self.draw_guides();
        }
        Ok(())
    }

    fn on_resize(&mut self, surface: &mut RasterSurface) -> Result<(), SurfaceError> {
        self.center = Self::center_of(surface);
        self.overlay = RasterSurface::new(surface.width(), surface.height())?;
        self.draw_guides();
        Ok(())
    }

    fn overlay(&self) -> Option<&RasterSurface> {
        Some(&self.overlay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn assert_close(a: Point, b: Point) {
        assert!((a - b).hypot() < 1e-9, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_four_segments_rotate_quarter_turns() {
        let center = Point::new(50.0, 50.0);
        let points = replicate(center, 4, false, Point::new(60.0, 50.0));
        assert_eq!(points.len(), 4);
        assert_close(points[0], Point::new(60.0, 50.0));
        assert_close(points[1], Point::new(50.0, 60.0));
        assert_close(points[2], Point::new(40.0, 50.0));
        assert_close(points[3], Point::new(50.0, 40.0));
        for p in points {
            assert!(((p - center).hypot() - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_mirror_interleaves_reflections() {
        let center = Point::new(0.0, 0.0);
        let p = Point::new(10.0, 5.0);
        let points = replicate(center, 4, true, p);
        assert_eq!(points.len(), 8);
        assert_close(points[0], p);
        assert_close(points[1], Point::new(10.0, -5.0));
        let expected = Point::ORIGIN + Vec2::from_angle(5f64.atan2(10.0) + FRAC_PI_2) * p.to_vec2().hypot();
        assert_close(points[2], expected);
    }

    #[test]
    fn test_start_paints_every_replica() {
        let mut surface = RasterSurface::new(100, 100).unwrap();
        let mut config = DrawingConfig::default();
        config.set_symmetry_segments(4);
        let mut renderer = SymmetryRenderer::new(&surface, &config).unwrap();
        renderer.set_mirror_mode(false);

        renderer.on_start(&mut surface, StrokePoint::new(80.0, 50.0), &StrokeStyle::capture(&config));
        for (x, y) in [(80, 50), (50, 80), (20, 50), (50, 20)] {
            assert_eq!(surface.pixel(x, y).map(|c| c.a), Some(255), "({}, {})", x, y);
        }
        assert!(renderer.on_end(&mut surface));
        assert!(!renderer.on_end(&mut surface));
    }

    #[test]
    fn test_move_connects_same_index_replicas() {
        let mut surface = RasterSurface::new(100, 100).unwrap();
        let mut config = DrawingConfig::default();
        config.set_symmetry_segments(2);
        let mut renderer = SymmetryRenderer::new(&surface, &config).unwrap();
        renderer.set_mirror_mode(false);
        let style = StrokeStyle::capture(&config);

        renderer.on_start(&mut surface, StrokePoint::new(70.0, 50.0), &style);
        renderer.on_move(&mut surface, StrokePoint::new(90.0, 50.0));
        // Segment (70,50)-(90,50) and its half-turn copy (30,50)-(10,50).
        assert_eq!(surface.pixel(80, 50).map(|c| c.a), Some(255));
        assert_eq!(surface.pixel(20, 50).map(|c| c.a), Some(255));
        assert_eq!(surface.pixel(50, 50).map(|c| c.a), Some(0));
    }

    #[test]
    fn test_segment_change_redraws_guides() {
        let surface = RasterSurface::new(64, 64).unwrap();
        let mut config = DrawingConfig::default();
        let mut renderer = SymmetryRenderer::new(&surface, &config).unwrap();
        let before = renderer.overlay().unwrap().clone();
        assert!(!before.is_blank());

        config.set_symmetry_segments(3);
        let mut surface = surface;
        renderer.sync_config(&mut surface, &config).unwrap();
        assert_eq!(renderer.segments(), 3);
        assert_ne!(renderer.overlay().unwrap(), &before);

        renderer.toggle_guides();
        assert!(renderer.overlay().unwrap().is_blank());
    }

    #[test]
    fn test_resize_moves_center() {
        let mut surface = RasterSurface::new(40, 40).unwrap();
        let mut renderer = SymmetryRenderer::new(&surface, &DrawingConfig::default()).unwrap();
        surface.resize(80, 60).unwrap();
        renderer.on_resize(&mut surface).unwrap();
        assert_eq!(renderer.center(), Point::new(40.0, 30.0));
        assert_eq!(renderer.overlay().unwrap().width(), 80);
    }

    #[test]
    fn test_kaleidoscope_tiles_first_wedge() {
        let mut surface = RasterSurface::new(40, 40).unwrap();
        let mut config = DrawingConfig::default();
        config.set_symmetry_segments(4);
        let mut renderer = SymmetryRenderer::new(&surface, &config).unwrap();
        renderer.set_mirror_mode(false);

        // A mark in the first quadrant wedge (angle in [0, π/2)).
        surface.set_pixel(30, 25, Rgba::BLACK);
        // A mark outside it disappears.
        surface.set_pixel(5, 5, Rgba::WHITE);
        renderer.apply_kaleidoscope(&mut surface);

        assert_eq!(surface.pixel(30, 25), Some(Rgba::BLACK));
        assert_eq!(surface.pixel(5, 5), Some(Rgba::TRANSPARENT));
        // Quarter-turn copy of (30.5, 25.5) about (20, 20) is (14.5, 30.5).
        assert_eq!(surface.pixel(14, 30), Some(Rgba::BLACK));
    }

    #[test]
    fn test_kaleidoscope_mirror_reflects_across_horizontal() {
        let mut surface = RasterSurface::new(40, 40).unwrap();
        let mut config = DrawingConfig::default();
        config.set_symmetry_segments(4);
        let renderer = SymmetryRenderer::new(&surface, &config).unwrap();
        assert!(renderer.mirror());

        // Just below the first wedge; only its reflection survives.
        surface.set_pixel(30, 15, Rgba::BLACK);
        renderer.apply_kaleidoscope(&mut surface);

        assert_eq!(surface.pixel(30, 24), Some(Rgba::BLACK));
        assert_eq!(surface.pixel(15, 30), Some(Rgba::BLACK));
        assert_eq!(surface.pixel(30, 15), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_animation_does_not_run_after_stop() {
        let mut surface = RasterSurface::new(20, 20).unwrap();
        surface.set_pixel(15, 10, Rgba::BLACK);
        let mut renderer = SymmetryRenderer::new(&surface, &DrawingConfig::default()).unwrap();
        let token = renderer.start_animation(1).unwrap();
        renderer.stop_animation();
        let before = surface.clone();
        assert!(renderer.animation_frame(token, &mut surface).is_none());
        assert_eq!(surface, before);
    }
}
