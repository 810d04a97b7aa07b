//! Freehand brush: smoothed, pressure-sensitive strokes.

use super::{StrokeRenderer, StrokeStyle};
use crate::config::DrawingConfig;
use crate::input::StrokePoint;
use crate::raster::{Paint, RasterSnapshot, RasterSurface, SurfaceError};
use kurbo::{BezPath, PathEl};

/// Narrowest stroke, at zero pressure.
pub const MIN_WIDTH: f64 = 1.0;
/// Widest stroke, whatever the brush size.
pub const MAX_WIDTH: f64 = 50.0;
/// Smoothing used when no brush style is selected.
pub const DEFAULT_SMOOTHING: f64 = 0.5;

/// Stroke width for a pressure reading: interpolates from [`MIN_WIDTH`] to
/// `base` and clamps to `[MIN_WIDTH, MAX_WIDTH]`.
pub fn calculate_width(pressure: f64, base: f64) -> f64 {
    (MIN_WIDTH + (base - MIN_WIDTH) * pressure).clamp(MIN_WIDTH, MAX_WIDTH)
}

/// Pull each interior point toward the midpoint of its neighbours.
///
/// Endpoints are kept as-is; pressure is carried over from the original
/// point. Paths shorter than three points are returned unchanged.
pub fn smooth_path(points: &[StrokePoint], smoothing: f64) -> Vec<StrokePoint> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut smoothed = Vec::with_capacity(points.len());
    smoothed.push(points[0]);
    for window in points.windows(3) {
        let (prev, curr, next) = (window[0], window[1], window[2]);
        let neighbours = prev.position.midpoint(next.position);
        smoothed.push(StrokePoint {
            position: curr.position.lerp(neighbours, smoothing),
            pressure: curr.pressure,
        });
    }
    smoothed.push(points[points.len() - 1]);
    smoothed
}

/// Rasterize a smoothed path as quadratic segments through the midpoints,
/// finishing with a straight tail to the last point.
///
/// Consecutive segments of equal width are stroked as one path so that
/// translucent paint does not double up at the joins.
fn draw_smooth_line(surface: &mut RasterSurface, points: &[StrokePoint], base: f64, paint: &Paint) {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return;
    };
    if points.len() < 2 {
        return;
    }
    let mut segments = Vec::with_capacity(points.len());
    let mut from = first.position;
    for pair in points[1..].windows(2) {
        let (ctrl, next) = (pair[0], pair[1]);
        let mid = ctrl.position.midpoint(next.position);
        let width = calculate_width(ctrl.pressure_or_default(), base);
        segments.push((width, from, PathEl::QuadTo(ctrl.position, mid)));
        from = mid;
    }
    let width = calculate_width(last.pressure_or_default(), base);
    segments.push((width, from, PathEl::LineTo(last.position)));

    for run in segments.chunk_by(|a, b| a.0 == b.0) {
        let (width, start, _) = run[0];
        let mut path = BezPath::new();
        path.move_to(start);
        for (_, _, el) in run {
            path.push(*el);
        }
        surface.stroke_path(&path, width, paint);
    }
}

/// An in-progress freehand stroke.
#[derive(Debug, Clone)]
struct ActiveStroke {
    style: StrokeStyle,
    paint: Paint,
    smoothing: f64,
    points: Vec<StrokePoint>,
    /// Surface content before the stroke; each smoothed redraw starts from it.
    base: RasterSnapshot,
}

impl ActiveStroke {
    fn redraw(&self, surface: &mut RasterSurface) {
        let smoothed = smooth_path(&self.points, self.smoothing);
        surface.restore(&self.base);
        draw_smooth_line(surface, &smoothed, self.style.brush_size, &self.paint);
    }
}

#[derive(Debug, Clone, Default)]
pub struct FreehandRenderer {
    stroke: Option<ActiveStroke>,
}

impl FreehandRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of points in the open stroke.
    pub fn point_count(&self) -> usize {
        self.stroke.as_ref().map_or(0, |s| s.points.len())
    }
}

impl StrokeRenderer for FreehandRenderer {
    fn on_start(&mut self, surface: &mut RasterSurface, point: StrokePoint, style: &StrokeStyle) {
        let mut paint = style.paint();
        if !style.is_eraser() {
            paint = paint.with_blend(style.blend());
        }
        let stroke = ActiveStroke {
            style: *style,
            paint,
            smoothing: style.smoothing(),
            points: vec![point],
            base: surface.snapshot(),
        };
        let width = calculate_width(point.pressure_or_default(), style.brush_size);
        surface.fill_circle(point.position, width / 2.0, &stroke.paint);
        self.stroke = Some(stroke);
    }

    fn on_move(&mut self, surface: &mut RasterSurface, point: StrokePoint) {
        let Some(stroke) = self.stroke.as_mut() else {
            return;
        };
        stroke.points.push(point);
        if stroke.points.len() > 2 {
            stroke.redraw(surface);
        } else {
            let prev = stroke.points[0];
            let pressure = (prev.pressure_or_default() + point.pressure_or_default()) / 2.0;
            let width = calculate_width(pressure, stroke.style.brush_size);
            surface.stroke_line(prev.position, point.position, width, &stroke.paint);
        }
    }

    fn on_end(&mut self, surface: &mut RasterSurface) -> bool {
        let Some(stroke) = self.stroke.take() else {
            return false;
        };
        if stroke.points.len() > 2 {
            stroke.redraw(surface);
        }
        !stroke.points.is_empty()
    }

    fn abandon(&mut self) {
        self.stroke = None;
    }

    fn sync_config(
        &mut self,
        _surface: &mut RasterSurface,
        _config: &DrawingConfig,
    ) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn on_resize(&mut self, _surface: &mut RasterSurface) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn overlay(&self) -> Option<&RasterSurface> {
        None
    }
}
