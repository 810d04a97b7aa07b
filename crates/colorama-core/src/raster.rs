//! Raster surface: a `tiny_skia::Pixmap` plus the painting primitives used
//! by the stroke renderers.
//!
//! The pixmap holds premultiplied RGBA8. Everything that crosses the
//! surface boundary (pixel reads, regions, snapshots) is straight RGBA8, the
//! same layout as a 2D-canvas `ImageData`. The surface knows nothing about
//! history; snapshots are plain immutable copies.

use crate::color::Rgba;
use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::{Affine, BezPath, PathEl, Point, Rect, Shape};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tiny_skia::{
    FillRule, FilterQuality, LineCap, LineJoin, Mask, Pixmap, PixmapPaint,
    PremultipliedColorU8, Stroke, Transform,
};

/// Largest accepted width or height.
pub const MAX_SURFACE_DIMENSION: u32 = 16384;

/// Surface errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("Surface dimensions must be non-zero (got {width}x{height})")]
    Empty { width: u32, height: u32 },
    #[error("Surface dimensions {width}x{height} exceed the {max}px limit")]
    TooLarge { width: u32, height: u32, max: u32 },
    #[error("Pixel data has {actual} bytes, expected {expected}")]
    DataLength { expected: usize, actual: usize },
    #[error("Snapshot decoding failed: {0}")]
    Decode(String),
}

fn validate_dimensions(width: u32, height: u32) -> Result<(), SurfaceError> {
    if width == 0 || height == 0 {
        return Err(SurfaceError::Empty { width, height });
    }
    if width > MAX_SURFACE_DIMENSION || height > MAX_SURFACE_DIMENSION {
        return Err(SurfaceError::TooLarge {
            width,
            height,
            max: MAX_SURFACE_DIMENSION,
        });
    }
    Ok(())
}

fn buffer_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

fn new_pixmap(width: u32, height: u32) -> Result<Pixmap, SurfaceError> {
    validate_dimensions(width, height)?;
    Pixmap::new(width, height).ok_or(SurfaceError::TooLarge {
        width,
        height,
        max: MAX_SURFACE_DIMENSION,
    })
}

/// Pixel compositing operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    /// Normal painting.
    #[default]
    SourceOver,
    /// Erase: removes destination alpha in proportion to source alpha.
    DestinationOut,
    /// Multiply the source color with what is already there.
    Multiply,
}

impl From<BlendMode> for tiny_skia::BlendMode {
    fn from(mode: BlendMode) -> Self {
        match mode {
            BlendMode::SourceOver => tiny_skia::BlendMode::SourceOver,
            BlendMode::DestinationOut => tiny_skia::BlendMode::DestinationOut,
            BlendMode::Multiply => tiny_skia::BlendMode::Multiply,
        }
    }
}

/// Color, opacity and compositing operator for a painting call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Rgba,
    pub opacity: f64,
    pub blend: BlendMode,
}

impl Paint {
    pub fn new(color: Rgba) -> Self {
        Self {
            color,
            opacity: 1.0,
            blend: BlendMode::SourceOver,
        }
    }

    /// An eraser paint that clears alpha at the given strength.
    pub fn eraser(opacity: f64) -> Self {
        Self {
            color: Rgba::BLACK,
            opacity,
            blend: BlendMode::DestinationOut,
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    fn to_skia(self, anti_alias: bool) -> tiny_skia::Paint<'static> {
        let mut color = tiny_skia::Color::from(self.color);
        color.set_alpha((color.alpha() * self.opacity as f32).clamp(0.0, 1.0));
        let mut paint = tiny_skia::Paint {
            anti_alias,
            blend_mode: self.blend.into(),
            ..Default::default()
        };
        paint.set_color(color);
        paint
    }
}

/// How [`RasterSurface::draw_surface`] samples its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sampling {
    /// Exact pixel copies; right for quarter turns and reflections.
    #[default]
    Nearest,
    /// Smooth resampling for arbitrary angles.
    Bilinear,
}

impl From<Sampling> for FilterQuality {
    fn from(sampling: Sampling) -> Self {
        match sampling {
            Sampling::Nearest => FilterQuality::Nearest,
            Sampling::Bilinear => FilterQuality::Bilinear,
        }
    }
}

/// An integer pixel rectangle. May extend past the surface; operations clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The rectangle clipped to a `width × height` surface, as
    /// `(x0, y0, x1, y1)` with exclusive upper bounds.
    fn clip(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + self.width as i64).min(width as i64);
        let y1 = (self.y + self.height as i64).min(height as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(
            self.x as f64,
            self.y as f64,
            (self.x + self.width as i64) as f64,
            (self.y + self.height as i64) as f64,
        )
    }
}

/// A detached block of RGBA pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelRegion {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl PixelRegion {
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some(Rgba::from_slice(&self.data[i..i + 4]))
    }
}

/// Immutable full-frame copy of a surface.
///
/// Cloning shares the pixel data.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EncodedSnapshot", into = "EncodedSnapshot")]
pub struct RasterSnapshot {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl std::fmt::Debug for RasterSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSnapshot")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl RasterSnapshot {
    /// Wrap raw RGBA bytes.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, SurfaceError> {
        validate_dimensions(width, height)?;
        let expected = buffer_len(width, height);
        if pixels.len() != expected {
            return Err(SurfaceError::DataLength {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels: pixels.into(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some(Rgba::from_slice(&self.pixels[i..i + 4]))
    }
}

/// Serialized form of a snapshot: dimensions plus base64 RGBA.
#[derive(Serialize, Deserialize)]
struct EncodedSnapshot {
    width: u32,
    height: u32,
    data: String,
}

impl From<RasterSnapshot> for EncodedSnapshot {
    fn from(snapshot: RasterSnapshot) -> Self {
        Self {
            width: snapshot.width,
            height: snapshot.height,
            data: STANDARD.encode(&snapshot.pixels),
        }
    }
}

impl TryFrom<EncodedSnapshot> for RasterSnapshot {
    type Error = SurfaceError;

    fn try_from(encoded: EncodedSnapshot) -> Result<Self, Self::Error> {
        let pixels = STANDARD
            .decode(encoded.data.as_bytes())
            .map_err(|e| SurfaceError::Decode(e.to_string()))?;
        RasterSnapshot::from_rgba(encoded.width, encoded.height, pixels)
    }
}

fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut builder = tiny_skia::PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => {
                builder.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32)
            }
            PathEl::CurveTo(p1, p2, p3) => builder.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}

fn to_skia_transform(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

/// Paths shorter than this in both directions are stroked as a dot.
const DOT_EPSILON: f64 = 1e-6;

/// A mutable RGBA pixel surface.
#[derive(Clone)]
pub struct RasterSurface {
    pixmap: Pixmap,
}

impl std::fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSurface")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish_non_exhaustive()
    }
}

impl PartialEq for RasterSurface {
    fn eq(&self, other: &Self) -> bool {
        self.width() == other.width()
            && self.height() == other.height()
            && self.pixmap.data() == other.pixmap.data()
    }
}

impl Eq for RasterSurface {}

impl RasterSurface {
    /// Create a fully transparent surface.
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        Ok(Self {
            pixmap: new_pixmap(width, height)?,
        })
    }

    /// Create a surface holding a copy of `snapshot`.
    pub fn from_snapshot(snapshot: &RasterSnapshot) -> Result<Self, SurfaceError> {
        let mut surface = Self::new(snapshot.width, snapshot.height)?;
        surface.put_rgba(0, 0, snapshot.width, snapshot.height, &snapshot.pixels);
        Ok(surface)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width() as usize + x as usize
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        self.pixmap.pixel(x, y).map(Rgba::from)
    }

    /// Replace one pixel. Out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if x >= self.width() || y >= self.height() {
            return;
        }
        let i = self.index(x, y);
        self.pixmap.pixels_mut()[i] = color.into();
    }

    /// Copy out a rectangle. Parts outside the surface read as transparent.
    pub fn get_region(&self, rect: PixelRect) -> PixelRegion {
        let mut data = vec![0; buffer_len(rect.width, rect.height)];
        if let Some((x0, y0, x1, y1)) = rect.clip(self.width(), self.height()) {
            let pixels = self.pixmap.pixels();
            for y in y0..y1 {
                for x in x0..x1 {
                    let dst_x = (x as i64 - rect.x) as usize;
                    let dst_y = (y as i64 - rect.y) as usize;
                    let dst = (dst_y * rect.width as usize + dst_x) * 4;
                    let color = Rgba::from(pixels[self.index(x, y)]);
                    data[dst..dst + 4].copy_from_slice(&color.to_array());
                }
            }
        }
        PixelRegion {
            width: rect.width,
            height: rect.height,
            data,
        }
    }

    /// Write `region` with its top-left at `(x, y)`, replacing pixels
    /// (no blending). Clipped to the surface.
    pub fn put_region(&mut self, x: i64, y: i64, region: &PixelRegion) {
        self.put_rgba(x, y, region.width, region.height, &region.data);
    }

    fn put_rgba(&mut self, x: i64, y: i64, width: u32, height: u32, data: &[u8]) {
        let target = PixelRect::new(x, y, width, height);
        let Some((x0, y0, x1, y1)) = target.clip(self.width(), self.height()) else {
            return;
        };
        for row in y0..y1 {
            for col in x0..x1 {
                let src_x = (col as i64 - x) as usize;
                let src_y = (row as i64 - y) as usize;
                let src = (src_y * width as usize + src_x) * 4;
                let dst = self.index(col, row);
                let color: PremultipliedColorU8 = Rgba::from_slice(&data[src..src + 4]).into();
                self.pixmap.pixels_mut()[dst] = color;
            }
        }
    }

    /// Clear a rectangle to transparent.
    pub fn clear(&mut self, rect: PixelRect) {
        let r = rect.to_rect();
        let Some(rect) =
            tiny_skia::Rect::from_ltrb(r.x0 as f32, r.y0 as f32, r.x1 as f32, r.y1 as f32)
        else {
            return;
        };
        let paint = tiny_skia::Paint {
            blend_mode: tiny_skia::BlendMode::Clear,
            anti_alias: false,
            ..Default::default()
        };
        self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }

    /// Clear the whole surface to transparent.
    pub fn clear_all(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    /// Resize, keeping existing pixels at the same coordinates. New area is
    /// transparent; area outside the new bounds is dropped.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        validate_dimensions(width, height)?;
        if width == self.width() && height == self.height() {
            return Ok(());
        }
        let mut pixmap = new_pixmap(width, height)?;
        let copy = PixmapPaint {
            blend_mode: tiny_skia::BlendMode::Source,
            ..PixmapPaint::default()
        };
        pixmap.draw_pixmap(0, 0, self.pixmap.as_ref(), &copy, Transform::identity(), None);
        self.pixmap = pixmap;
        Ok(())
    }

    /// Take an immutable copy of the whole surface.
    pub fn snapshot(&self) -> RasterSnapshot {
        let pixels: Vec<u8> = self
            .pixmap
            .pixels()
            .iter()
            .flat_map(|p| Rgba::from(*p).to_array())
            .collect();
        RasterSnapshot {
            width: self.width(),
            height: self.height(),
            pixels: pixels.into(),
        }
    }

    /// Replace the content with `snapshot`, anchored at the origin.
    ///
    /// The surface keeps its dimensions: the snapshot is clipped and any
    /// uncovered area is cleared.
    pub fn restore(&mut self, snapshot: &RasterSnapshot) {
        self.clear_all();
        self.put_rgba(0, 0, snapshot.width, snapshot.height, &snapshot.pixels);
    }

    /// Fill the pixels whose centers lie inside `rect`.
    pub fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        let r = rect.abs();
        let Some(rect) =
            tiny_skia::Rect::from_ltrb(r.x0 as f32, r.y0 as f32, r.x1 as f32, r.y1 as f32)
        else {
            return;
        };
        self.pixmap
            .fill_rect(rect, &paint.to_skia(false), Transform::identity(), None);
    }

    /// Fill a disc.
    pub fn fill_circle(&mut self, center: Point, radius: f64, paint: &Paint) {
        let Some(path) =
            tiny_skia::PathBuilder::from_circle(center.x as f32, center.y as f32, radius as f32)
        else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &paint.to_skia(true),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    /// Fill a path with the non-zero winding rule. Overlapping subpaths are
    /// painted once.
    pub fn fill_path(&mut self, path: &BezPath, paint: &Paint) {
        let Some(path) = to_skia_path(path) else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &paint.to_skia(true),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    /// Stroke a path with round caps and joins.
    ///
    /// The path is painted as one shape, so self-overlaps and joins do not
    /// double up translucent paint. A zero-length path paints a dot.
    pub fn stroke_path(&mut self, path: &BezPath, width: f64, paint: &Paint) {
        if width.is_nan() || width <= 0.0 {
            return;
        }
        let bounds = path.bounding_box();
        if bounds.width() < DOT_EPSILON && bounds.height() < DOT_EPSILON {
            if let Some(PathEl::MoveTo(p)) = path.elements().first() {
                self.fill_circle(*p, width / 2.0, paint);
            }
            return;
        }
        let Some(path) = to_skia_path(path) else {
            return;
        };
        let stroke = Stroke {
            width: width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        self.pixmap.stroke_path(
            &path,
            &paint.to_skia(true),
            &stroke,
            Transform::identity(),
            None,
        );
    }

    /// Stroke a straight segment with round caps.
    pub fn stroke_line(&mut self, from: Point, to: Point, width: f64, paint: &Paint) {
        self.stroke_polyline(&[from, to], width, paint);
    }

    /// Stroke a quadratic Bézier curve with round caps.
    pub fn stroke_quad(&mut self, from: Point, ctrl: Point, to: Point, width: f64, paint: &Paint) {
        let mut path = BezPath::new();
        path.move_to(from);
        path.quad_to(ctrl, to);
        self.stroke_path(&path, width, paint);
    }

    /// Stroke a connected polyline with round caps and joins. A single
    /// point paints a dot.
    pub fn stroke_polyline(&mut self, points: &[Point], width: f64, paint: &Paint) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        let mut path = BezPath::new();
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
        self.stroke_path(&path, width, paint);
    }

    /// Stroke a circle outline.
    pub fn stroke_circle(&mut self, center: Point, radius: f64, line_width: f64, paint: &Paint) {
        let circle = kurbo::Circle::new(center, radius.max(0.0));
        self.stroke_path(&circle.to_path(0.1), line_width, paint);
    }

    /// Composite `overlay` over this surface (source-over), top-left aligned.
    pub fn composite_over(&mut self, overlay: &RasterSurface) {
        self.pixmap.draw_pixmap(
            0,
            0,
            overlay.pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Composite `source` over this surface after mapping it through
    /// `transform`. With a `clip`, only pixels inside the path (non-zero
    /// winding, hard edges) are touched; an empty clip touches nothing.
    pub fn draw_surface(
        &mut self,
        source: &RasterSurface,
        transform: Affine,
        sampling: Sampling,
        clip: Option<&BezPath>,
    ) {
        let mask = match clip {
            Some(path) => match self.clip_mask(path) {
                Some(mask) => Some(mask),
                None => return,
            },
            None => None,
        };
        let paint = PixmapPaint {
            quality: sampling.into(),
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            source.pixmap.as_ref(),
            &paint,
            to_skia_transform(transform),
            mask.as_ref(),
        );
    }

    fn clip_mask(&self, path: &BezPath) -> Option<Mask> {
        let path = to_skia_path(path)?;
        let mut mask = Mask::new(self.width(), self.height())?;
        mask.fill_path(&path, FillRule::Winding, false, Transform::identity());
        Some(mask)
    }

    /// Whether every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.pixmap.pixels().iter().all(|p| p.alpha() == 0)
    }
}
