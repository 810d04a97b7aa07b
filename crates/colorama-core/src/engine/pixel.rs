//! Pixel-art renderer: grid-quantized painting with line interpolation and
//! flood fill.

use super::{StrokeRenderer, StrokeStyle};
use crate::color::Rgba;
use crate::config::{DrawingConfig, Tool};
use crate::input::StrokePoint;
use crate::raster::{Paint, PixelRect, RasterSurface, SurfaceError};
use kurbo::{BezPath, Rect, Shape};

/// A grid cell, in cell coordinates.
pub type Cell = (i64, i64);

/// Grid line color on the overlay (grey at 30% alpha).
const GRID_LINE: Rgba = Rgba::new(128, 128, 128, 77);

/// Cells on the 8-connected Bresenham line from `from` to `to`, inclusive.
pub fn line_cells(from: Cell, to: Cell) -> Vec<Cell> {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = (to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx - dy;
    let mut cells = Vec::with_capacity((dx.max(dy) + 1) as usize);

    loop {
        cells.push((x, y));
        if (x, y) == to {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }
    cells
}

#[derive(Debug, Clone)]
struct PixelStroke {
    style: StrokeStyle,
    last_cell: Option<Cell>,
    /// Set for fill gestures: whether the fill changed anything.
    filled: Option<bool>,
}

/// Grid renderer. The main surface is kept square at `cell_size * grid_size`.
#[derive(Debug, Clone)]
pub struct PixelRenderer {
    grid_size: u32,
    cell_size: u32,
    grid_enabled: bool,
    overlay: RasterSurface,
    stroke: Option<PixelStroke>,
}

impl PixelRenderer {
    /// Attach to `surface`, snapping it to the configured grid.
    pub fn new(surface: &mut RasterSurface, config: &DrawingConfig) -> Result<Self, SurfaceError> {
        let mut renderer = Self {
            grid_size: 0,
            cell_size: 1,
            grid_enabled: config.grid_enabled,
            overlay: RasterSurface::new(surface.width(), surface.height())?,
            stroke: None,
        };
        renderer.apply_grid(surface, config.grid_size())?;
        Ok(renderer)
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn grid_enabled(&self) -> bool {
        self.grid_enabled
    }

    /// Recompute the cell size for `requested` cells per side and snap the
    /// surface (and overlay) to an exact multiple of it.
    fn apply_grid(&mut self, surface: &mut RasterSurface, requested: u32) -> Result<(), SurfaceError> {
        let grid_size = requested.clamp(1, surface.width());
        let cell_size = surface.width() / grid_size;
        let side = cell_size * grid_size;
        if side != surface.width() || side != surface.height() {
            log::debug!(
                "Snapping surface {}x{} to {}x{} for a {} cell grid",
                surface.width(),
                surface.height(),
                side,
                side,
                grid_size
            );
            surface.resize(side, side)?;
        }
        self.grid_size = grid_size;
        self.cell_size = cell_size;
        if self.overlay.width() != side || self.overlay.height() != side {
            self.overlay = RasterSurface::new(side, side)?;
        }
        self.draw_grid();
        Ok(())
    }

    /// Redraw the grid overlay, or clear it when the grid is off.
    fn draw_grid(&mut self) {
        self.overlay.clear_all();
        if !self.grid_enabled {
            return;
        }
        let (w, h) = (self.overlay.width(), self.overlay.height());
        // One path for every line so crossings are painted once.
        let mut lines = BezPath::new();
        for i in 0..=self.grid_size {
            let at = (i * self.cell_size).min(w.saturating_sub(1)) as f64;
            lines.extend(Rect::new(at, 0.0, at + 1.0, h as f64).path_elements(0.1));
            let at = (i * self.cell_size).min(h.saturating_sub(1)) as f64;
            lines.extend(Rect::new(0.0, at, w as f64, at + 1.0).path_elements(0.1));
        }
        self.overlay.fill_path(&lines, &Paint::new(GRID_LINE));
    }

    /// The cell under a canvas-local point.
    pub fn cell_at(&self, point: StrokePoint) -> Cell {
        let size = self.cell_size as f64;
        (
            (point.position.x / size).floor() as i64,
            (point.position.y / size).floor() as i64,
        )
    }

    fn in_grid(&self, (x, y): Cell) -> bool {
        let n = self.grid_size as i64;
        (0..n).contains(&x) && (0..n).contains(&y)
    }

    fn cell_rect(&self, (x, y): Cell) -> PixelRect {
        let size = self.cell_size as i64;
        PixelRect::new(x * size, y * size, self.cell_size, self.cell_size)
    }

    fn paint_cell(&self, surface: &mut RasterSurface, cell: Cell, style: &StrokeStyle) {
        if !self.in_grid(cell) {
            return;
        }
        let rect = self.cell_rect(cell);
        if style.is_eraser() {
            surface.clear(rect);
        } else {
            surface.fill_rect(rect.to_rect(), &style.paint());
        }
    }

    /// Color of a cell, sampled at its top-left pixel.
    fn cell_color(&self, surface: &RasterSurface, (x, y): Cell) -> Option<Rgba> {
        surface.pixel(x as u32 * self.cell_size, y as u32 * self.cell_size)
    }

    /// Flood-fill the 4-connected region of same-colored cells under `point`.
    ///
    /// Colors are compared against the surface as it was before the fill.
    /// Returns `false` when the point is off the grid, the region already
    /// has the fill color, or painting left every cell unchanged (a fully
    /// transparent fill).
    pub fn fill_at(&self, surface: &mut RasterSurface, point: StrokePoint, style: &StrokeStyle) -> bool {
        let origin = self.cell_at(point);
        if !self.in_grid(origin) {
            return false;
        }
        let before = surface.clone();
        let Some(target) = self.cell_color(&before, origin) else {
            return false;
        };
        if target == style.color {
            return false;
        }

        let n = self.grid_size as usize;
        let mut visited = vec![false; n * n];
        let mut stack = vec![origin];
        let mut painted = 0usize;
        while let Some(cell) = stack.pop() {
            if !self.in_grid(cell) {
                continue;
            }
            let index = cell.1 as usize * n + cell.0 as usize;
            if visited[index] {
                continue;
            }
            visited[index] = true;
            if self.cell_color(&before, cell) != Some(target) {
                continue;
            }
            self.paint_cell(surface, cell, style);
            if self.cell_color(surface, cell) != Some(target) {
                painted += 1;
            }
            let (x, y) = cell;
            stack.extend([(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)]);
        }
        log::debug!("Flood fill painted {} cells", painted);
        painted > 0
    }
}

impl StrokeRenderer for PixelRenderer {
    fn on_start(&mut self, surface: &mut RasterSurface, point: StrokePoint, style: &StrokeStyle) {
        if style.tool == Tool::Fill {
            let filled = self.fill_at(surface, point, style);
            self.stroke = Some(PixelStroke {
                style: *style,
                last_cell: None,
                filled: Some(filled),
            });
            return;
        }
        let cell = self.cell_at(point);
        self.paint_cell(surface, cell, style);
        self.stroke = Some(PixelStroke {
            style: *style,
            last_cell: Some(cell),
            filled: None,
        });
    }

    fn on_move(&mut self, surface: &mut RasterSurface, point: StrokePoint) {
        let cell = self.cell_at(point);
        let Some(stroke) = self.stroke.as_mut() else {
            return;
        };
        let Some(last) = stroke.last_cell else {
            return;
        };
        if last == cell {
            return;
        }
        stroke.last_cell = Some(cell);
        let style = stroke.style;
        for c in line_cells(last, cell) {
            self.paint_cell(surface, c, &style);
        }
    }

    fn on_end(&mut self, _surface: &mut RasterSurface) -> bool {
        match self.stroke.take() {
            Some(PixelStroke {
                filled: Some(filled),
                ..
            }) => filled,
            Some(_) => true,
            None => false,
        }
    }

    fn abandon(&mut self) {
        self.stroke = None;
    }

    fn sync_config(
        &mut self,
        surface: &mut RasterSurface,
        config: &DrawingConfig,
    ) -> Result<(), SurfaceError> {
        let requested = config.grid_size().min(surface.width());
        if requested != self.grid_size {
            self.grid_enabled = config.grid_enabled;
            self.apply_grid(surface, requested)?;
        } else if config.grid_enabled != self.grid_enabled {
            self.grid_enabled = config.grid_enabled;
            self.draw_grid();
        }
        Ok(())
    }

    fn on_resize(&mut self, surface: &mut RasterSurface) -> Result<(), SurfaceError> {
        let grid_size = self.grid_size;
        self.apply_grid(surface, grid_size)
    }

    fn overlay(&self) -> Option<&RasterSurface> {
        Some(&self.overlay)
    }
}
