//! The drawing engine: one raster surface, one undo history, one input
//! state machine and the renderer for the current drawing mode.

pub mod animation;
pub mod freehand;
pub mod pixel;
pub mod symmetry;

pub use animation::{DEFAULT_ROTATION_SPEED, FrameToken, RotationAnimation};
pub use freehand::FreehandRenderer;
pub use pixel::PixelRenderer;
pub use symmetry::SymmetryRenderer;

use crate::color::Rgba;
use crate::config::{BrushStyle, DrawingConfig, DrawingMode, Tool};
use crate::history::{DEFAULT_HISTORY_CAPACITY, History};
use crate::input::{InputEvent, StrokeCommand, StrokeInput, StrokePoint};
use crate::raster::{BlendMode, Paint, RasterSnapshot, RasterSurface, SurfaceError};
use kurbo::Point;
use thiserror::Error;

/// Engine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Something the host may want to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// A stroke ended and was recorded in history.
    StrokeCommitted,
    /// A flood fill changed the surface and was recorded in history.
    Filled,
    /// The color picker sampled a pixel.
    ColorPicked(Rgba),
    /// Undo, redo, clear or an effect replaced the surface content.
    HistoryChanged,
}

/// Visual parameters frozen at stroke start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub tool: Tool,
    pub color: Rgba,
    pub opacity: f64,
    pub brush_size: f64,
    pub brush_style: Option<BrushStyle>,
}

impl StrokeStyle {
    pub fn capture(config: &DrawingConfig) -> Self {
        Self {
            tool: config.tool,
            color: config.color,
            opacity: config.opacity(),
            brush_size: config.brush_size(),
            brush_style: config.brush_style,
        }
    }

    pub fn is_eraser(&self) -> bool {
        self.tool == Tool::Eraser
    }

    /// Plain paint for this stroke: normal compositing, or an eraser.
    pub fn paint(&self) -> Paint {
        if self.is_eraser() {
            Paint::eraser(self.opacity)
        } else {
            Paint::new(self.color).with_opacity(self.opacity)
        }
    }

    pub fn smoothing(&self) -> f64 {
        self.brush_style
            .map_or(freehand::DEFAULT_SMOOTHING, BrushStyle::smoothing)
    }

    pub fn blend(&self) -> BlendMode {
        self.brush_style.map_or(BlendMode::SourceOver, BrushStyle::blend)
    }
}

/// Per-mode stroke strategy.
///
/// Renderers rasterize straight into the surface they are given and never
/// touch history; the engine records a snapshot when [`on_end`] reports a
/// change.
///
/// [`on_end`]: StrokeRenderer::on_end
pub trait StrokeRenderer {
    fn on_start(&mut self, surface: &mut RasterSurface, point: StrokePoint, style: &StrokeStyle);
    fn on_move(&mut self, surface: &mut RasterSurface, point: StrokePoint);
    /// Close the stroke. Returns whether it produced something worth recording.
    fn on_end(&mut self, surface: &mut RasterSurface) -> bool;
    /// Drop the open stroke without finishing it.
    fn abandon(&mut self);
    /// Apply grid / segment settings that affect geometry.
    fn sync_config(
        &mut self,
        surface: &mut RasterSurface,
        config: &DrawingConfig,
    ) -> Result<(), SurfaceError>;
    fn on_resize(&mut self, surface: &mut RasterSurface) -> Result<(), SurfaceError>;
    /// Display-only layer (grid, guides).
    fn overlay(&self) -> Option<&RasterSurface>;
}

/// The renderer for the current mode.
#[derive(Debug, Clone)]
pub enum Renderer {
    Freehand(FreehandRenderer),
    Pixel(PixelRenderer),
    Symmetry(SymmetryRenderer),
}

impl Renderer {
    pub fn for_mode(
        mode: DrawingMode,
        surface: &mut RasterSurface,
        config: &DrawingConfig,
    ) -> Result<Self, SurfaceError> {
        Ok(match mode {
            DrawingMode::Draw => Renderer::Freehand(FreehandRenderer::new()),
            DrawingMode::Pixel => Renderer::Pixel(PixelRenderer::new(surface, config)?),
            DrawingMode::Mandala => Renderer::Symmetry(SymmetryRenderer::new(surface, config)?),
        })
    }

}

/// Forward a call to the active variant without going through a vtable.
macro_rules! dispatch {
    ($renderer:expr, $r:ident => $call:expr) => {
        match $renderer {
            Renderer::Freehand($r) => $call,
            Renderer::Pixel($r) => $call,
            Renderer::Symmetry($r) => $call,
        }
    };
}

impl StrokeRenderer for Renderer {
    fn on_start(&mut self, surface: &mut RasterSurface, point: StrokePoint, style: &StrokeStyle) {
        dispatch!(self, r => r.on_start(surface, point, style))
    }

    fn on_move(&mut self, surface: &mut RasterSurface, point: StrokePoint) {
        dispatch!(self, r => r.on_move(surface, point))
    }

    fn on_end(&mut self, surface: &mut RasterSurface) -> bool {
        dispatch!(self, r => r.on_end(surface))
    }

    fn abandon(&mut self) {
        dispatch!(self, r => r.abandon())
    }

    fn sync_config(
        &mut self,
        surface: &mut RasterSurface,
        config: &DrawingConfig,
    ) -> Result<(), SurfaceError> {
        dispatch!(self, r => r.sync_config(surface, config))
    }

    fn on_resize(&mut self, surface: &mut RasterSurface) -> Result<(), SurfaceError> {
        dispatch!(self, r => r.on_resize(surface))
    }

    fn overlay(&self) -> Option<&RasterSurface> {
        dispatch!(self, r => r.overlay())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Stroke(StrokeStyle),
    Pick,
}

/// Owns the canvas and everything that mutates it.
#[derive(Debug, Clone)]
pub struct DrawingEngine {
    surface: RasterSurface,
    history: History,
    input: StrokeInput,
    renderer: Renderer,
    mode: DrawingMode,
    /// Bumped whenever the renderer is replaced.
    generation: u64,
    gesture: Gesture,
}

impl DrawingEngine {
    /// Create an engine over a blank surface. The blank state is recorded as
    /// the first history entry.
    pub fn new(
        width: u32,
        height: u32,
        mode: DrawingMode,
        config: &DrawingConfig,
    ) -> EngineResult<Self> {
        Self::with_history_capacity(width, height, mode, config, DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_history_capacity(
        width: u32,
        height: u32,
        mode: DrawingMode,
        config: &DrawingConfig,
        capacity: usize,
    ) -> EngineResult<Self> {
        let mut surface = RasterSurface::new(width, height)?;
        let renderer = Renderer::for_mode(mode, &mut surface, config)?;
        let mut history = History::new(capacity);
        history.record(surface.snapshot());
        log::debug!(
            "Drawing engine ready: {}x{} in {} mode",
            surface.width(),
            surface.height(),
            mode.name()
        );
        Ok(Self {
            surface,
            history,
            input: StrokeInput::default(),
            renderer,
            mode,
            generation: 0,
            gesture: Gesture::Idle,
        })
    }

    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn input(&self) -> &StrokeInput {
        &self.input
    }

    /// Input settings (canvas origin, pointer availability).
    pub fn input_mut(&mut self) -> &mut StrokeInput {
        &mut self.input
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn mode(&self) -> DrawingMode {
        self.mode
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_drawing(&self) -> bool {
        !matches!(self.gesture, Gesture::Idle)
    }

    /// Feed one raw input event.
    ///
    /// Usually yields at most one event. A device-down while a stroke is
    /// open yields the commit of the old stroke followed by whatever the new
    /// gesture reports.
    pub fn handle_input(&mut self, event: InputEvent, config: &DrawingConfig) -> Vec<EngineEvent> {
        let Some(command) = self.input.handle(&event) else {
            return Vec::new();
        };
        match command {
            StrokeCommand::Start(point) => self.begin_gesture(point, config).into_iter().collect(),
            StrokeCommand::Move(point) => {
                if let Gesture::Stroke(_) = self.gesture {
                    self.renderer.on_move(&mut self.surface, point);
                }
                Vec::new()
            }
            StrokeCommand::End => self.end_gesture().into_iter().collect(),
            StrokeCommand::Restart(point) => {
                let ended = self.end_gesture();
                let started = self.begin_gesture(point, config);
                ended.into_iter().chain(started).collect()
            }
        }
    }

    fn begin_gesture(&mut self, point: StrokePoint, config: &DrawingConfig) -> Option<EngineEvent> {
        if config.tool == Tool::ColorPicker {
            self.gesture = Gesture::Pick;
            return self.pick_color(point.position).map(EngineEvent::ColorPicked);
        }
        if let Err(e) = self.renderer.sync_config(&mut self.surface, config) {
            log::warn!("Failed to apply drawing settings: {}", e);
        }
        let style = StrokeStyle::capture(config);
        self.renderer.on_start(&mut self.surface, point, &style);
        self.gesture = Gesture::Stroke(style);
        None
    }

    fn end_gesture(&mut self) -> Option<EngineEvent> {
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Stroke(style) => {
                if !self.renderer.on_end(&mut self.surface) {
                    return None;
                }
                self.history.record(self.surface.snapshot());
                if style.tool == Tool::Fill && self.mode == DrawingMode::Pixel {
                    Some(EngineEvent::Filled)
                } else {
                    Some(EngineEvent::StrokeCommitted)
                }
            }
            Gesture::Pick | Gesture::Idle => None,
        }
    }

    /// Close any open stroke without recording it.
    fn cancel_gesture(&mut self) {
        self.input.abandon();
        self.renderer.abandon();
        self.gesture = Gesture::Idle;
    }

    /// Color of the surface pixel under a canvas-local point.
    pub fn pick_color(&self, point: Point) -> Option<Rgba> {
        if point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        self.surface.pixel(point.x.floor() as u32, point.y.floor() as u32)
    }

    /// Switch drawing mode. An open stroke is abandoned; whatever it already
    /// rasterized stays on the surface.
    pub fn set_mode(&mut self, mode: DrawingMode, config: &DrawingConfig) -> EngineResult<()> {
        self.cancel_gesture();
        self.stop_animation();
        let renderer = Renderer::for_mode(mode, &mut self.surface, config)?;
        self.renderer = renderer;
        self.mode = mode;
        self.generation += 1;
        log::debug!("Switched to {} mode (generation {})", mode.name(), self.generation);
        Ok(())
    }

    /// Apply grid size, grid visibility and segment count.
    pub fn sync_config(&mut self, config: &DrawingConfig) -> EngineResult<()> {
        self.renderer.sync_config(&mut self.surface, config)?;
        Ok(())
    }

    pub fn undo(&mut self) -> Option<EngineEvent> {
        self.cancel_gesture();
        let snapshot = self.history.undo()?;
        self.surface.restore(snapshot);
        Some(EngineEvent::HistoryChanged)
    }

    pub fn redo(&mut self) -> Option<EngineEvent> {
        self.cancel_gesture();
        let snapshot = self.history.redo()?;
        self.surface.restore(snapshot);
        Some(EngineEvent::HistoryChanged)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Clear the canvas. Recorded, so it can be undone.
    pub fn clear(&mut self) -> EngineEvent {
        self.cancel_gesture();
        self.surface.clear_all();
        self.history.record(self.surface.snapshot());
        EngineEvent::HistoryChanged
    }

    /// Resize the canvas, keeping existing pixels. Pixel mode re-snaps the
    /// result to its grid.
    pub fn resize(&mut self, width: u32, height: u32) -> EngineResult<()> {
        self.surface.resize(width, height)?;
        self.renderer.on_resize(&mut self.surface)?;
        Ok(())
    }

    pub fn capture_snapshot(&self) -> RasterSnapshot {
        self.surface.snapshot()
    }

    /// Load a snapshot as the new canvas: the surface takes its dimensions
    /// and history restarts from it.
    pub fn restore_snapshot(&mut self, snapshot: &RasterSnapshot) -> EngineResult<()> {
        self.cancel_gesture();
        self.surface = RasterSurface::from_snapshot(snapshot)?;
        self.renderer.on_resize(&mut self.surface)?;
        self.history.reset(self.surface.snapshot());
        Ok(())
    }

    /// Flood-fill from a canvas-local point with the configured color.
    /// Pixel mode only; a fill that changes nothing records nothing.
    pub fn fill_area(&mut self, point: Point, config: &DrawingConfig) -> Option<EngineEvent> {
        let Renderer::Pixel(renderer) = &self.renderer else {
            return None;
        };
        let mut style = StrokeStyle::capture(config);
        style.tool = Tool::Fill;
        let target = StrokePoint {
            position: point,
            pressure: None,
        };
        if !renderer.fill_at(&mut self.surface, target, &style) {
            return None;
        }
        self.history.record(self.surface.snapshot());
        Some(EngineEvent::Filled)
    }

    /// Tile the first symmetry wedge around the canvas. Mandala mode only.
    pub fn apply_kaleidoscope(&mut self) -> Option<EngineEvent> {
        let Renderer::Symmetry(renderer) = &self.renderer else {
            return None;
        };
        renderer.apply_kaleidoscope(&mut self.surface);
        self.history.record(self.surface.snapshot());
        Some(EngineEvent::HistoryChanged)
    }

    pub fn set_mirror_mode(&mut self, mirror: bool) {
        if let Renderer::Symmetry(renderer) = &mut self.renderer {
            renderer.set_mirror_mode(mirror);
        }
    }

    pub fn toggle_guides(&mut self) {
        if let Renderer::Symmetry(renderer) = &mut self.renderer {
            renderer.toggle_guides();
        }
    }

    pub fn set_rotation_speed(&mut self, speed: f64) {
        if let Renderer::Symmetry(renderer) = &mut self.renderer {
            renderer.set_rotation_speed(speed);
        }
    }

    /// Start the mandala rotation. Returns the token for the first frame.
    pub fn start_animation(&mut self) -> Option<FrameToken> {
        let generation = self.generation;
        match &mut self.renderer {
            Renderer::Symmetry(renderer) => renderer.start_animation(generation),
            _ => None,
        }
    }

    pub fn stop_animation(&mut self) -> bool {
        match &mut self.renderer {
            Renderer::Symmetry(renderer) => renderer.stop_animation(),
            _ => false,
        }
    }

    /// Run one animation frame. Frames from an earlier renderer, or after
    /// [`stop_animation`](Self::stop_animation), do nothing.
    pub fn animation_frame(&mut self, token: FrameToken) -> Option<FrameToken> {
        if token.generation() != self.generation {
            return None;
        }
        match &mut self.renderer {
            Renderer::Symmetry(renderer) => renderer.animation_frame(token, &mut self.surface),
            _ => None,
        }
    }

    pub fn overlay(&self) -> Option<&RasterSurface> {
        self.renderer.overlay()
    }

    /// The surface with the overlay composited on top, for display.
    pub fn display_frame(&self) -> RasterSurface {
        let mut frame = self.surface.clone();
        if let Some(overlay) = self.renderer.overlay() {
            frame.composite_over(overlay);
        }
        frame
    }
}
