//! Colorama Core Library
//!
//! The drawing engine behind Colorama: a raster surface, an input state
//! machine, freehand / pixel / symmetry stroke renderers, bounded undo
//! history and project storage.

pub mod color;
pub mod config;
pub mod engine;
pub mod history;
pub mod input;
pub mod palette;
pub mod raster;
pub mod storage;

pub use color::Rgba;
pub use config::{BrushStyle, DrawingConfig, DrawingMode, Tool};
pub use engine::{DrawingEngine, EngineError, EngineEvent, FrameToken, StrokeRenderer, StrokeStyle};
pub use history::{DEFAULT_HISTORY_CAPACITY, History};
pub use input::{InputEvent, InputPhase, InputSource, Modifiers, StrokeCommand, StrokeInput, StrokePoint};
pub use palette::{PALETTES, Palette, palette_by_name};
pub use raster::{
    BlendMode, Paint, PixelRect, PixelRegion, RasterSnapshot, RasterSurface, Sampling, SurfaceError,
};
pub use storage::{AutoSaveManager, FileStorage, MemoryStorage, ProjectRecord, ProjectSummary, Storage, StorageError};
