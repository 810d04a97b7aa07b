//! Drawing configuration shared by every stroke renderer.
//!
//! The configuration is owned by the host (UI) and handed to the engine by
//! reference on every call. Numeric settings are clamped on write and on
//! read, so a deserialized or hand-edited value can never produce invalid
//! geometry.

use crate::color::Rgba;
use crate::raster::BlendMode;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Valid brush sizes in pixels.
pub const BRUSH_SIZE_RANGE: RangeInclusive<f64> = 1.0..=50.0;
/// Valid grid sizes (cells per side) for pixel mode.
pub const GRID_SIZE_RANGE: RangeInclusive<u32> = 1..=256;
/// Valid segment counts for mandala mode.
pub const SEGMENT_RANGE: RangeInclusive<u32> = 1..=64;

/// The three drawing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawingMode {
    #[default]
    Pixel,
    Draw,
    Mandala,
}

impl DrawingMode {
    pub fn name(self) -> &'static str {
        match self {
            DrawingMode::Pixel => "pixel",
            DrawingMode::Draw => "draw",
            DrawingMode::Mandala => "mandala",
        }
    }
}

/// Tool selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tool {
    #[default]
    Brush,
    Eraser,
    Fill,
    ColorPicker,
}

/// Freehand brush presets.
///
/// Presets only change the smoothing factor and the compositing operator.
/// Airbrush and calligraphy paint with the normal operator and no special
/// dab shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushStyle {
    Pencil,
    Marker,
    Airbrush,
    Calligraphy,
}

impl BrushStyle {
    pub fn smoothing(self) -> f64 {
        match self {
            BrushStyle::Pencil => 0.3,
            BrushStyle::Marker => 0.5,
            BrushStyle::Airbrush => 0.7,
            BrushStyle::Calligraphy => 0.4,
        }
    }

    pub fn blend(self) -> BlendMode {
        match self {
            BrushStyle::Marker => BlendMode::Multiply,
            BrushStyle::Pencil | BrushStyle::Airbrush | BrushStyle::Calligraphy => {
                BlendMode::SourceOver
            }
        }
    }
}

/// Current drawing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DrawingConfig {
    pub tool: Tool,
    pub color: Rgba,
    brush_size: f64,
    opacity: f64,
    pub grid_enabled: bool,
    grid_size: u32,
    symmetry_segments: u32,
    /// `None` keeps the freehand defaults (smoothing 0.5, normal operator).
    pub brush_style: Option<BrushStyle>,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            tool: Tool::Brush,
            color: Rgba::BLACK,
            brush_size: 5.0,
            opacity: 1.0,
            grid_enabled: true,
            grid_size: 16,
            symmetry_segments: 8,
            brush_style: None,
        }
    }
}

fn clamp_f64(value: f64, range: &RangeInclusive<f64>, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(*range.start(), *range.end())
    }
}

impl DrawingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn set_color(&mut self, color: Rgba) {
        self.color = color;
    }

    /// Set the color from user input; malformed input becomes black.
    pub fn set_color_hex(&mut self, hex: &str) {
        self.color = Rgba::parse_or_default(hex);
    }

    pub fn brush_size(&self) -> f64 {
        clamp_f64(self.brush_size, &BRUSH_SIZE_RANGE, *BRUSH_SIZE_RANGE.start())
    }

    pub fn set_brush_size(&mut self, size: f64) {
        self.brush_size = clamp_f64(size, &BRUSH_SIZE_RANGE, *BRUSH_SIZE_RANGE.start());
    }

    pub fn opacity(&self) -> f64 {
        clamp_f64(self.opacity, &(0.0..=1.0), 1.0)
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = clamp_f64(opacity, &(0.0..=1.0), 1.0);
    }

    pub fn toggle_grid(&mut self) {
        self.grid_enabled = !self.grid_enabled;
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
            .clamp(*GRID_SIZE_RANGE.start(), *GRID_SIZE_RANGE.end())
    }

    pub fn set_grid_size(&mut self, size: u32) {
        self.grid_size = size.clamp(*GRID_SIZE_RANGE.start(), *GRID_SIZE_RANGE.end());
    }

    pub fn symmetry_segments(&self) -> u32 {
        self.symmetry_segments
            .clamp(*SEGMENT_RANGE.start(), *SEGMENT_RANGE.end())
    }

    pub fn set_symmetry_segments(&mut self, segments: u32) {
        self.symmetry_segments = segments.clamp(*SEGMENT_RANGE.start(), *SEGMENT_RANGE.end());
    }

    pub fn set_brush_style(&mut self, style: Option<BrushStyle>) {
        self.brush_style = style;
    }
}
