//! Input state machine: normalizes pointer, mouse and touch events into a
//! single start/move/end stroke lifecycle in canvas-local coordinates.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Where an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputSource {
    /// Pressure-capable pointer path (pen, stylus, unified pointer events).
    Pointer,
    Mouse,
    /// First touch contact only.
    Touch,
}

/// What the device did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputPhase {
    Down,
    Move,
    Up,
    /// The device left the canvas.
    Leave,
}

/// A raw device event in client (page) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    pub source: InputSource,
    pub phase: InputPhase,
    pub position: Point,
    /// Normalized pressure in `[0, 1]`, when the device reports one.
    pub pressure: Option<f64>,
}

impl InputEvent {
    pub fn new(source: InputSource, phase: InputPhase, position: Point) -> Self {
        Self {
            source,
            phase,
            position,
            pressure: None,
        }
    }

    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = Some(pressure);
        self
    }

    pub fn pointer(phase: InputPhase, x: f64, y: f64) -> Self {
        Self::new(InputSource::Pointer, phase, Point::new(x, y))
    }

    pub fn mouse(phase: InputPhase, x: f64, y: f64) -> Self {
        Self::new(InputSource::Mouse, phase, Point::new(x, y))
    }

    pub fn touch(phase: InputPhase, x: f64, y: f64) -> Self {
        Self::new(InputSource::Touch, phase, Point::new(x, y))
    }
}

/// A canvas-local sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub position: Point,
    pub pressure: Option<f64>,
}

impl StrokePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            pressure: None,
        }
    }

    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = Some(pressure);
        self
    }

    /// Pressure clamped to `[0, 1]`; a missing reading counts as full pressure.
    pub fn pressure_or_default(&self) -> f64 {
        match self.pressure {
            Some(p) if p.is_nan() => 1.0,
            Some(p) => p.clamp(0.0, 1.0),
            None => 1.0,
        }
    }
}

/// Lifecycle command for the active renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StrokeCommand {
    Start(StrokePoint),
    Move(StrokePoint),
    End,
    /// A device-down arrived while a stroke was open: end it, then start anew.
    Restart(StrokePoint),
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Tracks whether a stroke is open and which source owns it.
#[derive(Debug, Clone, Default)]
pub struct StrokeInput {
    /// On-screen position of the canvas' top-left corner.
    origin: Vec2,
    /// Whether the host has a pressure-capable pointer path.
    pointer_available: bool,
    /// Source of the open stroke, if any.
    active: Option<InputSource>,
}

impl StrokeInput {
    pub fn new(pointer_available: bool) -> Self {
        Self {
            pointer_available,
            ..Self::default()
        }
    }

    /// Update the canvas origin after scroll or layout changes.
    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin.to_vec2();
    }

    pub fn origin(&self) -> Point {
        self.origin.to_point()
    }

    pub fn set_pointer_available(&mut self, available: bool) {
        self.pointer_available = available;
    }

    pub fn pointer_available(&self) -> bool {
        self.pointer_available
    }

    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    /// Whether a new gesture may start from `source`.
    fn accepts(&self, source: InputSource) -> bool {
        match source {
            InputSource::Pointer => self.pointer_available,
            InputSource::Mouse | InputSource::Touch => !self.pointer_available,
        }
    }

    fn local(&self, event: &InputEvent) -> StrokePoint {
        StrokePoint {
            position: event.position - self.origin,
            pressure: event.pressure,
        }
    }

    /// Feed one raw event. Returns the command for the renderer, if any.
    pub fn handle(&mut self, event: &InputEvent) -> Option<StrokeCommand> {
        match event.phase {
            InputPhase::Down => {
                if !self.accepts(event.source) {
                    return None;
                }
                let point = self.local(event);
                let was_drawing = self.active.replace(event.source).is_some();
                if was_drawing {
                    Some(StrokeCommand::Restart(point))
                } else {
                    Some(StrokeCommand::Start(point))
                }
            }
            InputPhase::Move => {
                if self.active != Some(event.source) {
                    return None;
                }
                Some(StrokeCommand::Move(self.local(event)))
            }
            InputPhase::Up | InputPhase::Leave => {
                if self.active != Some(event.source) {
                    return None;
                }
                self.active = None;
                Some(StrokeCommand::End)
            }
        }
    }

    /// Close an open stroke without producing an end command.
    /// Returns whether a stroke was open.
    pub fn abandon(&mut self) -> bool {
        self.active.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mouse_lifecycle() {
        let mut input = StrokeInput::new(false);

        let start = input.handle(&InputEvent::mouse(InputPhase::Down, 10.0, 20.0));
        assert_eq!(start, Some(StrokeCommand::Start(StrokePoint::new(10.0, 20.0))));
        assert!(input.is_drawing());

        let moved = input.handle(&InputEvent::mouse(InputPhase::Move, 11.0, 21.0));
        assert_eq!(moved, Some(StrokeCommand::Move(StrokePoint::new(11.0, 21.0))));

        assert_eq!(
            input.handle(&InputEvent::mouse(InputPhase::Up, 11.0, 21.0)),
            Some(StrokeCommand::End)
        );
        assert!(!input.is_drawing());
    }

    #[test]
    fn test_move_and_end_without_stroke_are_noops() {
        let mut input = StrokeInput::new(false);
        assert_eq!(input.handle(&InputEvent::mouse(InputPhase::Move, 1.0, 1.0)), None);
        assert_eq!(input.handle(&InputEvent::mouse(InputPhase::Up, 1.0, 1.0)), None);
        assert_eq!(input.handle(&InputEvent::mouse(InputPhase::Leave, 1.0, 1.0)), None);
    }

    #[test]
    fn test_coordinates_are_canvas_local() {
        let mut input = StrokeInput::new(false);
        input.set_origin(Point::new(100.0, 50.0));
        let cmd = input.handle(&InputEvent::mouse(InputPhase::Down, 110.0, 75.0));
        assert_eq!(cmd, Some(StrokeCommand::Start(StrokePoint::new(10.0, 25.0))));
    }

    #[test]
    fn test_down_while_drawing_restarts() {
        let mut input = StrokeInput::new(false);
        input.handle(&InputEvent::mouse(InputPhase::Down, 0.0, 0.0));
        let cmd = input.handle(&InputEvent::mouse(InputPhase::Down, 5.0, 5.0));
        assert_eq!(cmd, Some(StrokeCommand::Restart(StrokePoint::new(5.0, 5.0))));
        assert!(input.is_drawing());
    }

    #[test]
    fn test_leave_ends_stroke() {
        let mut input = StrokeInput::new(false);
        input.handle(&InputEvent::touch(InputPhase::Down, 0.0, 0.0));
        assert_eq!(
            input.handle(&InputEvent::touch(InputPhase::Leave, 0.0, 0.0)),
            Some(StrokeCommand::End)
        );
    }

    #[test]
    fn test_pointer_preempts_mouse_and_touch() {
        let mut input = StrokeInput::new(true);
        assert_eq!(input.handle(&InputEvent::mouse(InputPhase::Down, 0.0, 0.0)), None);
        assert_eq!(input.handle(&InputEvent::touch(InputPhase::Down, 0.0, 0.0)), None);

        let down = InputEvent::pointer(InputPhase::Down, 3.0, 4.0).with_pressure(0.25);
        assert_eq!(
            input.handle(&down),
            Some(StrokeCommand::Start(StrokePoint::new(3.0, 4.0).with_pressure(0.25)))
        );
        // Synthesized mouse events for the same gesture are ignored.
        assert_eq!(input.handle(&InputEvent::mouse(InputPhase::Move, 9.0, 9.0)), None);
        assert_eq!(input.handle(&InputEvent::mouse(InputPhase::Up, 9.0, 9.0)), None);
        assert!(input.is_drawing());
    }

    #[test]
    fn test_pointer_ignored_without_pointer_path() {
        let mut input = StrokeInput::new(false);
        assert_eq!(input.handle(&InputEvent::pointer(InputPhase::Down, 0.0, 0.0)), None);
        assert!(!input.is_drawing());
    }

    #[test]
    fn test_abandon_closes_silently() {
        let mut input = StrokeInput::new(false);
        input.handle(&InputEvent::mouse(InputPhase::Down, 0.0, 0.0));
        assert!(input.abandon());
        assert!(!input.is_drawing());
        assert_eq!(input.handle(&InputEvent::mouse(InputPhase::Up, 0.0, 0.0)), None);
        assert!(!input.abandon());
    }

    #[test]
    fn test_pressure_defaults_and_clamps() {
        assert_eq!(StrokePoint::new(0.0, 0.0).pressure_or_default(), 1.0);
        assert_eq!(StrokePoint::new(0.0, 0.0).with_pressure(0.0).pressure_or_default(), 0.0);
        assert_eq!(StrokePoint::new(0.0, 0.0).with_pressure(3.0).pressure_or_default(), 1.0);
    }
}
