//! Keyboard shortcut registry and documentation.

use colorama_core::config::Tool;
use colorama_core::input::Modifiers;

/// What a shortcut does when triggered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShortcutAction {
    SetTool(Tool),
    ToggleGrid,
    SetBrushSize(f64),
    /// Grow or shrink the brush by this many pixels.
    AdjustBrushSize(f64),
    SetOpacity(f64),
    Undo,
    Redo,
    Save,
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub description: &'static str,
    pub action: ShortcutAction,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        description: &'static str,
        action: ShortcutAction,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            description,
            action,
        }
    }

    const fn key(key: &'static str, description: &'static str, action: ShortcutAction) -> Self {
        Self::new(key, false, false, description, action)
    }

    /// Format the shortcut for display (e.g., "Ctrl+S").
    pub fn format(&self) -> String {
        let key = self.key.to_uppercase();
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(key.as_str());
        parts.join("+")
    }

    /// Whether a key press triggers this shortcut. Keys compare without
    /// case and Cmd counts as Ctrl. Shift only matters for Ctrl chords.
    pub fn matches(&self, key: &str, modifiers: Modifiers) -> bool {
        if !self.key.eq_ignore_ascii_case(key) {
            return false;
        }
        let ctrl = modifiers.ctrl || modifiers.meta;
        if self.ctrl != ctrl {
            return false;
        }
        !self.ctrl || self.shift == modifiers.shift
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        use ShortcutAction::*;
        vec![
            // Tools
            Shortcut::key("b", "Brush tool", SetTool(Tool::Brush)),
            Shortcut::key("e", "Eraser tool", SetTool(Tool::Eraser)),
            Shortcut::key("f", "Fill tool", SetTool(Tool::Fill)),
            Shortcut::key("i", "Color picker", SetTool(Tool::ColorPicker)),
            // Grid (pixel mode)
            Shortcut::key("g", "Toggle grid", ToggleGrid),
            // Brush size
            Shortcut::key("1", "Brush size 1", SetBrushSize(1.0)),
            Shortcut::key("2", "Brush size 3", SetBrushSize(3.0)),
            Shortcut::key("3", "Brush size 5", SetBrushSize(5.0)),
            Shortcut::key("4", "Brush size 10", SetBrushSize(10.0)),
            Shortcut::key("5", "Brush size 20", SetBrushSize(20.0)),
            Shortcut::key("[", "Decrease brush size", AdjustBrushSize(-1.0)),
            Shortcut::key("]", "Increase brush size", AdjustBrushSize(1.0)),
            // Opacity
            Shortcut::key("0", "Full opacity", SetOpacity(1.0)),
            Shortcut::key("9", "90% opacity", SetOpacity(0.9)),
            Shortcut::key("8", "80% opacity", SetOpacity(0.8)),
            Shortcut::key("7", "70% opacity", SetOpacity(0.7)),
            Shortcut::key("6", "60% opacity", SetOpacity(0.6)),
            // History and storage
            Shortcut::new("z", true, false, "Undo", Undo),
            Shortcut::new("z", true, true, "Redo", Redo),
            Shortcut::new("y", true, false, "Redo", Redo),
            Shortcut::new("s", true, false, "Save", Save),
        ]
    }

    /// Find the shortcut for a key press. Nothing matches while a text
    /// field has focus.
    pub fn find(key: &str, modifiers: Modifiers, text_focus: bool) -> Option<Shortcut> {
        if text_focus {
            return None;
        }
        Self::all().into_iter().find(|s| s.matches(key, modifiers))
    }

    /// Print all shortcuts to console.
    pub fn print_all() {
        println!("\n=== Keyboard Shortcuts ===");
        for shortcut in Self::all() {
            println!("  {:20} {}", shortcut.format(), shortcut.description);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctrl() -> Modifiers {
        Modifiers {
            ctrl: true,
            ..Modifiers::default()
        }
    }

    #[test]
    fn test_format() {
        let redo = ShortcutRegistry::all()
            .into_iter()
            .find(|s| s.ctrl && s.shift)
            .unwrap();
        assert_eq!(redo.format(), "Ctrl+Shift+Z");
        assert_eq!(ShortcutRegistry::all()[0].format(), "B");
    }

    #[test]
    fn test_keys_match_without_case() {
        let found = ShortcutRegistry::find("B", Modifiers::default(), false).unwrap();
        assert_eq!(found.action, ShortcutAction::SetTool(Tool::Brush));

        let shifted = Modifiers {
            shift: true,
            ..Modifiers::default()
        };
        let found = ShortcutRegistry::find("E", shifted, false).unwrap();
        assert_eq!(found.action, ShortcutAction::SetTool(Tool::Eraser));
    }

    #[test]
    fn test_ctrl_chords() {
        let undo = ShortcutRegistry::find("z", ctrl(), false).unwrap();
        assert_eq!(undo.action, ShortcutAction::Undo);

        let ctrl_shift = Modifiers {
            shift: true,
            ..ctrl()
        };
        let redo = ShortcutRegistry::find("Z", ctrl_shift, false).unwrap();
        assert_eq!(redo.action, ShortcutAction::Redo);

        let meta = Modifiers {
            meta: true,
            ..Modifiers::default()
        };
        let save = ShortcutRegistry::find("s", meta, false).unwrap();
        assert_eq!(save.action, ShortcutAction::Save);

        // Plain keys do not fire with Ctrl held, and vice versa.
        assert!(ShortcutRegistry::find("b", ctrl(), false).is_none());
        assert!(ShortcutRegistry::find("z", Modifiers::default(), false).is_none());
    }

    #[test]
    fn test_ignored_while_typing() {
        assert!(ShortcutRegistry::find("b", Modifiers::default(), true).is_none());
        assert!(ShortcutRegistry::find("z", ctrl(), true).is_none());
    }

    #[test]
    fn test_unknown_key() {
        assert!(ShortcutRegistry::find("q", Modifiers::default(), false).is_none());
    }

    #[test]
    fn test_brush_presets() {
        let sizes: Vec<f64> = ["1", "2", "3", "4", "5"]
            .iter()
            .filter_map(|k| match ShortcutRegistry::find(k, Modifiers::default(), false)?.action {
                ShortcutAction::SetBrushSize(size) => Some(size),
                _ => None,
            })
            .collect();
        assert_eq!(sizes, vec![1.0, 3.0, 5.0, 10.0, 20.0]);
    }
}
