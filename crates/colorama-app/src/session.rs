//! A drawing session: the engine, the current settings and the open
//! project, kept in sync with storage.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::shortcuts::{ShortcutAction, ShortcutRegistry};
use colorama_core::config::{DrawingConfig, DrawingMode};
use colorama_core::engine::{DrawingEngine, EngineError, EngineEvent};
use colorama_core::input::{InputEvent, Modifiers};
use colorama_core::raster::RasterSurface;
use colorama_core::storage::{AutoSaveManager, ProjectRecord, ProjectSummary, Storage};
use colorama_export::{ExportFormat, THUMBNAIL_MAX_SIZE};
use kurbo::Point;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub struct Session<S: Storage> {
    engine: DrawingEngine,
    config: DrawingConfig,
    project: ProjectRecord,
    autosave: AutoSaveManager<S>,
}

impl<S: Storage> Session<S> {
    /// Start an untitled project on a blank canvas.
    pub fn new(app: &AppConfig, storage: Arc<S>) -> AppResult<Self> {
        let config = DrawingConfig::default();
        let mut engine = DrawingEngine::with_history_capacity(
            app.width,
            app.height,
            app.mode,
            &config,
            app.history_capacity,
        )?;
        engine.input_mut().set_pointer_available(app.pointer_available);

        let mut autosave = AutoSaveManager::new(storage);
        autosave.set_enabled(app.autosave_enabled);
        autosave.set_interval(Duration::from_secs(app.autosave_interval_secs));

        Ok(Self {
            engine,
            config,
            project: ProjectRecord::untitled(app.mode),
            autosave,
        })
    }

    pub fn engine(&self) -> &DrawingEngine {
        &self.engine
    }

    /// Direct engine access. Changes made through it are not marked as
    /// unsaved.
    pub fn engine_mut(&mut self) -> &mut DrawingEngine {
        &mut self.engine
    }

    pub fn config(&self) -> &DrawingConfig {
        &self.config
    }

    pub fn project(&self) -> &ProjectRecord {
        &self.project
    }

    pub fn autosave(&self) -> &AutoSaveManager<S> {
        &self.autosave
    }

    pub fn autosave_mut(&mut self) -> &mut AutoSaveManager<S> {
        &mut self.autosave
    }

    pub fn mode(&self) -> DrawingMode {
        self.engine.mode()
    }

    pub fn is_dirty(&self) -> bool {
        self.autosave.is_dirty()
    }

    /// Route an input event to the engine.
    pub fn handle_input(&mut self, event: InputEvent) -> Vec<EngineEvent> {
        let events = self.engine.handle_input(event, &self.config);
        for event in &events {
            self.note(Some(*event));
        }
        events
    }

    fn note(&mut self, event: Option<EngineEvent>) -> Option<EngineEvent> {
        match event {
            Some(EngineEvent::ColorPicked(color)) => {
                self.config.set_color(color);
                self.autosave.mark_dirty();
            }
            Some(_) => self.autosave.mark_dirty(),
            None => {}
        }
        event
    }

    /// Change drawing settings and push them to the active renderer.
    pub fn update_config(&mut self, f: impl FnOnce(&mut DrawingConfig)) {
        f(&mut self.config);
        if let Err(e) = self.engine.sync_config(&self.config) {
            log::warn!("Failed to apply drawing settings: {}", e);
        }
        self.autosave.mark_dirty();
    }

    pub fn set_mode(&mut self, mode: DrawingMode) -> AppResult<()> {
        self.engine.set_mode(mode, &self.config)?;
        self.project.mode = mode;
        self.autosave.mark_dirty();
        Ok(())
    }

    pub fn undo(&mut self) -> Option<EngineEvent> {
        let result = self.engine.undo();
        self.note(result)
    }

    pub fn redo(&mut self) -> Option<EngineEvent> {
        let result = self.engine.redo();
        self.note(result)
    }

    pub fn clear(&mut self) -> EngineEvent {
        let event = self.engine.clear();
        self.autosave.mark_dirty();
        event
    }

    pub fn fill_area(&mut self, point: Point) -> Option<EngineEvent> {
        let result = self.engine.fill_area(point, &self.config);
        self.note(result)
    }

    pub fn apply_kaleidoscope(&mut self) -> Option<EngineEvent> {
        let result = self.engine.apply_kaleidoscope();
        self.note(result)
    }

    /// Dispatch a key press. Returns the action that ran, if any.
    pub fn handle_key(
        &mut self,
        key: &str,
        modifiers: Modifiers,
        text_focus: bool,
    ) -> Option<ShortcutAction> {
        let shortcut = ShortcutRegistry::find(key, modifiers, text_focus)?;
        match shortcut.action {
            ShortcutAction::SetTool(tool) => self.update_config(|c| c.set_tool(tool)),
            ShortcutAction::ToggleGrid => self.update_config(|c| c.toggle_grid()),
            ShortcutAction::SetBrushSize(size) => self.update_config(|c| c.set_brush_size(size)),
            ShortcutAction::AdjustBrushSize(delta) => {
                self.update_config(|c| c.set_brush_size(c.brush_size() + delta))
            }
            ShortcutAction::SetOpacity(opacity) => self.update_config(|c| c.set_opacity(opacity)),
            ShortcutAction::Undo => {
                self.undo();
            }
            ShortcutAction::Redo => {
                self.redo();
            }
            ShortcutAction::Save => {
                if let Err(e) = self.save_now() {
                    log::error!("Save failed: {}", e);
                }
            }
        }
        log::debug!("Shortcut {} -> {:?}", shortcut.format(), shortcut.action);
        Some(shortcut.action)
    }

    /// Copy the canvas, settings and a thumbnail into the project record.
    fn sync_project(&mut self) {
        let snapshot = self.engine.capture_snapshot();
        self.project.thumbnail = match colorama_export::thumbnail(&snapshot, THUMBNAIL_MAX_SIZE) {
            Ok(url) => Some(url),
            Err(e) => {
                log::warn!("Could not render thumbnail: {}", e);
                None
            }
        };
        self.project.set_canvas(snapshot);
        self.project.set_drawing_config(&self.config);
        self.project.mode = self.engine.mode();
    }

    /// Periodic hook. Saves when auto-save says a save is due and returns
    /// whether it did. Failures are logged and retried on a later tick.
    pub fn tick(&mut self) -> bool {
        if !self.autosave.should_save() {
            return false;
        }
        self.sync_project();
        pollster::block_on(self.autosave.maybe_save(&mut self.project)).unwrap_or(false)
    }

    /// Save right away, whether or not anything changed.
    pub fn save_now(&mut self) -> AppResult<()> {
        self.sync_project();
        pollster::block_on(self.autosave.save(&mut self.project))?;
        Ok(())
    }

    /// Save pending changes before the open project is replaced.
    fn flush(&mut self) -> AppResult<()> {
        if self.autosave.is_dirty() {
            self.save_now()?;
        }
        Ok(())
    }

    fn apply_project(&mut self, project: ProjectRecord) -> AppResult<()> {
        let config = project.drawing_config();
        self.engine.set_mode(project.mode, &config)?;
        let canvas = match &project.canvas {
            Some(canvas) => canvas.clone(),
            None => {
                let surface = self.engine.surface();
                RasterSurface::new(surface.width(), surface.height())
                    .map_err(EngineError::from)?
                    .snapshot()
            }
        };
        self.engine.restore_snapshot(&canvas)?;
        self.engine.sync_config(&config)?;
        self.config = config;
        self.project = project;
        Ok(())
    }

    /// Open a saved project, saving the current one first if it has
    /// unsaved changes.
    pub fn open_project(&mut self, id: &str) -> AppResult<()> {
        self.flush()?;
        let project = pollster::block_on(self.autosave.load(id))?;
        self.apply_project(project)
    }

    /// Reopen the most recently saved project. Returns whether one was
    /// found.
    pub fn restore_last(&mut self) -> bool {
        let Some(project) = pollster::block_on(self.autosave.load_last()) else {
            return false;
        };
        match self.apply_project(project) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Could not restore last project: {}", e);
                false
            }
        }
    }

    /// Start a blank project with the current settings, saving the current
    /// one first if it has unsaved changes.
    pub fn new_project(&mut self, name: &str, mode: DrawingMode) -> AppResult<()> {
        self.flush()?;
        let mut project = ProjectRecord::new(name, mode);
        project.set_drawing_config(&self.config);
        self.apply_project(project)?;
        self.autosave.set_project_id(Some(self.project.id.clone()));
        log::info!("New project {:?} in {} mode", name, mode.name());
        Ok(())
    }

    pub fn list_projects(&self) -> AppResult<Vec<ProjectSummary>> {
        Ok(pollster::block_on(self.autosave.list_projects())?)
    }

    pub fn delete_project(&mut self, id: &str) -> AppResult<()> {
        pollster::block_on(self.autosave.delete(id))?;
        if self.autosave.project_id() == Some(id) {
            self.autosave.set_project_id(None);
        }
        Ok(())
    }

    /// Encode the canvas. The grid and symmetry guides are not included.
    pub fn export(&self, format: ExportFormat) -> AppResult<Vec<u8>> {
        Ok(colorama_export::encode(&self.engine.capture_snapshot(), format)?)
    }

    /// Export to a file, picking the format from its extension.
    pub fn export_to_file(&self, path: &Path) -> AppResult<ExportFormat> {
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ExportFormat::from_extension)
            .ok_or_else(|| AppError::UnsupportedFormat(path.display().to_string()))?;
        std::fs::write(path, self.export(format)?)?;
        log::info!("Exported {} to {}", format.mime(), path.display());
        Ok(format)
    }

    /// Copy the canvas to the system clipboard. Returns whether it worked.
    #[cfg(feature = "native")]
    pub fn copy_to_clipboard(&self) -> bool {
        crate::clipboard::copy_image(&self.engine.capture_snapshot())
    }

    #[cfg(not(feature = "native"))]
    pub fn copy_to_clipboard(&self) -> bool {
        log::warn!("Clipboard is not available in this build");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colorama_core::color::Rgba;
    use colorama_core::config::Tool;
    use colorama_core::input::InputPhase;
    use colorama_core::storage::MemoryStorage;
    use tempfile::tempdir;

    const RED: Rgba = Rgba::rgb(255, 0, 0);
    const BLUE: Rgba = Rgba::rgb(0, 0, 255);

    fn app_config() -> AppConfig {
        AppConfig {
            width: 64,
            height: 64,
            ..AppConfig::default()
        }
    }

    fn session() -> Session<MemoryStorage> {
        Session::new(&app_config(), Arc::new(MemoryStorage::new())).unwrap()
    }

    fn ctrl() -> Modifiers {
        Modifiers {
            ctrl: true,
            ..Modifiers::default()
        }
    }

    fn click(session: &mut Session<MemoryStorage>, x: f64, y: f64) -> Vec<EngineEvent> {
        let mut events = session.handle_input(InputEvent::mouse(InputPhase::Down, x, y));
        events.extend(session.handle_input(InputEvent::mouse(InputPhase::Up, x, y)));
        events
    }

    /// Flood the blank canvas with red.
    fn fill_red(session: &mut Session<MemoryStorage>) {
        session.update_config(|c| {
            c.set_color(RED);
            c.set_tool(Tool::Fill);
        });
        assert_eq!(click(session, 5.0, 5.0), vec![EngineEvent::Filled]);
    }

    #[test]
    fn test_new_session() {
        let session = session();
        assert_eq!(session.mode(), DrawingMode::Pixel);
        assert_eq!(session.engine().surface().width(), 64);
        assert!(!session.is_dirty());
        assert!(!session.engine().can_undo());
    }

    #[test]
    fn test_edit_marks_dirty_and_tick_saves() {
        let mut session = session();
        fill_red(&mut session);
        assert!(session.is_dirty());

        assert!(session.tick());
        assert!(!session.is_dirty());
        assert!(!session.tick());

        let projects = session.list_projects().unwrap();
        assert_eq!(projects.len(), 1);
        assert!(projects[0].has_thumbnail);
        assert_eq!(projects[0].mode, DrawingMode::Pixel);
    }

    #[test]
    fn test_tick_respects_disabled_autosave() {
        let app = AppConfig {
            autosave_enabled: false,
            ..app_config()
        };
        let mut session = Session::new(&app, Arc::new(MemoryStorage::new())).unwrap();
        fill_red(&mut session);
        assert!(!session.tick());
        assert!(session.is_dirty());
    }

    #[test]
    fn test_color_picker_updates_color() {
        let mut session = session();
        fill_red(&mut session);
        session.update_config(|c| c.set_color(BLUE));

        assert_eq!(
            session.handle_key("i", Modifiers::default(), false),
            Some(ShortcutAction::SetTool(Tool::ColorPicker))
        );
        assert_eq!(click(&mut session, 30.0, 30.0), vec![EngineEvent::ColorPicked(RED)]);
        assert_eq!(session.config().color, RED);
    }

    #[test]
    fn test_brush_and_opacity_shortcuts() {
        let mut session = session();
        let none = Modifiers::default();

        session.handle_key("]", none, false);
        assert_eq!(session.config().brush_size(), 6.0);
        session.handle_key("1", none, false);
        session.handle_key("[", none, false);
        assert_eq!(session.config().brush_size(), 1.0);

        session.handle_key("7", none, false);
        assert_eq!(session.config().opacity(), 0.7);

        let grid = session.config().grid_enabled;
        session.handle_key("G", none, false);
        assert_eq!(session.config().grid_enabled, !grid);

        assert_eq!(session.handle_key("e", none, true), None);
        assert_eq!(session.config().tool, Tool::Brush);
    }

    #[test]
    fn test_undo_redo_shortcuts() {
        let mut session = session();
        fill_red(&mut session);

        assert_eq!(session.handle_key("z", ctrl(), false), Some(ShortcutAction::Undo));
        assert!(session.engine().surface().is_blank());

        assert_eq!(session.handle_key("y", ctrl(), false), Some(ShortcutAction::Redo));
        assert_eq!(session.engine().surface().pixel(10, 10), Some(RED));
    }

    #[test]
    fn test_save_new_and_reopen() {
        let mut session = session();
        fill_red(&mut session);
        session.save_now().unwrap();
        let first = session.project().id.clone();

        session.new_project("Second", DrawingMode::Draw).unwrap();
        assert_eq!(session.mode(), DrawingMode::Draw);
        assert_eq!(session.project().name, "Second");
        assert!(session.engine().surface().is_blank());
        assert_ne!(session.project().id, first);

        session.open_project(&first).unwrap();
        assert_eq!(session.mode(), DrawingMode::Pixel);
        assert_eq!(session.engine().surface().pixel(10, 10), Some(RED));
        assert_eq!(session.config().color, RED);
        assert!(!session.engine().can_undo());
        assert_eq!(session.autosave().project_id(), Some(first.as_str()));
    }

    #[test]
    fn test_switching_projects_saves_pending_changes() {
        let mut session = session();
        fill_red(&mut session);
        let first = session.project().id.clone();

        session.new_project("Other", DrawingMode::Mandala).unwrap();
        session.open_project(&first).unwrap();
        assert_eq!(session.engine().surface().pixel(0, 0), Some(RED));
    }

    #[test]
    fn test_restore_last_in_new_session() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = Session::new(&app_config(), storage.clone()).unwrap();
        session.set_mode(DrawingMode::Draw).unwrap();
        session.update_config(|c| c.set_brush_size(12.0));
        session.save_now().unwrap();

        let mut fresh = Session::new(&app_config(), storage).unwrap();
        assert!(fresh.restore_last());
        assert_eq!(fresh.mode(), DrawingMode::Draw);
        assert_eq!(fresh.config().brush_size(), 12.0);
        assert_eq!(fresh.project().id, session.project().id);

        let mut empty = self::session();
        assert!(!empty.restore_last());
    }

    #[test]
    fn test_delete_current_project() {
        let mut session = session();
        session.save_now().unwrap();
        let id = session.project().id.clone();

        session.delete_project(&id).unwrap();
        assert_eq!(session.autosave().project_id(), None);
        assert!(session.list_projects().unwrap().is_empty());
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempdir().unwrap();
        let mut session = session();
        fill_red(&mut session);

        let path = dir.path().join("art.png");
        assert_eq!(session.export_to_file(&path).unwrap(), ExportFormat::Png);
        let decoded = colorama_export::decode_png(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(decoded, session.engine().capture_snapshot());

        let jpeg = dir.path().join("art.JPG");
        assert_eq!(session.export_to_file(&jpeg).unwrap(), ExportFormat::Jpeg);

        let result = session.export_to_file(&dir.path().join("art.bmp"));
        assert!(matches!(result, Err(AppError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_export_leaves_history_alone() {
        let mut session = session();
        fill_red(&mut session);
        let entries = session.engine().history().len();
        session.export(ExportFormat::Gif).unwrap();
        assert_eq!(session.engine().history().len(), entries);
    }
}
