//! Periodic saving of the open project.
//!
//! The manager does not own a timer. The host calls [`AutoSaveManager::maybe_save`]
//! from its own tick and the manager decides whether a save is due.

use super::{FileStorage, ProjectRecord, ProjectSummary, Storage, StorageResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Key under which the most recently saved project is mirrored.
pub const LAST_PROJECT_KEY: &str = "__last_project__";

pub struct AutoSaveManager<S: Storage> {
    storage: Arc<S>,
    enabled: bool,
    interval: Duration,
    /// Monotonic time of the last successful save, for interval checks.
    last_save: Option<Instant>,
    /// Wall-clock time of the last successful save, for display.
    last_saved_at: Option<DateTime<Utc>>,
    dirty: bool,
    current_project_id: Option<String>,
}

impl<S: Storage> AutoSaveManager<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            enabled: true,
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            last_saved_at: None,
            dirty: false,
            current_project_id: None,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Turn periodic saving on or off. Explicit [`save`](Self::save) calls
    /// work either way.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Mark the project as having unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    pub fn set_project_id(&mut self, id: Option<String>) {
        self.current_project_id = id;
    }

    pub fn project_id(&self) -> Option<&str> {
        self.current_project_id.as_deref()
    }

    /// Whether a periodic save is due: enabled, dirty and the interval has
    /// elapsed since the last save.
    pub fn should_save(&self) -> bool {
        if !self.enabled || !self.dirty {
            return false;
        }
        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Save if a periodic save is due. Returns whether a save happened.
    ///
    /// On failure the project stays dirty, so the next tick retries.
    pub async fn maybe_save(&mut self, project: &mut ProjectRecord) -> StorageResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }
        match self.save(project).await {
            Ok(()) => Ok(true),
            Err(e) => {
                log::warn!("Auto-save of {} failed: {}", project.id, e);
                Err(e)
            }
        }
    }

    /// Save immediately, stamping the modification time.
    pub async fn save(&mut self, project: &mut ProjectRecord) -> StorageResult<()> {
        project.touch();
        let id = self
            .current_project_id
            .clone()
            .unwrap_or_else(|| project.id.clone());

        self.storage.save(&id, project).await?;
        self.storage.save(LAST_PROJECT_KEY, project).await?;

        self.current_project_id = Some(id);
        self.last_save = Some(Instant::now());
        self.last_saved_at = Some(project.modified);
        self.dirty = false;
        log::info!("Saved project {:?} ({})", project.name, project.id);
        Ok(())
    }

    /// Load a project by id and make it current.
    pub async fn load(&mut self, id: &str) -> StorageResult<ProjectRecord> {
        let project = self.storage.load(id).await?;
        self.adopt(id.to_string());
        log::info!("Loaded project {:?} ({})", project.name, id);
        Ok(project)
    }

    /// Load the most recently saved project, if any.
    pub async fn load_last(&mut self) -> Option<ProjectRecord> {
        match self.storage.load(LAST_PROJECT_KEY).await {
            Ok(project) => {
                self.adopt(project.id.clone());
                Some(project)
            }
            Err(e) => {
                log::debug!("No last project to restore: {}", e);
                None
            }
        }
    }

    fn adopt(&mut self, id: String) {
        self.current_project_id = Some(id);
        self.dirty = false;
        self.last_save = Some(Instant::now());
    }

    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        self.storage.delete(id).await
    }

    /// Ids of all saved projects.
    pub async fn list_project_ids(&self) -> StorageResult<Vec<String>> {
        let mut ids = self.storage.list().await?;
        ids.retain(|id| id != LAST_PROJECT_KEY);
        Ok(ids)
    }

    /// Summaries of all saved projects, most recently modified first.
    /// Unreadable entries are skipped.
    pub async fn list_projects(&self) -> StorageResult<Vec<ProjectSummary>> {
        let mut summaries = Vec::new();
        for id in self.list_project_ids().await? {
            match self.storage.load(&id).await {
                Ok(project) => summaries.push(project.summary()),
                Err(e) => log::warn!("Skipping unreadable project {}: {}", id, e),
            }
        }
        summaries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
        Ok(summaries)
    }

    pub async fn exists(&self, id: &str) -> StorageResult<bool> {
        self.storage.exists(id).await
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

/// File storage in the platform data directory.
pub fn create_default_storage() -> StorageResult<Arc<FileStorage>> {
    Ok(Arc::new(FileStorage::default_location()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DrawingMode;
    use crate::storage::{BoxFuture, MemoryStorage, StorageError, block_on};

    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn save(&self, _id: &str, _project: &ProjectRecord) -> BoxFuture<'_, StorageResult<()>> {
            Box::pin(async { Err(StorageError::Io("disk full".to_string())) })
        }

        fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<ProjectRecord>> {
            let id = id.to_string();
            Box::pin(async move { Err(StorageError::NotFound(id)) })
        }

        fn delete(&self, _id: &str) -> BoxFuture<'_, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
            Box::pin(async { Ok(vec![]) })
        }

        fn exists(&self, _id: &str) -> BoxFuture<'_, StorageResult<bool>> {
            Box::pin(async { Ok(false) })
        }
    }

    fn manager() -> AutoSaveManager<MemoryStorage> {
        AutoSaveManager::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn test_autosave_manager_creation() {
        let manager = manager();
        assert!(manager.is_enabled());
        assert!(!manager.is_dirty());
        assert!(!manager.should_save());
        assert_eq!(manager.interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_should_save_requires_dirty_and_enabled() {
        let mut manager = manager();
        manager.mark_dirty();
        assert!(manager.should_save());
        manager.set_enabled(false);
        assert!(!manager.should_save());
    }

    #[test]
    fn test_save_clears_dirty_and_respects_interval() {
        let mut manager = manager();
        let mut project = ProjectRecord::untitled(DrawingMode::Draw);
        manager.mark_dirty();

        assert!(block_on(manager.maybe_save(&mut project)).unwrap());
        assert!(!manager.is_dirty());
        assert!(manager.last_saved_at().is_some());
        assert_eq!(manager.project_id(), Some(project.id.as_str()));

        // Dirty again, but the 30s interval has not elapsed.
        manager.mark_dirty();
        assert!(!block_on(manager.maybe_save(&mut project)).unwrap());

        manager.set_interval(Duration::ZERO);
        assert!(block_on(manager.maybe_save(&mut project)).unwrap());
    }

    #[test]
    fn test_failed_save_stays_dirty() {
        let mut manager = AutoSaveManager::new(Arc::new(BrokenStorage));
        let mut project = ProjectRecord::untitled(DrawingMode::Pixel);
        manager.mark_dirty();

        assert!(block_on(manager.maybe_save(&mut project)).is_err());
        assert!(manager.is_dirty());
        assert!(manager.last_saved_at().is_none());
    }

    #[test]
    fn test_load_last() {
        let mut manager = manager();
        let mut project = ProjectRecord::new("Test Project", DrawingMode::Mandala);
        block_on(manager.save(&mut project)).unwrap();

        let mut fresh = AutoSaveManager::new(manager.storage().clone());
        let loaded = block_on(fresh.load_last()).unwrap();
        assert_eq!(loaded.name, "Test Project");
        assert_eq!(fresh.project_id(), Some(project.id.as_str()));
    }

    #[test]
    fn test_load_last_without_saves() {
        let mut manager = manager();
        assert!(block_on(manager.load_last()).is_none());
        assert_eq!(manager.project_id(), None);
    }

    #[test]
    fn test_list_excludes_last_key_and_sorts() {
        let mut manager = manager();
        let mut older = ProjectRecord::new("Older", DrawingMode::Draw);
        let mut newer = ProjectRecord::new("Newer", DrawingMode::Draw);
        block_on(manager.save(&mut older)).unwrap();
        manager.set_project_id(None);
        block_on(manager.save(&mut newer)).unwrap();

        let ids = block_on(manager.list_project_ids()).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(!ids.contains(&LAST_PROJECT_KEY.to_string()));

        let summaries = block_on(manager.list_projects()).unwrap();
        assert_eq!(summaries[0].name, "Newer");
        assert_eq!(summaries[1].name, "Older");
    }

    #[test]
    fn test_load_makes_project_current() {
        let mut manager = manager();
        let mut project = ProjectRecord::untitled(DrawingMode::Pixel);
        block_on(manager.save(&mut project)).unwrap();
        manager.set_project_id(None);
        manager.mark_dirty();

        let loaded = block_on(manager.load(&project.id)).unwrap();
        assert_eq!(loaded.id, project.id);
        assert!(!manager.is_dirty());
        assert_eq!(manager.project_id(), Some(project.id.as_str()));

        block_on(manager.delete(&project.id)).unwrap();
        assert!(!block_on(manager.exists(&project.id)).unwrap());
    }
}
