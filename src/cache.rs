use crate::errors::CacheError;
use crate::models::{ProgressState, TaskCompletion};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::error;

pub const UNLOCKED_INDEX_KEY: &str = "unlockedIndex";
pub const COMPLETED_PROJECTS_KEY: &str = "completedProjects";
pub const POINTS_KEY: &str = "userPoints";
pub const TASK_COMPLETION_KEY: &str = "taskCompletion";

/// File-backed string key/value store holding the fallback copy of progress.
///
/// All (de)serialization and default-filling for the fallback tier happens
/// here. Values are stored as strings, integers in decimal and collections as
/// JSON text.
#[derive(Debug)]
pub struct LocalCache {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl LocalCache {
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path).await;
        let mut cache = Self { path, entries };
        if cache.ensure_defaults() {
            cache.persist().await;
        }
        cache
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn unlocked_index(&self) -> usize {
        self.parse_int(UNLOCKED_INDEX_KEY)
    }

    pub fn completed_projects(&self) -> Vec<usize> {
        self.parse_json(COMPLETED_PROJECTS_KEY)
    }

    pub fn points(&self) -> u32 {
        self.parse_int(POINTS_KEY)
    }

    pub fn task_completion(&self) -> TaskCompletion {
        self.parse_json(TASK_COMPLETION_KEY)
    }

    pub fn project_tasks(&self, project: usize) -> Vec<bool> {
        self.task_completion().get(project).to_vec()
    }

    pub fn snapshot(&self) -> ProgressState {
        ProgressState {
            unlocked_index: self.unlocked_index(),
            completed_projects: self.completed_projects(),
            points: self.points(),
            task_completion: self.task_completion(),
        }
    }

    pub async fn store_progress(&mut self, state: &ProgressState) {
        self.put(UNLOCKED_INDEX_KEY, state.unlocked_index.to_string());
        self.put(COMPLETED_PROJECTS_KEY, to_json(&state.completed_projects));
        self.put(POINTS_KEY, state.points.to_string());
        self.persist().await;
    }

    pub async fn set_task(&mut self, project: usize, task: usize, checked: bool) {
        let mut completion = self.task_completion();
        completion.set(project, task, checked);
        self.put(TASK_COMPLETION_KEY, to_json(&completion));
        self.persist().await;
    }

    pub async fn reset(&mut self) {
        self.put(UNLOCKED_INDEX_KEY, "0".to_string());
        self.put(COMPLETED_PROJECTS_KEY, "[]".to_string());
        self.put(POINTS_KEY, "0".to_string());
        self.entries.remove(TASK_COMPLETION_KEY);
        self.persist().await;
    }

    fn put(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn ensure_defaults(&mut self) -> bool {
        let mut changed = false;
        for (key, default) in [
            (UNLOCKED_INDEX_KEY, "0"),
            (COMPLETED_PROJECTS_KEY, "[]"),
            (POINTS_KEY, "0"),
        ] {
            if !self.entries.contains_key(key) {
                self.put(key, default.to_string());
                changed = true;
            }
        }
        changed
    }

    fn parse_int<T: std::str::FromStr + Default>(&self, key: &str) -> T {
        self.get(key)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or_default()
    }

    fn parse_json<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.get(key)
            .and_then(|value| serde_json::from_str(value).ok())
            .unwrap_or_default()
    }

    async fn persist(&self) {
        if let Err(err) = persist_entries(&self.path, &self.entries).await {
            error!("failed to persist local cache: {err}");
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

async fn load_entries(path: &Path) -> BTreeMap<String, String> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(err) => {
                error!("failed to parse local cache file: {err}");
                BTreeMap::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(err) => {
            error!("failed to read local cache file: {err}");
            BTreeMap::new()
        }
    }
}

async fn persist_entries(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), CacheError> {
    let payload = serde_json::to_vec_pretty(entries)?;
    fs::write(path, payload).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("cache.json")
    }

    #[tokio::test]
    async fn open_writes_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::open(cache_path(&dir)).await;
        assert_eq!(cache.get(UNLOCKED_INDEX_KEY), Some("0"));
        assert_eq!(cache.get(COMPLETED_PROJECTS_KEY), Some("[]"));
        assert_eq!(cache.get(POINTS_KEY), Some("0"));
        assert_eq!(cache.get(TASK_COMPLETION_KEY), None);
        assert!(cache_path(&dir).exists());
    }

    #[tokio::test]
    async fn garbage_values_read_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let raw = r#"{"unlockedIndex":"abc","completedProjects":"{oops","userPoints":"-","taskCompletion":"7"}"#;
        std::fs::write(cache_path(&dir), raw).unwrap();

        let cache = LocalCache::open(cache_path(&dir)).await;
        assert_eq!(cache.snapshot(), ProgressState::default());
    }

    #[tokio::test]
    async fn unparsable_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(cache_path(&dir), "not json").unwrap();
        let cache = LocalCache::open(cache_path(&dir)).await;
        assert_eq!(cache.unlocked_index(), 0);
        assert!(cache.completed_projects().is_empty());
    }

    #[tokio::test]
    async fn writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = LocalCache::open(cache_path(&dir)).await;
        let state = ProgressState {
            unlocked_index: 2,
            completed_projects: vec![0, 1],
            points: 100,
            task_completion: TaskCompletion::default(),
        };
        cache.store_progress(&state).await;
        cache.set_task(1, 2, true).await;

        let reopened = LocalCache::open(cache_path(&dir)).await;
        assert_eq!(reopened.unlocked_index(), 2);
        assert_eq!(reopened.completed_projects(), vec![0, 1]);
        assert_eq!(reopened.points(), 100);
        assert_eq!(reopened.project_tasks(1), vec![false, false, true]);
    }

    #[tokio::test]
    async fn reset_zeroes_scalars_and_drops_task_completion() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = LocalCache::open(cache_path(&dir)).await;
        cache.set_task(0, 0, true).await;
        cache
            .store_progress(&ProgressState {
                unlocked_index: 1,
                completed_projects: vec![0],
                points: 50,
                task_completion: TaskCompletion::default(),
            })
            .await;

        cache.reset().await;
        assert_eq!(cache.snapshot(), ProgressState::default());
        assert_eq!(cache.get(TASK_COMPLETION_KEY), None);
    }
}
