use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{DaybookError, DaybookResult};
use crate::store::TaskStore;
use crate::task::Task;

pub const DEFAULT_STORAGE_KEY: &str = "todoTasks";

/// Snapshot storage for the task list. `load` returns `Ok(None)` when
/// nothing has been stored under the key yet.
pub trait TaskGateway {
    fn load(&self) -> DaybookResult<Option<Vec<Task>>>;

    fn save(&mut self, tasks: &[Task]) -> DaybookResult<()>;
}

/// Key-value storage on disk: the value for a key lives in `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileGateway {
    path: PathBuf,
}

impl FileGateway {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path, key: &str) -> DaybookResult<Self> {
        if key.trim().is_empty() || key.contains(['/', '\\']) {
            return Err(DaybookError::Config(format!(
                "invalid storage key {key:?}"
            )));
        }
        fs::create_dir_all(data_dir)?;
        let path = data_dir.join(format!("{key}.json"));
        info!(file = %path.display(), "opened task storage");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TaskGateway for FileGateway {
    #[tracing::instrument(skip(self))]
    fn load(&self) -> DaybookResult<Option<Vec<Task>>> {
        if !self.path.exists() {
            debug!(file = %self.path.display(), "no stored tasks");
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        match decode(&raw) {
            Ok(tasks) => Ok(Some(tasks)),
            Err(err) => {
                warn!(file = %self.path.display(), error = %err, "stored tasks do not decode");
                Err(DaybookError::Persistence(format!(
                    "{}: {err}",
                    self.path.display()
                )))
            }
        }
    }

    #[tracing::instrument(skip(self, tasks), fields(count = tasks.len()))]
    fn save(&mut self, tasks: &[Task]) -> DaybookResult<()> {
        let blob = encode(tasks)?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(blob.as_bytes())?;
        temp.flush()?;
        temp.persist(&self.path).map_err(|err| {
            DaybookError::Persistence(format!(
                "failed to persist {}: {}",
                self.path.display(),
                err
            ))
        })?;
        debug!(file = %self.path.display(), "saved tasks");
        Ok(())
    }
}

/// In-memory blob, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    blob: Option<String>,
    fail_saves: bool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Some(blob.into()),
            fail_saves: false,
        }
    }

    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }

    /// Makes every following `save` fail.
    pub fn fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }
}

impl TaskGateway for MemoryGateway {
    fn load(&self) -> DaybookResult<Option<Vec<Task>>> {
        self.blob.as_deref().map(decode).transpose()
    }

    fn save(&mut self, tasks: &[Task]) -> DaybookResult<()> {
        if self.fail_saves {
            return Err(DaybookError::Persistence(
                "storage rejected the write".to_string(),
            ));
        }
        self.blob = Some(encode(tasks)?);
        Ok(())
    }
}

fn encode(tasks: &[Task]) -> DaybookResult<String> {
    serde_json::to_string(tasks).map_err(|e| DaybookError::Persistence(e.to_string()))
}

fn decode(raw: &str) -> DaybookResult<Vec<Task>> {
    serde_json::from_str(raw).map_err(|e| DaybookError::Persistence(e.to_string()))
}

/// Loads the stored snapshot, substituting `fallback` when nothing is stored
/// or the stored blob cannot be read. Storage errors never escape.
#[tracing::instrument(skip(gateway, fallback))]
pub fn load_or_else<G, F>(gateway: &G, fallback: F) -> TaskStore
where
    G: TaskGateway + ?Sized,
    F: FnOnce() -> TaskStore,
{
    match gateway.load() {
        Ok(Some(tasks)) => {
            debug!(count = tasks.len(), "loaded stored tasks");
            TaskStore::from_tasks(tasks)
        }
        Ok(None) => {
            info!("nothing stored yet; using defaults");
            fallback()
        }
        Err(err) => {
            warn!(error = %err, "stored tasks unreadable; using defaults");
            fallback()
        }
    }
}

pub fn load_or_seed<G>(gateway: &G, today: NaiveDate) -> TaskStore
where
    G: TaskGateway + ?Sized,
{
    load_or_else(gateway, || TaskStore::seeded(today))
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).expect("valid date")
    }

    #[test]
    fn file_gateway_round_trips_a_snapshot() {
        let dir = tempdir().expect("tempdir");
        let mut gateway = FileGateway::open(dir.path(), DEFAULT_STORAGE_KEY).expect("open");
        assert!(gateway.load().expect("load").is_none());

        let store = TaskStore::seeded(today());
        gateway.save(store.tasks()).expect("save");

        let loaded = gateway.load().expect("load").expect("stored tasks");
        assert_eq!(loaded, store.tasks());
        assert!(dir.path().join("todoTasks.json").exists());
    }

    #[test]
    fn malformed_blob_falls_back_to_seed() {
        let gateway = MemoryGateway::with_blob("{not json");
        assert!(matches!(gateway.load(), Err(DaybookError::Persistence(_))));

        let store = load_or_seed(&gateway, today());
        assert_eq!(store.len(), 5);
        assert_eq!(store.tasks()[0].text, "Buy groceries");
    }

    #[test]
    fn undecodable_file_names_its_path() {
        let dir = tempdir().expect("tempdir");
        let gateway = FileGateway::open(dir.path(), DEFAULT_STORAGE_KEY).expect("open");
        fs::write(
            gateway.path(),
            r#"[{"text":"Call mom","completed":false,"dueDate":"2023-1-5"}]"#,
        )
        .expect("write");

        match gateway.load() {
            Err(DaybookError::Persistence(msg)) => {
                assert!(msg.contains(&gateway.path().display().to_string()));
            }
            other => panic!("expected persistence error, got {other:?}"),
        }
        assert!(gateway.path().exists());
    }

    #[test]
    fn absent_blob_uses_fallback_and_stored_blob_wins() {
        let gateway = MemoryGateway::new();
        let store = load_or_else(&gateway, TaskStore::new);
        assert!(store.is_empty());

        let gateway = MemoryGateway::with_blob(
            r#"[{"text":"Buy milk","completed":false,"dueDate":null}]"#,
        );
        let store = load_or_seed(&gateway, today());
        assert_eq!(store.len(), 1);
        assert_eq!(store.tasks()[0].text, "Buy milk");
    }

    #[test]
    fn rejects_keys_that_escape_the_data_dir() {
        let dir = tempdir().expect("tempdir");
        assert!(FileGateway::open(dir.path(), "../tasks").is_err());
        assert!(FileGateway::open(dir.path(), " ").is_err());
    }
}
