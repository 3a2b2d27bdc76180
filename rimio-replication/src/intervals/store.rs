use crate::config::LogConfig;
use crate::error::{ReplError, Result};
use crate::intervals::log::IntervalVersionLog;
use std::path::{Path, PathBuf};

/// IntervalLogStore keeps one interval log per file:
/// `{dir}/{file_id}.ivl`.
pub struct IntervalLogStore {
    config: LogConfig,
}

impl IntervalLogStore {
    pub fn new(config: LogConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.dir)?;
        Ok(Self { config })
    }

    pub fn base_path(&self) -> &Path {
        &self.config.dir
    }

    /// Opens the log of `file_id`, replaying whatever it already holds.
    pub fn open(&self, file_id: &str) -> Result<IntervalVersionLog> {
        let path = self.log_path(file_id)?;
        IntervalVersionLog::open(path, &self.config)
    }

    pub fn exists(&self, file_id: &str) -> bool {
        self.log_path(file_id)
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    pub fn delete(&self, file_id: &str) -> Result<()> {
        let path = self.log_path(file_id)?;
        if path.exists() {
            std::fs::remove_file(&path)?;
            tracing::info!("Deleted interval log for file {}", file_id);
        }
        Ok(())
    }

    pub fn log_path(&self, file_id: &str) -> Result<PathBuf> {
        validate_file_id(file_id)?;
        Ok(self.config.dir.join(format!("{}.ivl", file_id)))
    }
}

fn validate_file_id(file_id: &str) -> Result<()> {
    if file_id.is_empty() {
        return Err(ReplError::InvalidRequest(
            "file id cannot be empty".to_string(),
        ));
    }
    if file_id == "." || file_id == ".." || file_id.contains(['/', '\\']) {
        return Err(ReplError::InvalidRequest(format!(
            "invalid file id: {}",
            file_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intervals::tree::Interval;

    fn store(dir: &Path) -> IntervalLogStore {
        IntervalLogStore::new(LogConfig {
            dir: dir.join("logs"),
            sync_on_append: false,
            truncate_corrupt_tail: false,
        })
        .unwrap()
    }

    #[test]
    fn logs_are_kept_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let mut a = store.open("1:1").unwrap();
        let mut b = store.open("1:2").unwrap();
        a.append(Interval::new(0, 100, 1).unwrap()).unwrap();
        b.append(Interval::new(0, 50, 9).unwrap()).unwrap();
        b.append(Interval::new(50, 100, 10).unwrap()).unwrap();
        drop(a);
        drop(b);

        assert!(store.exists("1:1"));
        assert_eq!(store.open("1:1").unwrap().records(), 1);
        assert_eq!(store.open("1:2").unwrap().tree().len(), 2);

        store.delete("1:1").unwrap();
        assert!(!store.exists("1:1"));
        assert!(store.open("1:1").unwrap().tree().is_empty());
    }

    #[test]
    fn rejects_path_like_file_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        for bad in ["", ".", "..", "a/b", "..\\x"] {
            assert!(matches!(
                store.log_path(bad),
                Err(ReplError::InvalidRequest(_))
            ));
        }
        assert!(!store.exists("a/b"));
    }
}
