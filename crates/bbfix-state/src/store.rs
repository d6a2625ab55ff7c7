//! Load/save/lock over the persisted state directory.

use crate::lock::LockGuard;
use bbfix_api::{Config, Error, MachineSnapshot, NotifyCache, RepoMetadata};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Resolves the state root: `$BB_STATE_DIR` if set, else
/// `~/.local/share/bb`.
pub fn default_state_root() -> PathBuf {
    if let Ok(dir) = std::env::var("BB_STATE_DIR") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".local/share/bb")
}

/// Escapes a repo key into a filesystem-safe basename: `/` becomes `__`.
pub fn safe_repo_filename(repo_key: &str) -> String {
    repo_key.replace('/', "__")
}

pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        std::fs::create_dir_all(root.join("machine"))
            .map_err(|e| Error::state_io(format!("failed to create state dir: {e}")))?;
        std::fs::create_dir_all(root.join("repos"))
            .map_err(|e| Error::state_io(format!("failed to create state dir: {e}")))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lock_path(&self) -> PathBuf {
        self.root.join("bb-fix.lock")
    }

    pub fn acquire_lock(&self) -> Result<LockGuard, Error> {
        LockGuard::acquire(&self.lock_path())
    }

    fn config_path(&self) -> PathBuf {
        self.root.join("config.yaml")
    }

    fn machine_path(&self, machine_id: &str) -> PathBuf {
        self.root.join("machine").join(format!("{machine_id}.yaml"))
    }

    fn repo_path(&self, repo_key: &str) -> PathBuf {
        self.root
            .join("repos")
            .join(format!("{}.yaml", safe_repo_filename(repo_key)))
    }

    fn notify_cache_path(&self) -> PathBuf {
        self.root.join("notify-cache.yaml")
    }

    pub fn load_config(&self) -> Result<Config, Error> {
        load_yaml_or_default(&self.config_path())
    }

    pub fn save_config(&self, config: &Config) -> Result<(), Error> {
        atomic_write_yaml(&self.config_path(), config)
    }

    pub fn load_snapshot(&self, machine_id: &str) -> Result<Option<MachineSnapshot>, Error> {
        load_yaml_optional(&self.machine_path(machine_id))
    }

    pub fn save_snapshot(&self, snapshot: &MachineSnapshot) -> Result<(), Error> {
        atomic_write_yaml(&self.machine_path(&snapshot.machine_id), snapshot)
    }

    pub fn load_metadata(&self, repo_key: &str) -> Result<Option<RepoMetadata>, Error> {
        load_yaml_optional(&self.repo_path(repo_key))
    }

    pub fn save_metadata(&self, metadata: &RepoMetadata) -> Result<(), Error> {
        atomic_write_yaml(&self.repo_path(&metadata.repo_key), metadata)
    }

    /// Removes the metadata file at `old_key` and writes it under its new
    /// key; used by `move-to-catalog`.
    pub fn rename_metadata(&self, old_key: &str, metadata: &RepoMetadata) -> Result<(), Error> {
        self.save_metadata(metadata)?;
        let old_path = self.repo_path(old_key);
        if old_path != self.repo_path(&metadata.repo_key) {
            let _ = std::fs::remove_file(old_path);
        }
        Ok(())
    }

    pub fn load_all_metadata(&self) -> Result<Vec<RepoMetadata>, Error> {
        let dir = self.root.join("repos");
        let mut out = Vec::new();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(Error::state_io(format!("failed to list repo metadata: {e}"))),
        };
        for entry in entries {
            let entry = entry.map_err(|e| Error::state_io(format!("failed to read dir entry: {e}")))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            if let Some(meta) = load_yaml_optional::<RepoMetadata>(&path)? {
                out.push(meta);
            }
        }
        Ok(out)
    }

    pub fn load_notify_cache(&self) -> Result<NotifyCache, Error> {
        load_yaml_or_default(&self.notify_cache_path())
    }

    pub fn save_notify_cache(&self, cache: &NotifyCache) -> Result<(), Error> {
        atomic_write_yaml(&self.notify_cache_path(), cache)
    }
}

fn load_yaml_optional<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, Error> {
    match std::fs::read(path) {
        Ok(bytes) => serde_yaml::from_slice(&bytes)
            .map(Some)
            .map_err(|e| Error::state_io(format!("failed to parse {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::state_io(format!("failed to read {}: {e}", path.display()))),
    }
}

fn load_yaml_or_default<T: serde::de::DeserializeOwned + Default>(path: &Path) -> Result<T, Error> {
    Ok(load_yaml_optional(path)?.unwrap_or_default())
}

/// Writes `value` to `path` atomically: serialize to a sibling `.tmp` file,
/// `fsync`, then `rename` over the target.
fn atomic_write_yaml<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::state_io("state path has no parent directory"))?;
    std::fs::create_dir_all(parent)
        .map_err(|e| Error::state_io(format!("failed to create state dir: {e}")))?;

    let yaml = serde_yaml::to_string(value)
        .map_err(|e| Error::state_io(format!("failed to serialize {}: {e}", path.display())))?;

    let tmp_path = path.with_extension("yaml.tmp");
    {
        let mut tmp = std::fs::File::create(&tmp_path)
            .map_err(|e| Error::state_io(format!("failed to create temp file: {e}")))?;
        tmp.write_all(yaml.as_bytes())
            .map_err(|e| Error::state_io(format!("failed to write temp file: {e}")))?;
        tmp.sync_all()
            .map_err(|e| Error::state_io(format!("failed to fsync temp file: {e}")))?;
    }
    std::fs::rename(&tmp_path, path)
        .map_err(|e| Error::state_io(format!("failed to rename temp file into place: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbfix_api::RepoMetadata;

    #[test]
    fn save_and_load_metadata_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();
        let meta = RepoMetadata::new("software/api", "api");
        store.save_metadata(&meta).unwrap();
        let loaded = store.load_metadata("software/api").unwrap().unwrap();
        assert_eq!(loaded, meta);
    }

    #[test]
    fn load_metadata_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();
        assert!(store.load_metadata("nope").unwrap().is_none());
    }

    #[test]
    fn safe_filename_escapes_catalog_separator() {
        assert_eq!(safe_repo_filename("software/api"), "software__api");
    }

    #[test]
    fn rename_metadata_removes_old_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();
        let mut meta = RepoMetadata::new("software/api", "api");
        store.save_metadata(&meta).unwrap();
        meta.rename_to("references/api");
        store.rename_metadata("software/api", &meta).unwrap();
        assert!(store.load_metadata("software/api").unwrap().is_none());
        assert!(store.load_metadata("references/api").unwrap().is_some());
    }

    #[test]
    fn load_all_metadata_lists_every_repo() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();
        store.save_metadata(&RepoMetadata::new("a", "a")).unwrap();
        store.save_metadata(&RepoMetadata::new("b", "b")).unwrap();
        let all = store.load_all_metadata().unwrap();
        assert_eq!(all.len(), 2);
    }
}
