//! Applied sets stored as JSON files, one per root key.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use dbrefactor_core::AppliedSet;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::traits::{AppliedStore, storage_key};

/// File-backed store. Each root key maps to `<dir>/dbrefactor.applied.<root key>.json`,
/// with the root key form-url-encoded so any string is a safe file name.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `root_key`'s record.
    pub fn path_for(&self, root_key: &str) -> PathBuf {
        let encoded: String = url::form_urlencoded::byte_serialize(root_key.as_bytes()).collect();
        self.dir.join(format!("{}.json", storage_key(&encoded)))
    }
}

impl AppliedStore for FileStore {
    fn load(&self, root_key: &str) -> AppliedSet {
        let path = self.path_for(root_key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return AppliedSet::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read applied set, treating as empty");
                return AppliedSet::new();
            }
        };

        match serde_json::from_str::<AppliedSet>(&content) {
            Ok(applied) => {
                debug!(root_key, count = applied.len(), "loaded applied set");
                applied
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt applied set, treating as empty");
                AppliedSet::new()
            }
        }
    }

    fn save(&self, root_key: &str, applied: &AppliedSet) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => StorageError::unavailable(format!(
                "cannot create {}: {e}",
                self.dir.display()
            )),
            _ => e.into(),
        })?;
        let path = self.path_for(root_key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(applied)?)?;
        fs::rename(&tmp, &path)?;
        debug!(root_key, count = applied.len(), path = %path.display(), "saved applied set");
        Ok(())
    }

    fn clear(&self, root_key: &str) -> Result<bool, StorageError> {
        match fs::remove_file(self.path_for(root_key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbrefactor_core::Fingerprint;

    fn set_of(items: &[&str]) -> AppliedSet {
        items.iter().copied().map(Fingerprint::from).collect()
    }

    #[test]
    fn test_missing_record_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.load("SOLUTION").is_empty());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        let applied = set_of(&["-1204334861", "42", "7"]);

        store.save("SOLUTION", &applied).unwrap();
        assert_eq!(store.load("SOLUTION"), applied);
    }

    #[test]
    fn test_payload_is_a_json_array_of_strings() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.save("SOLUTION", &set_of(&["2", "1"])).unwrap();

        let path = dir.path().join("dbrefactor.applied.SOLUTION.json");
        let raw = fs::read_to_string(path).unwrap();
        assert_eq!(raw, r#"["1","2"]"#);
    }

    #[test]
    fn test_corrupt_payload_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        fs::write(store.path_for("SOLUTION"), "{not json").unwrap();
        assert!(store.load("SOLUTION").is_empty());

        fs::write(store.path_for("SOLUTION"), r#"{"hashes": []}"#).unwrap();
        assert!(store.load("SOLUTION").is_empty());
    }

    #[test]
    fn test_root_keys_with_path_characters() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let key = "C:/repos/shop api";
        let path = store.path_for(key);
        assert_eq!(path.parent(), Some(dir.path()));

        store.save(key, &set_of(&["5"])).unwrap();
        assert_eq!(store.load(key).len(), 1);
        assert!(store.load("C:/repos/shop").is_empty());
    }

    #[test]
    fn test_unusable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("applied");
        fs::write(&blocker, "not a directory").unwrap();
        let store = FileStore::new(&blocker);

        let err = store.save("SOLUTION", &set_of(&["1"])).unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
        assert!(store.load("SOLUTION").is_empty());
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.save("SOLUTION", &set_of(&["1"])).unwrap();
        assert!(store.clear("SOLUTION").unwrap());
        assert!(!store.clear("SOLUTION").unwrap());
        assert!(store.load("SOLUTION").is_empty());
    }
}
