//! Document storage: reading and atomically rewriting the JSON data file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::document::{Decoded, Document, DATA_FILE_NAME};

/// Errors that can occur during document storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O error reading or writing a file.
    #[error("I/O error for {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    /// The file exists but does not hold a usable document.
    #[error("Failed to parse document {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The in-memory document could not be encoded.
    #[error("Failed to encode document: {0}")]
    Encode(serde_json::Error),
}

/// Storage for the single data document.
///
/// Writes go to a sibling `<file>.tmp` first and are renamed over the target,
/// so a crash mid-write leaves the previous file intact.
#[derive(Debug, Clone)]
pub struct DocumentStorage {
    path: PathBuf,
}

impl DocumentStorage {
    /// Creates a storage instance for an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a storage instance for `path`, moving the file to the system
    /// temp directory when the target directory cannot be written.
    pub fn resolve(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        match probe_writable(&dir) {
            Ok(()) => Self::new(path),
            Err(e) => {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_os_string())
                    .unwrap_or_else(|| DATA_FILE_NAME.into());
                let fallback = std::env::temp_dir().join(file_name);
                tracing::warn!(
                    "Data directory {} is not writable ({}), using {}",
                    dir.display(),
                    e,
                    fallback.display()
                );
                Self::new(fallback)
            }
        }
    }

    /// Returns the data file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the sibling path used for in-progress writes.
    pub fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DATA_FILE_NAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Checks if the data file exists on disk.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Size of the data file in bytes, 0 when it does not exist.
    pub fn file_size(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    /// Loads the document from disk.
    ///
    /// Returns `Ok(None)` if the file doesn't exist.
    /// Returns `Err` for other I/O or parsing errors.
    pub fn load(&self) -> Result<Option<Decoded>, StorageError> {
        match fs::read(&self.path) {
            Ok(bytes) => {
                let decoded = Document::from_json(&bytes).map_err(|source| StorageError::Parse {
                    path: self.path.clone(),
                    source,
                })?;
                Ok(Some(decoded))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Saves the document to disk, replacing the previous file atomically.
    ///
    /// Creates the data directory if it doesn't exist. On failure the
    /// temporary file is removed and the existing data file is untouched.
    pub fn save(&self, doc: &Document) -> Result<(), StorageError> {
        let bytes = doc.to_json().map_err(StorageError::Encode)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let temp_path = self.temp_path();
        let result = fs::write(&temp_path, &bytes)
            .map_err(|source| StorageError::Io {
                path: temp_path.clone(),
                source,
            })
            .and_then(|()| {
                fs::rename(&temp_path, &self.path).map_err(|source| StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            });

        if result.is_err() && temp_path.exists() {
            if let Err(e) = fs::remove_file(&temp_path) {
                tracing::warn!(
                    "Failed to remove temporary file {}: {}",
                    temp_path.display(),
                    e
                );
            }
        }

        result
    }
}

/// Creates `dir` if needed and checks a file can be written inside it.
fn probe_writable(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let probe = dir.join(".banquet_write_test.tmp");
    fs::write(&probe, b"test")?;
    fs::remove_file(&probe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ingredient;
    use tempfile::TempDir;

    fn test_storage() -> (DocumentStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = DocumentStorage::new(temp_dir.path().join(DATA_FILE_NAME));
        (storage, temp_dir)
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let storage = DocumentStorage::new("/data/dish_data.json");
        assert_eq!(storage.temp_path(), PathBuf::from("/data/dish_data.json.tmp"));
    }

    #[test]
    fn test_load_nonexistent_returns_none() {
        let (storage, _temp) = test_storage();
        assert!(storage.load().unwrap().is_none());
        assert!(!storage.exists());
        assert_eq!(storage.file_size(), 0);
    }

    #[test]
    fn test_save_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("data");
        let storage = DocumentStorage::new(nested.join(DATA_FILE_NAME));

        storage.save(&Document::new()).unwrap();

        assert!(nested.exists());
        assert!(storage.exists());
        assert!(storage.file_size() > 0);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let (storage, _temp) = test_storage();
        storage.save(&Document::new()).unwrap();
        assert!(!storage.temp_path().exists());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let (storage, _temp) = test_storage();

        let mut doc = Document::new();
        doc.ingredients
            .insert("1".into(), Ingredient::new("Pork", "kg", 30.0));
        storage.save(&doc).unwrap();

        let loaded = storage.load().unwrap().unwrap();
        assert!(!loaded.migrated);
        assert_eq!(loaded.document.ingredients, doc.ingredients);
    }

    #[test]
    fn test_overwrite_existing_document() {
        let (storage, _temp) = test_storage();

        let mut first = Document::new();
        first
            .ingredients
            .insert("1".into(), Ingredient::new("Pork", "kg", 30.0));
        storage.save(&first).unwrap();

        let second = Document::new();
        storage.save(&second).unwrap();

        let loaded = storage.load().unwrap().unwrap();
        assert!(loaded.document.ingredients.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_is_parse_error() {
        let (storage, _temp) = test_storage();
        fs::write(storage.path(), "{ not valid json").unwrap();

        let err = storage.load().unwrap_err();
        assert!(matches!(err, StorageError::Parse { .. }));
        assert!(err.to_string().contains("Failed to parse document"));
    }

    #[test]
    fn test_save_failure_cleans_temp_file() {
        let (storage, temp) = test_storage();
        // A directory where the data file should be makes the rename fail.
        fs::create_dir_all(storage.path().join("blocker")).unwrap();

        let result = storage.save(&Document::new());
        assert!(result.is_err());
        assert!(!storage.temp_path().exists());
        assert!(temp.path().join(DATA_FILE_NAME).is_dir());
    }

    #[test]
    fn test_uncleanable_temp_path_keeps_write_error() {
        let (storage, _temp) = test_storage();
        // A directory at the temp path fails the write and cannot be removed as a file.
        fs::create_dir_all(storage.temp_path().join("stuck")).unwrap();

        let err = storage.save(&Document::new()).unwrap_err();
        match err {
            StorageError::Io { path, .. } => assert_eq!(path, storage.temp_path()),
            other => panic!("unexpected error: {}", other),
        }
        assert!(storage.temp_path().is_dir());
        assert!(!storage.exists());
    }

    #[test]
    fn test_resolve_keeps_writable_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(DATA_FILE_NAME);

        let storage = DocumentStorage::resolve(&path);
        assert_eq!(storage.path(), path.as_path());
    }

    #[test]
    fn test_resolve_falls_back_to_temp_dir() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file in place of the directory cannot be created into.
        let blocker = temp_dir.path().join("not_a_dir");
        fs::write(&blocker, "x").unwrap();

        let storage = DocumentStorage::resolve(blocker.join(DATA_FILE_NAME));
        assert_eq!(
            storage.path(),
            std::env::temp_dir().join(DATA_FILE_NAME).as_path()
        );
    }
}
