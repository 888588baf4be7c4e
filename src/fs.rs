use anyhow::{Context, Result};
use fs2::FileExt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Abstraction over file system operations for testing
pub trait FileSystem: Send + Sync {
    /// Read file contents as a string
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Write string contents to a file in place
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    /// Replace a file's contents so readers never observe a partial write
    fn atomic_write(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if a path is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Create a directory and all parent directories
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Run `action` while holding an exclusive advisory lock associated with `path`
    fn with_exclusive_lock<T, A>(&self, path: &Path, action: A) -> Result<T>
    where
        A: FnOnce() -> Result<T>;
}

/// Real file system implementation using std::fs
#[derive(Debug, Default, Clone)]
pub struct RealFileSystem;

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        Ok(std::fs::write(path, contents)?)
    }

    fn atomic_write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        // The temp file lives next to the target so the final rename never crosses devices.
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        tmp.write_all(contents)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        Ok(std::fs::create_dir_all(path)?)
    }

    fn with_exclusive_lock<T, A>(&self, path: &Path, action: A) -> Result<T>
    where
        A: FnOnce() -> Result<T>,
    {
        let lock_path = lock_path_for(path);
        let lock_file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;
        lock_file
            .lock_exclusive()
            .with_context(|| format!("Failed to lock {}", path.display()))?;

        let result = action();

        let _ = FileExt::unlock(&lock_file);
        drop(lock_file);
        let _ = std::fs::remove_file(&lock_path);
        result
    }
}

/// In-memory file system for testing
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, RwLock};

    #[derive(Debug, Default, Clone)]
    pub struct InMemoryFileSystem {
        files: Arc<RwLock<HashMap<PathBuf, String>>>,
        directories: Arc<RwLock<HashSet<PathBuf>>>,
        read_only: Arc<RwLock<HashSet<PathBuf>>>,
    }

    impl InMemoryFileSystem {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a file to the mock file system
        pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<String>) {
            let path = path.as_ref().to_path_buf();
            if let Some(parent) = path.parent() {
                self.register_dirs(parent);
            }
            self.files.write().unwrap().insert(path, contents.into());
        }

        /// Make every subsequent write to `path` fail
        pub fn deny_writes(&self, path: impl AsRef<Path>) {
            self.read_only
                .write()
                .unwrap()
                .insert(path.as_ref().to_path_buf());
        }

        pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
            self.files.read().unwrap().get(path.as_ref()).cloned()
        }

        fn register_dirs(&self, path: &Path) {
            let mut current = PathBuf::new();
            for component in path.components() {
                current.push(component);
                self.directories.write().unwrap().insert(current.clone());
            }
        }

        fn check_writable(&self, path: &Path) -> Result<()> {
            if self.read_only.read().unwrap().contains(path) {
                anyhow::bail!("Permission denied: {}", path.display());
            }
            Ok(())
        }
    }

    impl FileSystem for InMemoryFileSystem {
        fn read_to_string(&self, path: &Path) -> Result<String> {
            self.files
                .read()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("File not found: {}", path.display()))
        }

        fn write(&self, path: &Path, contents: &str) -> Result<()> {
            self.check_writable(path)?;
            self.files
                .write()
                .unwrap()
                .insert(path.to_path_buf(), contents.to_string());
            Ok(())
        }

        fn atomic_write(&self, path: &Path, contents: &[u8]) -> Result<()> {
            let text = String::from_utf8(contents.to_vec())?;
            self.write(path, &text)
        }

        fn exists(&self, path: &Path) -> bool {
            self.files.read().unwrap().contains_key(path)
                || self.directories.read().unwrap().contains(path)
        }

        fn is_file(&self, path: &Path) -> bool {
            self.files.read().unwrap().contains_key(path)
        }

        fn create_dir_all(&self, path: &Path) -> Result<()> {
            self.register_dirs(path);
            Ok(())
        }

        fn with_exclusive_lock<T, A>(&self, _path: &Path, action: A) -> Result<T>
        where
            A: FnOnce() -> Result<T>,
        {
            action()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_replaces_contents_and_cleans_up_lock() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("fr.json");
        std::fs::write(&target, "{}").unwrap();

        let fs = RealFileSystem;
        fs.with_exclusive_lock(&target, || fs.atomic_write(&target, b"{\"a\": \"b\"}"))
            .unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "{\"a\": \"b\"}");
        assert!(!lock_path_for(&target).exists());
    }

    #[test]
    fn lock_path_sits_next_to_target() {
        assert_eq!(
            lock_path_for(Path::new("locales/en.json")),
            PathBuf::from("locales/en.json.lock")
        );
    }

    #[test]
    fn in_memory_file_system_tracks_files_and_dirs() {
        use mock::InMemoryFileSystem;

        let fs = InMemoryFileSystem::new();
        fs.add_file("locales/en.json", "{}");

        assert!(fs.exists(Path::new("locales/en.json")));
        assert!(fs.is_file(Path::new("locales/en.json")));
        assert!(fs.exists(Path::new("locales")));
        assert!(!fs.is_file(Path::new("locales")));

        fs.atomic_write(Path::new("locales/fr.json"), b"{}").unwrap();
        assert_eq!(fs.contents("locales/fr.json").as_deref(), Some("{}"));

        fs.deny_writes("locales/fr.json");
        assert!(fs.write(Path::new("locales/fr.json"), "x").is_err());
    }
}
