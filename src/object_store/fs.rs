use async_trait::async_trait;
use log::debug;
use serde_json::{Map, Value};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::StoreError;
use crate::object_store::{CreateOutcome, ObjectStore};

// @module: Directory-rooted object store backend

/// Object store backed by a directory tree.
///
/// Keys map 1:1 to paths under the root. `create_if_absent` uses the
/// filesystem's exclusive-create flag, which gives the atomicity the claim
/// lock needs as long as all workers share the same filesystem.
#[derive(Debug, Clone)]
pub struct FsStore {
    /// Root directory holding all objects
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at the given directory, creating it if needed
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(FsStore { root })
    }

    /// Resolve a store key to an absolute path under the root
    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    /// Ensure the parent directory of a key exists, dropping a `.placeholder`
    /// marker the way remote stores surface empty "directories"
    fn ensure_parent_marker(&self, path: &str) -> Result<(), StoreError> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
            let marker = parent.join(".placeholder");
            if !marker.exists() {
                fs::write(&marker, b"")?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FsStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let base = self.resolve(prefix);
        if !base.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in WalkDir::new(&base).follow_links(true) {
            let entry = entry.map_err(|e| StoreError::Io(e.to_string()))?;
            if !entry.path().is_file() {
                continue;
            }
            if entry.file_name() == ".placeholder" {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| StoreError::Io(e.to_string()))?;
            keys.push(relative.to_string_lossy().replace('\\', "/"));
        }

        // Deterministic listing order
        keys.sort();
        Ok(keys)
    }

    async fn download(&self, path: &str, dest: &Path) -> Result<(), StoreError> {
        let src = self.resolve(path);
        if !src.exists() {
            return Err(StoreError::NotFound(path.to_string()));
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&src, dest)?;

        // Verify download
        let size = fs::metadata(dest).map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(StoreError::EmptyDownload(path.to_string()));
        }

        debug!("Downloaded {} ({} bytes)", path, size);
        Ok(())
    }

    async fn upload(&self, src: &Path, path: &str) -> Result<(), StoreError> {
        if !src.exists() {
            return Err(StoreError::Io(format!(
                "Upload source does not exist: {}",
                src.display()
            )));
        }

        self.ensure_parent_marker(path)?;
        fs::copy(src, self.resolve(path))?;
        debug!("Uploaded {} -> {}", src.display(), path);
        Ok(())
    }

    async fn read_json(&self, path: &str) -> Result<Map<String, Value>, StoreError> {
        let full = self.resolve(path);
        if !full.exists() {
            return Ok(Map::new());
        }

        let content = fs::read_to_string(&full)?;
        let value: Value =
            serde_json::from_str(&content).map_err(|e| StoreError::InvalidDocument {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        match value {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::InvalidDocument {
                path: path.to_string(),
                message: format!("expected a JSON object, found {}", json_type_name(&other)),
            }),
        }
    }

    async fn write_json(&self, document: &Value, path: &str) -> Result<(), StoreError> {
        self.ensure_parent_marker(path)?;
        let content = serde_json::to_string_pretty(document)
            .map_err(|e| StoreError::Io(format!("Failed to serialize JSON document: {}", e)))?;
        fs::write(self.resolve(path), content)?;
        Ok(())
    }

    async fn create_if_absent(&self, path: &str, content: &str) -> Result<CreateOutcome, StoreError> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }

        // O_CREAT|O_EXCL - fails if an object already exists at the path
        match OpenOptions::new().write(true).create_new(true).open(&full) {
            Ok(mut file) => {
                file.write_all(content.as_bytes())?;
                Ok(CreateOutcome::Created)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(CreateOutcome::AlreadyExists),
            Err(e) => Err(StoreError::from(e)),
        }
    }

    async fn read_to_string(&self, path: &str) -> Result<String, StoreError> {
        let full = self.resolve(path);
        if !full.exists() {
            return Err(StoreError::NotFound(path.to_string()));
        }
        Ok(fs::read_to_string(&full)?)
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.resolve(path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::from(e)),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
