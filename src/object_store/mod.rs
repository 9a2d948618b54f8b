/*!
 * Object store abstraction shared by all cooperating workers.
 *
 * The store is the only channel workers have in common: it holds the input
 * media, the output subtitle tracks, the claim catalog and the lock object
 * that serializes catalog updates. The trait keeps the transport out of the
 * coordination logic; `FsStore` is the bundled directory-rooted backend.
 */

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt::Debug;
use std::path::Path;

use crate::errors::StoreError;

pub mod fs;

pub use fs::FsStore;

/// Outcome of an exclusive create attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The object was created by this call
    Created,
    /// An object already exists at the path
    AlreadyExists,
}

/// Common trait for object store backends
///
/// All paths are store keys: `/`-separated, relative to the store root.
#[async_trait]
pub trait ObjectStore: Send + Sync + Debug {
    /// List object paths under a prefix. Ordering must be deterministic
    /// for a given store state.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Download an object to a local file.
    ///
    /// Fails if the resulting local file is absent or zero-length.
    async fn download(&self, path: &str, dest: &Path) -> Result<(), StoreError>;

    /// Upload a local file, creating any needed parent markers.
    async fn upload(&self, src: &Path, path: &str) -> Result<(), StoreError>;

    /// Read a JSON object document. Returns an empty map when the object
    /// is absent - "not found" is never an error here.
    async fn read_json(&self, path: &str) -> Result<Map<String, Value>, StoreError>;

    /// Write a JSON document, creating any needed parent markers.
    async fn write_json(&self, document: &Value, path: &str) -> Result<(), StoreError>;

    /// Atomically create an object if and only if nothing exists at the path.
    ///
    /// This is the synchronization primitive the claim protocol relies on:
    /// the backend must guarantee at most one concurrent caller observes
    /// `Created`.
    async fn create_if_absent(&self, path: &str, content: &str) -> Result<CreateOutcome, StoreError>;

    /// Read an object's content as a UTF-8 string.
    async fn read_to_string(&self, path: &str) -> Result<String, StoreError>;

    /// Delete an object. Idempotent - deleting a missing object is not an error.
    async fn delete(&self, path: &str) -> Result<(), StoreError>;
}
