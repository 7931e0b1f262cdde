// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value backend trait definition.
//!
//! This module defines the `KvBackend` trait, the port through which the
//! stores reach the flat, path-keyed key-value store holding canonical
//! configuration. Paths are absolute and slash-delimited (`/svc/db/host`).

use thiserror::Error;

/// Entries of a subtree query: paths relative to the queried node, mapped to
/// their scalar values, in listing order.
///
/// A query on a leaf yields a single entry with an empty relative path.
pub type Subtree = Vec<(String, String)>;

/// What lives at a backend path, as reported by [`KvBackend::list_children`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Listing {
    /// The path is a leaf holding this value.
    Leaf(String),
    /// The path is a directory with these immediate children.
    Directory(Vec<String>),
}

/// Errors reported by a backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    /// Nothing exists at the path.
    #[error("Key not found: {path}")]
    NotFound {
        /// The missing path
        path: String,
    },

    /// The operation clashes with the leaf/directory shape of the keyspace:
    /// a scalar written over a directory, a key created below a leaf, or a
    /// non-recursive delete of a non-empty directory.
    #[error("Conflict at '{path}': {message}")]
    Conflict {
        /// The conflicting path
        path: String,
        /// What clashed
        message: String,
    },

    /// The backend could not be reached or answered with an error.
    #[error("Backend transport error: {message}")]
    Transport {
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl BackendError {
    pub(crate) fn not_found(path: &str) -> Self {
        BackendError::NotFound {
            path: path.to_string(),
        }
    }

    pub(crate) fn conflict(path: &str, message: impl Into<String>) -> Self {
        BackendError::Conflict {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

/// A specialized Result type for backend operations.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// A flat key-value store that emulates directories through key paths.
///
/// All calls are blocking. Implementations must be `Send + Sync`.
///
/// # Examples
///
/// ```rust
/// use etcdcfg::adapters::InMemoryBackend;
/// use etcdcfg::ports::{KvBackend, Listing};
///
/// let backend = InMemoryBackend::new();
/// backend.set_scalar("/svc/db/host", "localhost").unwrap();
///
/// assert_eq!(
///     backend.get_subtree("/svc").unwrap(),
///     vec![("db/host".to_string(), "localhost".to_string())]
/// );
/// assert_eq!(
///     backend.list_children("/svc/db").unwrap(),
///     Listing::Directory(vec!["host".to_string()])
/// );
/// ```
pub trait KvBackend: Send + Sync {
    /// Returns the name of this backend, for logging.
    fn name(&self) -> &str;

    /// Returns every leaf below `path`, keyed by path relative to `path`.
    ///
    /// Fails with [`BackendError::NotFound`] when `path` does not exist. An
    /// existing but empty directory yields an empty subtree.
    fn get_subtree(&self, path: &str) -> BackendResult<Subtree>;

    /// Stores a scalar at `path`, creating parent directories as needed.
    ///
    /// Fails with [`BackendError::Conflict`] when `path` is a directory or
    /// any ancestor of `path` is a leaf.
    fn set_scalar(&self, path: &str, value: &str) -> BackendResult<()>;

    /// Deletes the leaf or directory at `path`.
    ///
    /// Without `recursive`, only leaves and empty directories are removed.
    fn delete_subtree(&self, path: &str, recursive: bool) -> BackendResult<()>;

    /// Reports whether `path` is a leaf or a directory without fetching the
    /// values below it.
    fn list_children(&self, path: &str) -> BackendResult<Listing>;

    /// Creates the directory marker at `path` if nothing is there yet.
    ///
    /// Succeeds when the directory already exists, and fails with
    /// [`BackendError::Conflict`] when `path` is a leaf.
    fn make_dir(&self, path: &str) -> BackendResult<()>;

    /// Checks whether anything exists at `path`.
    fn exists(&self, path: &str) -> BackendResult<bool> {
        match self.list_children(path) {
            Ok(_) => Ok(true),
            Err(BackendError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
