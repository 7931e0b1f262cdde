// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the configuration crate.
//!
//! This module defines the error types surfaced by the configuration stores.
//! Backend failures keep their own type ([`BackendError`]) and travel inside
//! [`ConfigError`] as the `source`, so callers can still tell a conflict from
//! a missing node after the store has classified the failure.

use crate::ports::BackendError;
use thiserror::Error;

/// The main error type for configuration operations.
///
/// It is marked as `#[non_exhaustive]` to allow for future additions without
/// breaking backwards compatibility.
///
/// # Examples
///
/// ```
/// use etcdcfg::domain::errors::ConfigError;
///
/// fn lookup() -> Result<String, ConfigError> {
///     Err(ConfigError::NodeNotFound {
///         path: "database.host".to_string(),
///         source: None,
///     })
/// }
///
/// assert!(lookup().unwrap_err().is_not_found());
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The initial tree could not be loaded from the backend.
    ///
    /// This is fatal at construction time: no store is returned.
    #[error("Failed to load configuration root '{root}': {message}")]
    LoadFailure {
        /// The configured root node
        root: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A required node does not exist.
    #[error("Configuration node not found: {path}")]
    NodeNotFound {
        /// The path that was looked up
        path: String,
        /// The backend error, when the miss came from the backend
        #[source]
        source: Option<BackendError>,
    },

    /// The backend rejected a write.
    #[error("Update of '{path}' forbidden: {source}")]
    UpdateForbidden {
        /// The path being written
        path: String,
        /// The underlying backend error
        #[source]
        source: BackendError,
    },

    /// A path could not be parsed or joined.
    #[error("Invalid configuration path '{path}': {reason}")]
    InvalidPath {
        /// The offending path or segment
        path: String,
        /// Why it was rejected
        reason: String,
    },

    /// A backend error passed through without reclassification.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Connection or store settings are missing or malformed.
    #[error("Invalid settings: {message}")]
    Settings {
        /// The error message
        message: String,
    },
}

impl ConfigError {
    /// Returns the backend error carried by this error, if any.
    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            ConfigError::NodeNotFound { source, .. } => source.as_ref(),
            ConfigError::UpdateForbidden { source, .. } => Some(source),
            ConfigError::Backend(source) => Some(source),
            ConfigError::LoadFailure {
                source: Some(source),
                ..
            } => source.downcast_ref::<BackendError>(),
            _ => None,
        }
    }

    /// True for `NodeNotFound` and for backend `NotFound` errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::NodeNotFound { .. })
            || matches!(self.backend_error(), Some(BackendError::NotFound { .. }))
    }

    /// True when the backend refused a write because of a leaf/directory clash.
    pub fn is_conflict(&self) -> bool {
        matches!(self.backend_error(), Some(BackendError::Conflict { .. }))
    }

    pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// A specialized Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
