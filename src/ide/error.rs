//! Error types for host requests.

use std::sync::Arc;

use thiserror::Error;

/// Request-level failures. The registry is never touched when one occurs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The loader has no project under this URI.
    #[error("Project not found: {0}")]
    ProjectNotFound(Arc<str>),

    /// No member of the project owns this file.
    #[error("File not found: {0}")]
    FileNotFound(Arc<str>),

    /// The project has no member of this name.
    #[error("Member not found: {0}")]
    MemberNotFound(Arc<str>),

    /// The request was cancelled before it committed.
    #[error("Request cancelled")]
    Cancelled,
}

impl HostError {
    /// Create a project-not-found error.
    pub fn project_not_found(uri: impl Into<Arc<str>>) -> Self {
        Self::ProjectNotFound(uri.into())
    }

    /// Create a file-not-found error.
    pub fn file_not_found(path: impl Into<Arc<str>>) -> Self {
        Self::FileNotFound(path.into())
    }
}

/// Result type for host requests.
pub type HostResult<T> = Result<T, HostError>;
