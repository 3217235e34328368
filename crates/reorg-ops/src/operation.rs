//! Per-entry operation failures.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// An error that occurred on a single entry.
///
/// Operations collect these into their summaries and carry on with the
/// remaining entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    /// The path that caused the error.
    pub path: PathBuf,
    /// A human-readable error message.
    pub message: String,
}

impl OperationError {
    /// Create a new operation error.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an error from an I/O failure, logging it.
    pub(crate) fn io(path: &Path, action: &str, err: std::io::Error) -> Self {
        tracing::error!(path = %path.display(), "{action} failed: {err}");
        Self::new(path, format!("{action} failed: {err}"))
    }
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

impl std::error::Error for OperationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = OperationError::new("/data/a.txt", "Permission denied");
        assert_eq!(err.to_string(), "/data/a.txt: Permission denied");
    }

    #[test]
    fn test_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = OperationError::io(Path::new("/x"), "Delete", io);
        assert_eq!(err.message, "Delete failed: gone");
    }
}
