//! Domain error type shared across letterdesk crates.

/// Errors produced by domain-level operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Input failed validation (bad variant, bad category, bad filename).
    #[error("{0}")]
    Validation(String),

    /// A required file or directory does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The external roster analyzer failed or produced unusable output.
    #[error("roster analyzer failed: {0}")]
    Analyzer(String),

    /// An underlying file-system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_validation() {
        let err = CoreError::Validation("unknown workflow variant: sailing".into());
        assert_eq!(err.to_string(), "unknown workflow variant: sailing");
    }

    #[test]
    fn display_not_found() {
        let err = CoreError::NotFound("roster file".into());
        assert_eq!(err.to_string(), "roster file not found");
    }

    #[test]
    fn io_error_converts() {
        let inner = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked");
        let err: CoreError = inner.into();
        assert!(err.to_string().contains("locked"));
    }
}
