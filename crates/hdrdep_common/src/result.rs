//! The internal error type shared by the hdrdep workspace.

/// An internal error indicating a bug in hdrdep or its environment, not a
/// user input problem.
///
/// User problems (an unresolved include, a missing source root) are reported
/// as diagnostics and never as `InternalError`.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("worker pool poisoned");
        assert_eq!(format!("{err}"), "internal error: worker pool poisoned");
    }

    #[test]
    fn from_string() {
        let err: InternalError = "from string".to_string().into();
        assert_eq!(err.message, "from string");
    }
}
