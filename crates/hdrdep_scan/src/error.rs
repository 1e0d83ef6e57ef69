//! Error types for directive construction.

/// Errors raised when constructing directive values.
///
/// Only malformed input at construction boundaries is an error. Unresolvable
/// or ambiguous includes are ordinary results, never errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// A required value was empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_argument() {
        let err = ScanError::InvalidArgument("include value cannot be empty".to_string());
        assert_eq!(
            err.to_string(),
            "invalid argument: include value cannot be empty"
        );
    }
}
