//! The internal error type shared by every ghostbus crate.

/// Result type for operations that can only fail on a ghostbus bug.
///
/// Authoring mistakes in the input design (overlapping addresses, ambiguous
/// bus domains, name collisions) are reported through each crate's own error
/// enum. `InternalError` is reserved for broken invariants inside the tool.
pub type GbResult<T> = Result<T, InternalError>;

/// A broken internal invariant, i.e. a bug in ghostbus rather than in the design.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("internal error: {message} (this is a bug in ghostbus)")]
pub struct InternalError {
    /// Description of the violated invariant.
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
    fn display_marks_bug() {
        let err = InternalError::new("vacant list not sorted");
        assert_eq!(
            format!("{err}"),
            "internal error: vacant list not sorted (this is a bug in ghostbus)"
        );
    }

    #[test]
    fn err_path() {
        let r: GbResult<u64> = Err(InternalError::new("gap at 0x10"));
        assert_eq!(r.unwrap_err().message, "gap at 0x10");
    }

    #[test]
    fn from_string() {
        let err: InternalError = format!("overlap at {:#x}", 0x20).into();
        assert_eq!(err.message, "overlap at 0x20");
    }
}
