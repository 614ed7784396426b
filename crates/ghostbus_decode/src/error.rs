//! Errors raised while emitting decode logic.

use ghostbus_common::InternalError;

/// The resolved hierarchy cannot be expressed as decode logic.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// A register needs a bus net the domain's bus does not provide.
    #[error("{path}: '{element}' requires a '{role}' net on the bus; {hint}")]
    MissingBusRole {
        /// Hierarchical path of the declaring instance.
        path: String,
        /// Register or strobe name.
        element: String,
        /// Missing role.
        role: &'static str,
        /// How to declare it.
        hint: &'static str,
    },

    /// A recognized construct the generator does not handle.
    #[error("unsupported: {0}")]
    FeatureUnsupported(String),

    /// Writing generated files failed.
    #[error("failed to write {path}: {source}")]
    Io {
        /// Target file.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A broken internal invariant.
    #[error(transparent)]
    Internal(#[from] InternalError),
}
