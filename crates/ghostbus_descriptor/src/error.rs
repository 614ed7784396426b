//! Errors raised while building address-map descriptors.

/// The address map cannot be produced.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    /// Two entries map to the same key.
    #[error("duplicate address map key(s): {}", keys.join(", "))]
    NameCollision {
        /// The clashing keys.
        keys: Vec<String>,
    },

    /// Serializing the map failed.
    #[error("failed to serialize the address map: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing the map failed.
    #[error("failed to write {path}: {source}")]
    Io {
        /// Target file.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },
}
