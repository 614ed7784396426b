//! Errors raised while building and resolving the memory-map hierarchy.

use ghostbus_common::InternalError;
use ghostbus_map::MapError;

/// A design that cannot be turned into a consistent memory map.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// An address placement failed inside one node's region.
    #[error(transparent)]
    Map(#[from] MapError),

    /// A module instantiates itself, directly or through other modules.
    #[error("circular instantiation: {}", modules.join(" -> "))]
    CircularInstantiation {
        /// Modules forming the cycle.
        modules: Vec<String>,
    },

    /// An element cannot be assigned to exactly one bus.
    #[error("{path}: cannot assign '{element}' to a bus: {reason}")]
    AmbiguousBusDomain {
        /// Hierarchical path of the declaring instance.
        path: String,
        /// Element name.
        element: String,
        /// Why the assignment failed.
        reason: String,
    },

    /// An element is not reachable from any declared bus.
    #[error("{path}: '{element}' is not reachable from any declared bus")]
    MissingBus {
        /// Hierarchical path of the declaring instance.
        path: String,
        /// Element name.
        element: String,
    },

    /// An element is wider than the bus it is attached to.
    #[error("{path}: '{element}' has {kind} width {width} but bus '{bus}' is only {bus_width} bits wide")]
    WidthMismatch {
        /// Hierarchical path of the declaring instance.
        path: String,
        /// Element name.
        element: String,
        /// `"data"` or `"address"`.
        kind: &'static str,
        /// Element width.
        width: u32,
        /// Bus label.
        bus: String,
        /// Bus width.
        bus_width: u32,
    },

    /// A recognized construct the generator does not handle.
    #[error("unsupported: {0}")]
    FeatureUnsupported(String),

    /// A broken internal invariant.
    #[error(transparent)]
    Internal(#[from] InternalError),
}
