//! Allocation errors.
//!
//! Every variant is an authoring error in the design except
//! [`MapError::Internal`]. A failed operation never modifies the space.

use ghostbus_common::InternalError;

/// Errors raised by [`AddressSpace`](crate::AddressSpace) and friends.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    /// A pinned base is not a multiple of the element size.
    #[error("{label}: address {base:#x} is not aligned to a {width}-bit element")]
    Alignment {
        /// Region label.
        label: String,
        /// Requested base.
        base: u64,
        /// Element address width.
        width: u32,
    },

    /// A pinned range intersects an occupied or reserved range.
    #[error("{label}: [{base:#x}, {end:#x}) overlaps {other} [{other_start:#x}, {other_end:#x})")]
    Overlap {
        /// Region label.
        label: String,
        /// Requested base.
        base: u64,
        /// Requested end (exclusive).
        end: u64,
        /// `"entry"` or `"keepout"`.
        other: &'static str,
        /// Start of the colliding range.
        other_start: u64,
        /// End of the colliding range (exclusive).
        other_end: u64,
    },

    /// A pinned range extends past the region top.
    #[error("{label}: element of size {size:#x} at {base:#x} exceeds region top {top:#x}")]
    OutOfBounds {
        /// Region label.
        label: String,
        /// Requested base.
        base: u64,
        /// Element size.
        size: u64,
        /// Region top (exclusive).
        top: u64,
    },

    /// No vacant range can hold an auto-placed element.
    #[error("{label}: no room for an element of width {width} below {top:#x}")]
    NoRoom {
        /// Region label.
        label: String,
        /// Element address width.
        width: u32,
        /// Region top (exclusive).
        top: u64,
    },

    /// No entry starts at the given address.
    #[error("{label}: no entry starts at {base:#x}")]
    NotFound {
        /// Region label.
        label: String,
        /// Requested base.
        base: u64,
    },

    /// `grow` was asked to move the top downwards.
    #[error("{label}: cannot grow to {requested:#x}, below the current top {top:#x}")]
    GrowBelowTop {
        /// Region label.
        label: String,
        /// Requested top.
        requested: u64,
        /// Current top.
        top: u64,
    },

    /// A request the allocator recognizes but intentionally does not handle.
    #[error("unsupported: {0}")]
    FeatureUnsupported(String),

    /// Loose replication found no constant stride within its search bound.
    #[error("{label}: no constant-stride layout for {count} replicas of width {width} within {bound}x the block size")]
    UnresolvedLoopBound {
        /// Region label.
        label: String,
        /// Number of replicas.
        count: usize,
        /// Replica address width.
        width: u32,
        /// Largest block multiplier tried.
        bound: u32,
    },

    /// A broken allocator invariant.
    #[error(transparent)]
    Internal(#[from] InternalError),
}
