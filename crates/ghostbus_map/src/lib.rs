//! Power-of-two address allocation for one hierarchy node.
//!
//! [`AddressSpace`] tracks occupied, vacant and keepout ranges;
//! [`StagedRegion`] defers placement so pinned addresses always win over
//! auto-placed ones; [`ReplicationResolver`] lays out generate-loop replicas
//! at a constant stride.
//!
//! The allocator is generic over its payload. It never interprets what it
//! places, it only guarantees alignment and disjointness.

#![warn(missing_docs)]

pub mod error;
pub mod range;
pub mod replicate;
pub mod space;
pub mod staged;

pub use error::MapError;
pub use range::{AddressRange, Interval};
pub use replicate::{Placement, ReplicationResolver};
pub use space::{AddressSpace, Occupied, Segment, Segments};
pub use staged::{ResolvedItem, Slot, StageState, StagedEntry, StagedRegion};
