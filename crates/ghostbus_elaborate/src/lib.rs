//! Hierarchy builder for the ghostbus interconnect generator.
//!
//! Turns the flat module/instance [`Design`] into a tree of nodes, one per
//! (instance, bus domain), resolves every node's address space bottom-up so
//! a child's size is final before its parent places it, then stores absolute
//! bases top-down.
//!
//! # Usage
//!
//! ```ignore
//! let hierarchy = build_hierarchy(&design, &interner, &config)?;
//! ```

#![warn(missing_docs)]

pub mod builder;
pub mod domain;
pub mod errors;
pub mod registry;
pub mod trim;
pub mod tree;
pub mod walk;

use ghostbus_common::Interner;
use ghostbus_config::GhostbusConfig;
use ghostbus_ir::Design;

pub use builder::HierarchyBuilder;
pub use errors::BuildError;
pub use registry::ModuleGraph;
pub use tree::{Domain, Element, Hierarchy, Node, Replica};
pub use walk::Walker;

/// Builds, resolves and addresses the hierarchy of `design`.
pub fn build_hierarchy(
    design: &Design,
    interner: &Interner,
    config: &GhostbusConfig,
) -> Result<Hierarchy, BuildError> {
    HierarchyBuilder::new(design, interner, &config.policy).build()
}
