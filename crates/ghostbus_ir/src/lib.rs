//! Typed netlist model consumed by the ghostbus generator.
//!
//! A [`Design`] is the module/instance graph annotated with every placement
//! request the front-end extracted: registers, memories, delegated external
//! bus segments, declared buses, keepouts and generate-loop replication. The
//! JSON form accepted on disk lives in [`input`] and is lowered into the
//! interned, ID-indexed model here.

#![warn(missing_docs)]

pub mod arena;
pub mod bus;
pub mod design;
pub mod error;
pub mod external;
pub mod generate;
pub mod ids;
pub mod input;
pub mod module;
pub mod register;

pub use arena::{Arena, ArenaId};
pub use bus::{Bus, BusNets, BusRole};
pub use design::Design;
pub use error::IrError;
pub use external::ExternalModule;
pub use generate::{parse_literal, CompareOp, LoopBounds, ReplicationGroup, Step, StepOp};
pub use ids::{DomainId, ModuleId, NodeId};
pub use input::{load_netlist, lower, parse_netlist, NetlistFile};
pub use module::{InstanceDecl, Keepout, ModuleDecl};
pub use register::{Access, Memory, Register, StrobeKind};
