//! Module declarations and the instances they contain.

use crate::bus::Bus;
use crate::external::ExternalModule;
use crate::generate::ReplicationGroup;
use crate::ids::ModuleId;
use crate::register::{Memory, Register};
use ghostbus_common::Ident;
use serde::{Deserialize, Serialize};

/// An address range that must never be allocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keepout {
    /// Local base address.
    pub address: u64,
    /// Address width of the reserved block.
    pub width: u32,
}

/// One instantiation of a module inside another.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDecl {
    /// Instance name.
    pub name: Ident,
    /// Instantiated module.
    pub module: ModuleId,
    /// Pinned local base address within the parent.
    pub address: Option<u64>,
    /// Declared-bus tag.
    pub bus: Option<Ident>,
    /// Enclosing generate loop, if the instance is replicated.
    pub generate: Option<ReplicationGroup>,
}

/// Everything one module contributes to the memory map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDecl {
    /// ID of this module in the design.
    pub id: ModuleId,
    /// Module name.
    pub name: Ident,
    /// Buses declared here; non-empty makes the module a bus top.
    pub buses: Vec<Bus>,
    /// Registers in declaration order.
    pub registers: Vec<Register>,
    /// Memories in declaration order.
    pub memories: Vec<Memory>,
    /// Delegated external bus segments.
    pub externals: Vec<ExternalModule>,
    /// Child instances in declaration order.
    pub instances: Vec<InstanceDecl>,
    /// Reserved local ranges.
    pub keepouts: Vec<Keepout>,
}

impl ModuleDecl {
    /// An empty module declaration.
    pub fn new(id: ModuleId, name: Ident) -> Self {
        Self {
            id,
            name,
            buses: Vec::new(),
            registers: Vec::new(),
            memories: Vec::new(),
            externals: Vec::new(),
            instances: Vec::new(),
            keepouts: Vec::new(),
        }
    }

    /// Whether this module declares its own bus(es).
    pub fn is_bus_top(&self) -> bool {
        !self.buses.is_empty()
    }

    /// Whether the module places anything of its own in an address space.
    pub fn has_local_elements(&self) -> bool {
        !(self.registers.is_empty() && self.memories.is_empty() && self.externals.is_empty())
    }

    /// Looks up a declared bus by name; `None` matches the anonymous bus.
    pub fn bus(&self, name: Option<Ident>) -> Option<&Bus> {
        self.buses.iter().find(|b| b.name == name)
    }
}
