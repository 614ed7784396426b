//! The elaborated memory-map tree.
//!
//! One [`Node`] per (instance, bus domain). Nodes live in an [`Arena`] and
//! link to their parent by [`NodeId`]; each owns a [`StagedRegion`] holding
//! deep copies of its module's elements plus one [`Element::Submodule`] per
//! child node.

use ghostbus_common::{Ident, Interner};
use ghostbus_ir::{
    Arena, Bus, DomainId, ExternalModule, Memory, ModuleId, NodeId, Register, ReplicationGroup,
};
use ghostbus_map::StagedRegion;

/// Anything that occupies addresses in a node's region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// A control/status register.
    Register(Register),
    /// A RAM-like array.
    Memory(Memory),
    /// A delegated external bus segment.
    External(ExternalModule),
    /// A child node.
    Submodule(NodeId),
}

impl Element {
    /// Declared name, or `None` for submodules.
    pub fn name(&self) -> Option<Ident> {
        match self {
            Element::Register(r) => Some(r.name),
            Element::Memory(m) => Some(m.name),
            Element::External(e) => Some(e.name),
            Element::Submodule(_) => None,
        }
    }

    /// Name used in address maps: the alias when one is set.
    pub fn map_name(&self) -> Option<Ident> {
        match self {
            Element::Register(r) => Some(r.alias.unwrap_or(r.name)),
            Element::Memory(m) => Some(m.alias.unwrap_or(m.name)),
            Element::External(e) => Some(e.alias.unwrap_or(e.name)),
            Element::Submodule(_) => None,
        }
    }

    /// The child node, for submodules.
    pub fn submodule(&self) -> Option<NodeId> {
        match self {
            Element::Submodule(id) => Some(*id),
            _ => None,
        }
    }
}

/// Position of a node inside a generate loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replica {
    /// The loop this node was produced by.
    pub group: ReplicationGroup,
    /// Iteration position, `0..group.count`.
    pub index: u32,
}

/// One bus domain: a declared bus and the subtree it reaches.
#[derive(Debug, Clone)]
pub struct Domain {
    /// The declared bus.
    pub bus: Bus,
    /// Module declaring the bus.
    pub bustop: ModuleId,
    /// Root node of the domain.
    pub root: NodeId,
    /// Path segments dropped from every map name in this domain.
    pub trimmed: usize,
}

impl Domain {
    /// Bus name, or `"bus"` for the anonymous bus.
    pub fn label<'a>(&self, interner: &'a Interner) -> &'a str {
        self.bus.name.map_or("bus", |n| interner.resolve(n))
    }
}

/// One (instance, bus domain) of the design.
#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node; `None` for a domain root.
    pub parent: Option<NodeId>,
    /// Child nodes in declaration order, including pruned ones.
    pub children: Vec<NodeId>,
    /// Instantiated module.
    pub module: ModuleId,
    /// Name of the instantiated module.
    pub module_name: Ident,
    /// Instance name (the module name for a root).
    pub instance: Ident,
    /// Hierarchical path from the design top.
    pub path: Vec<String>,
    /// Domain the node belongs to.
    pub domain: DomainId,
    /// Generate-loop position, when replicated.
    pub replica: Option<Replica>,
    /// Pinned base within the parent.
    pub requested: Option<u64>,
    /// Local address space.
    pub region: StagedRegion<Element>,
    /// Base within the parent's region.
    pub offset: u64,
    /// Absolute base address.
    pub base: u64,
    /// Removed from the map because it holds nothing addressable.
    pub pruned: bool,
}

impl Node {
    /// Dotted hierarchical path.
    pub fn path_name(&self) -> String {
        self.path.join(".")
    }

    /// Whether the node declares registers, memories or externals of its own.
    pub fn has_local_elements(&self) -> bool {
        self.region
            .entries()
            .iter()
            .flat_map(|e| e.payloads())
            .any(|p| !matches!(p, Element::Submodule(_)))
    }

    /// Address width of the region after shrinking.
    pub fn width(&self) -> u32 {
        self.region.width()
    }
}

/// The complete elaborated, resolved and absolutely-addressed tree.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    /// Every node, including pruned ones.
    pub nodes: Arena<NodeId, Node>,
    /// Every bus domain in declaration order.
    pub domains: Arena<DomainId, Domain>,
}

impl Hierarchy {
    /// Node by ID.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Domain by ID.
    pub fn domain(&self, id: DomainId) -> &Domain {
        &self.domains[id]
    }

    /// The domain a node belongs to.
    pub fn domain_of(&self, id: NodeId) -> &Domain {
        &self.domains[self.nodes[id].domain]
    }

    /// Live children of `id` in declaration order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .filter(|c| !self.nodes[*c].pruned)
    }

    /// Path of `id` below its domain's common prefix.
    pub fn map_path(&self, id: NodeId) -> &[String] {
        let node = &self.nodes[id];
        let trimmed = self.domains[node.domain].trimmed;
        node.path.get(trimmed..).unwrap_or(&[])
    }

    /// Whether the design has more than one bus domain.
    pub fn is_multi_domain(&self) -> bool {
        self.domains.len() > 1
    }

    /// Live nodes of one domain in pre-order.
    pub fn domain_nodes(&self, domain: DomainId) -> Vec<NodeId> {
        crate::walk::Walker::new(self).pre_order(self.domains[domain].root)
    }
}
