//! Hierarchy construction, bottom-up resolution and absolute addressing.

use ghostbus_common::{Ident, InternalError, Interner};
use ghostbus_config::PolicyConfig;
use ghostbus_ir::{Bus, Design, DomainId, InstanceDecl, ModuleDecl, ModuleId, NodeId};
use ghostbus_map::{ReplicationResolver, StagedRegion};

use crate::domain::{check_tag, select_bus};
use crate::errors::BuildError;
use crate::registry::ModuleGraph;
use crate::trim::trim_common_prefix;
use crate::tree::{Domain, Element, Hierarchy, Node, Replica};
use crate::walk::{post_order_by, Walker};

/// One pending instantiation.
struct Frame {
    module: ModuleId,
    instance: Ident,
    path: Vec<String>,
    parent: Option<NodeId>,
    domain: Option<DomainId>,
    replica: Option<Replica>,
    requested: Option<u64>,
}

/// Turns a [`Design`] into a resolved [`Hierarchy`].
///
/// The build runs in four strictly sequential phases: instantiate the tree
/// top-down, resolve every region bottom-up, attach absolute bases top-down,
/// then trim the common path prefix of each domain. The first error aborts.
pub struct HierarchyBuilder<'a> {
    design: &'a Design,
    interner: &'a Interner,
    resolver: ReplicationResolver,
    hierarchy: Hierarchy,
}

impl<'a> HierarchyBuilder<'a> {
    /// Creates a builder for one run.
    pub fn new(design: &'a Design, interner: &'a Interner, policy: &PolicyConfig) -> Self {
        Self {
            design,
            interner,
            resolver: ReplicationResolver::new(policy),
            hierarchy: Hierarchy::default(),
        }
    }

    /// Runs every phase and hands over the finished tree.
    pub fn build(mut self) -> Result<Hierarchy, BuildError> {
        let order = ModuleGraph::new(self.design).top_down(self.design, self.interner)?;
        log::debug!("{} modules in dependency order", order.len());
        self.instantiate()?;
        let domains: Vec<DomainId> = self.hierarchy.domains.ids().collect();
        for domain in domains {
            self.resolve_domain(domain)?;
            self.attach(domain);
        }
        trim_common_prefix(&mut self.hierarchy);
        log::info!(
            "built {} bus domain(s), {} node(s)",
            self.hierarchy.domains.len(),
            self.hierarchy.nodes.values().filter(|n| !n.pruned).count()
        );
        Ok(self.hierarchy)
    }

    fn name(&self, ident: Ident) -> &'a str {
        self.interner.resolve(ident)
    }

    fn instantiate(&mut self) -> Result<(), BuildError> {
        let design = self.design;
        let top = design.top_module();
        let mut stack = vec![Frame {
            module: top.id,
            instance: top.name,
            path: vec![self.name(top.name).to_string()],
            parent: None,
            domain: None,
            replica: None,
            requested: None,
        }];
        while let Some(frame) = stack.pop() {
            let children = if design.modules[frame.module].is_bus_top() {
                self.instantiate_bus_top(&frame)?
            } else if let Some(domain) = frame.domain {
                self.instantiate_in_domain(&frame, domain)?
            } else {
                self.pass_through(&frame)?
            };
            stack.extend(children.into_iter().rev());
        }
        if self.hierarchy.domains.is_empty() {
            log::warn!("no bus is declared anywhere below '{}'", self.name(top.name));
        }
        Ok(())
    }

    /// A module above every bus: it may only contain instances.
    fn pass_through(&self, frame: &Frame) -> Result<Vec<Frame>, BuildError> {
        let module = &self.design.modules[frame.module];
        if let Some(name) = local_names(module).next() {
            return Err(BuildError::MissingBus {
                path: frame.path.join("."),
                element: self.name(name).to_string(),
            });
        }
        Ok(module
            .instances
            .iter()
            .flat_map(|inst| self.expand_instance(frame, inst, None, None))
            .collect())
    }

    fn instantiate_bus_top(&mut self, frame: &Frame) -> Result<Vec<Frame>, BuildError> {
        let (design, interner) = (self.design, self.interner);
        let module = &design.modules[frame.module];
        let path = frame.path.join(".");
        if let Some(domain) = frame.domain {
            return Err(BuildError::FeatureUnsupported(format!(
                "{path}: module '{}' declares its own bus inside the domain of bus '{}'",
                self.name(module.name),
                self.hierarchy.domains[domain].label(self.interner)
            )));
        }
        if frame.replica.is_some() {
            return Err(BuildError::FeatureUnsupported(format!(
                "{path}: module '{}' declares a bus and cannot be replicated",
                self.name(module.name)
            )));
        }

        let mut roots = Vec::with_capacity(module.buses.len());
        for bus in &module.buses {
            let root = self.hierarchy.nodes.next_id();
            let domain = self.hierarchy.domains.alloc(Domain {
                bus: bus.clone(),
                bustop: module.id,
                root,
                trimmed: 0,
            });
            let node = self.new_node(frame, None, domain, bus.address_width);
            debug_assert_eq!(node, root);
            log::debug!(
                "{path}: bus '{}' starts domain {}",
                self.hierarchy.domains[domain].label(self.interner),
                domain.as_raw()
            );
            roots.push((node, domain));
        }

        let ambiguous = |name: Ident, reason: String| BuildError::AmbiguousBusDomain {
            path: path.clone(),
            element: interner.resolve(name).to_string(),
            reason,
        };
        for element in local_elements(module) {
            let tag = element_tag(&element);
            let name = element.name().unwrap_or(module.name);
            let index = select_bus(&module.buses, tag, interner).map_err(|r| ambiguous(name, r))?;
            self.stage_element(roots[index].0, element, &module.buses[index])?;
        }
        for (root, _) in &roots {
            for keepout in &module.keepouts {
                self.hierarchy.nodes[*root]
                    .region
                    .stage_keepout(keepout.address, keepout.width);
            }
        }

        let mut frames = Vec::new();
        for inst in &module.instances {
            let index =
                select_bus(&module.buses, inst.bus, interner).map_err(|r| ambiguous(inst.name, r))?;
            let (root, domain) = roots[index];
            frames.extend(self.expand_instance(frame, inst, Some(root), Some(domain)));
        }
        Ok(frames)
    }

    fn instantiate_in_domain(&mut self, frame: &Frame, domain: DomainId) -> Result<Vec<Frame>, BuildError> {
        let (design, interner) = (self.design, self.interner);
        let module = &design.modules[frame.module];
        let bus = self.hierarchy.domains[domain].bus.clone();
        let path = frame.path.join(".");
        let ambiguous = |name: Ident, reason: String| BuildError::AmbiguousBusDomain {
            path: path.clone(),
            element: interner.resolve(name).to_string(),
            reason,
        };

        let node = self.new_node(frame, frame.parent, domain, bus.address_width);
        for element in local_elements(module) {
            let name = element.name().unwrap_or(module.name);
            check_tag(&bus, element_tag(&element), interner).map_err(|r| ambiguous(name, r))?;
            self.stage_element(node, element, &bus)?;
        }
        for keepout in &module.keepouts {
            self.hierarchy.nodes[node]
                .region
                .stage_keepout(keepout.address, keepout.width);
        }

        let mut frames = Vec::new();
        for inst in &module.instances {
            check_tag(&bus, inst.bus, interner).map_err(|r| ambiguous(inst.name, r))?;
            frames.extend(self.expand_instance(frame, inst, Some(node), Some(domain)));
        }
        Ok(frames)
    }

    /// One frame per instance, or one per iteration of its generate loop.
    fn expand_instance(
        &self,
        frame: &Frame,
        inst: &InstanceDecl,
        parent: Option<NodeId>,
        domain: Option<DomainId>,
    ) -> Vec<Frame> {
        let name = self.name(inst.name);
        match &inst.generate {
            None => {
                let mut path = frame.path.clone();
                path.push(name.to_string());
                vec![Frame {
                    module: inst.module,
                    instance: inst.name,
                    path,
                    parent,
                    domain,
                    replica: None,
                    requested: inst.address,
                }]
            }
            Some(group) => (0..group.count)
                .map(|index| {
                    let mut path = frame.path.clone();
                    path.push(format!("{}_{index}", self.name(group.label)));
                    path.push(name.to_string());
                    Frame {
                        module: inst.module,
                        instance: inst.name,
                        path,
                        parent,
                        domain,
                        replica: Some(Replica {
                            group: group.clone(),
                            index,
                        }),
                        requested: inst.address,
                    }
                })
                .collect(),
        }
    }

    fn new_node(&mut self, frame: &Frame, parent: Option<NodeId>, domain: DomainId, width: u32) -> NodeId {
        let id = self.hierarchy.nodes.alloc(Node {
            parent,
            children: Vec::new(),
            module: frame.module,
            module_name: self.design.modules[frame.module].name,
            instance: frame.instance,
            path: frame.path.clone(),
            domain,
            replica: frame.replica.clone(),
            requested: frame.requested,
            region: StagedRegion::new(frame.path.join("."), width),
            offset: 0,
            base: 0,
            pruned: false,
        });
        if let Some(parent) = parent {
            self.hierarchy.nodes[parent].children.push(id);
        }
        id
    }

    fn stage_element(&mut self, node: NodeId, element: Element, bus: &Bus) -> Result<(), BuildError> {
        let (data_width, address_width, requested) = match &element {
            Element::Register(r) => (r.data_width, 0, r.address),
            Element::Memory(m) => (m.data_width, m.address_width, m.address),
            Element::External(e) => (e.data_width, e.address_width, e.address),
            Element::Submodule(_) => {
                return Err(InternalError::new("submodule staged as a local element").into())
            }
        };
        let mismatch = |kind: &'static str, width: u32, bus_width: u32| BuildError::WidthMismatch {
            path: self.hierarchy.nodes[node].path_name(),
            element: element.name().map_or("?", |n| self.name(n)).to_string(),
            kind,
            width,
            bus: bus.name.map_or("bus", |n| self.name(n)).to_string(),
            bus_width,
        };
        if data_width > bus.data_width {
            return Err(mismatch("data", data_width, bus.data_width));
        }
        if address_width > bus.address_width {
            return Err(mismatch("address", address_width, bus.address_width));
        }
        self.hierarchy.nodes[node]
            .region
            .stage(address_width, element, requested);
        Ok(())
    }

    fn resolve_domain(&mut self, domain: DomainId) -> Result<(), BuildError> {
        let root = self.hierarchy.domains[domain].root;
        let nodes = &self.hierarchy.nodes;
        let order = post_order_by(root, |id| nodes[id].children.clone());
        for id in order {
            self.resolve_node(id)?;
        }
        let bus = &self.hierarchy.domains[domain].bus;
        let node = &self.hierarchy.nodes[root];
        if node.width() > bus.address_width {
            return Err(BuildError::WidthMismatch {
                path: node.path_name(),
                element: self.name(node.module_name).to_string(),
                kind: "address",
                width: node.width(),
                bus: bus.name.map_or("bus", |n| self.name(n)).to_string(),
                bus_width: bus.address_width,
            });
        }
        Ok(())
    }

    /// Stages the already-resolved children of `id`, then resolves and
    /// shrinks its own region.
    fn resolve_node(&mut self, id: NodeId) -> Result<(), BuildError> {
        let children = self.hierarchy.nodes[id].children.clone();
        let mut i = 0;
        while i < children.len() {
            let first = &self.hierarchy.nodes[children[i]];
            let mut j = i + 1;
            if first.replica.is_some() {
                while j < children.len() {
                    let next = &self.hierarchy.nodes[children[j]];
                    if next.instance != first.instance || next.replica.is_none() {
                        break;
                    }
                    j += 1;
                }
            }
            self.stage_children(id, &children[i..j])?;
            i = j;
        }

        let node = &mut self.hierarchy.nodes[id];
        node.region.resolve(&self.resolver)?;
        node.region.shrink();
        let offsets: Vec<(NodeId, u64)> = node
            .region
            .items()
            .iter()
            .flat_map(|item| item.placement.bases.iter().zip(item.payloads))
            .filter_map(|(base, payload)| payload.submodule().map(|c| (c, *base)))
            .collect();
        log::debug!(
            "{}: resolved to {} address bit(s), {} entr{}",
            node.path_name(),
            node.width(),
            node.region.space().len(),
            if node.region.space().len() == 1 { "y" } else { "ies" }
        );
        for (child, offset) in offsets {
            self.hierarchy.nodes[child].offset = offset;
        }
        Ok(())
    }

    fn stage_children(&mut self, parent: NodeId, group: &[NodeId]) -> Result<(), BuildError> {
        let Some(&first) = group.first() else {
            return Ok(());
        };
        if group
            .iter()
            .all(|c| self.hierarchy.nodes[*c].region.is_empty())
        {
            for c in group {
                let node = &mut self.hierarchy.nodes[*c];
                node.pruned = true;
                log::debug!("{}: nothing addressable, pruned", node.path_name());
            }
            return Ok(());
        }
        let width = group
            .iter()
            .map(|c| self.hierarchy.nodes[*c].width())
            .max()
            .unwrap_or(0);
        let head = &self.hierarchy.nodes[first];
        let (requested, replicated) = (head.requested, head.replica.is_some());
        let region = &mut self.hierarchy.nodes[parent].region;
        if replicated {
            let payloads = group.iter().map(|c| Element::Submodule(*c)).collect();
            region.stage_group(width, payloads, requested);
        } else {
            region.stage(width, Element::Submodule(first), requested);
        }
        Ok(())
    }

    /// Stores absolute bases top-down: the root at the bus base, every
    /// child at its parent's base plus its offset.
    fn attach(&mut self, domain: DomainId) {
        let root = self.hierarchy.domains[domain].root;
        let base = self.hierarchy.domains[domain].bus.base;
        let order = Walker::new(&self.hierarchy).pre_order(root);
        for id in order {
            let base = match self.hierarchy.nodes[id].parent {
                Some(parent) if id != root => {
                    self.hierarchy.nodes[parent].base + self.hierarchy.nodes[id].offset
                }
                _ => base,
            };
            let node = &mut self.hierarchy.nodes[id];
            node.base = base;
            node.region.set_base(base);
        }
    }
}

/// Deep copies of a module's registers, memories and externals in declaration order.
fn local_elements(module: &ModuleDecl) -> impl Iterator<Item = Element> + '_ {
    module
        .registers
        .iter()
        .cloned()
        .map(Element::Register)
        .chain(module.memories.iter().cloned().map(Element::Memory))
        .chain(module.externals.iter().cloned().map(Element::External))
}

fn local_names(module: &ModuleDecl) -> impl Iterator<Item = Ident> + '_ {
    module
        .registers
        .iter()
        .map(|r| r.name)
        .chain(module.memories.iter().map(|m| m.name))
        .chain(module.externals.iter().map(|e| e.name))
}

fn element_tag(element: &Element) -> Option<Ident> {
    match element {
        Element::Register(r) => r.bus,
        Element::Memory(m) => m.bus,
        Element::External(e) => e.bus,
        Element::Submodule(_) => None,
    }
}
