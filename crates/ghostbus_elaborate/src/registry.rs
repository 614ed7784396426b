//! Module dependency graph.
//!
//! One graph node per module declaration, one edge per distinct
//! parent→child instantiation. A topological sort orders the modules
//! top-down; any cycle is a [`BuildError::CircularInstantiation`].

use std::collections::HashMap;

use ghostbus_common::Interner;
use ghostbus_ir::{Design, ModuleId};
use petgraph::algo::{kosaraju_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::errors::BuildError;

/// The instantiation graph of a [`Design`].
pub struct ModuleGraph {
    graph: DiGraph<ModuleId, ()>,
    index: HashMap<ModuleId, NodeIndex>,
}

impl ModuleGraph {
    /// Builds the graph from every module declaration.
    pub fn new(design: &Design) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        for id in design.modules.ids() {
            index.insert(id, graph.add_node(id));
        }
        for (id, module) in design.modules.iter() {
            for inst in &module.instances {
                let (from, to) = (index[&id], index[&inst.module]);
                if graph.find_edge(from, to).is_none() {
                    graph.add_edge(from, to, ());
                }
            }
        }
        Self { graph, index }
    }

    /// Modules ordered parents first.
    pub fn top_down(&self, design: &Design, interner: &Interner) -> Result<Vec<ModuleId>, BuildError> {
        match toposort(&self.graph, None) {
            Ok(order) => Ok(order.into_iter().map(|n| self.graph[n]).collect()),
            Err(cycle) => Err(self.cycle_error(cycle.node_id(), design, interner)),
        }
    }

    /// Modules ordered children first.
    pub fn bottom_up(&self, design: &Design, interner: &Interner) -> Result<Vec<ModuleId>, BuildError> {
        let mut order = self.top_down(design, interner)?;
        order.reverse();
        Ok(order)
    }

    /// Distinct modules instantiated directly by `module`.
    pub fn children(&self, module: ModuleId) -> Vec<ModuleId> {
        let mut out: Vec<ModuleId> = self
            .graph
            .neighbors_directed(self.index[&module], Direction::Outgoing)
            .map(|n| self.graph[n])
            .collect();
        out.sort();
        out
    }

    fn cycle_error(&self, start: NodeIndex, design: &Design, interner: &Interner) -> BuildError {
        let name = |n: NodeIndex| interner.resolve(design.modules[self.graph[n]].name).to_string();
        let component = kosaraju_scc(&self.graph)
            .into_iter()
            .find(|scc| scc.contains(&start))
            .unwrap_or_else(|| vec![start]);
        // Walk the cycle from `start` staying inside its component.
        let mut modules = vec![name(start)];
        let mut current = start;
        let mut seen = vec![start];
        loop {
            let next = self
                .graph
                .neighbors_directed(current, Direction::Outgoing)
                .filter(|n| component.contains(n))
                .min_by_key(|n| if *n == start { 0 } else { 1 + n.index() });
            let Some(next) = next else { break };
            modules.push(name(next));
            if next == start || seen.contains(&next) {
                break;
            }
            seen.push(next);
            current = next;
        }
        BuildError::CircularInstantiation { modules }
    }
}
