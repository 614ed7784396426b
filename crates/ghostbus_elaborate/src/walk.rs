//! Iterative traversal of the hierarchy.
//!
//! Both orders use an explicit stack and a visited set, so deep designs
//! never recurse and a node reachable twice is still visited once.

use std::collections::HashSet;

use ghostbus_ir::NodeId;

use crate::tree::Hierarchy;

/// Walks live (non-pruned) nodes below a root.
pub struct Walker<'a> {
    hierarchy: &'a Hierarchy,
}

impl<'a> Walker<'a> {
    /// Creates a walker over `hierarchy`.
    pub fn new(hierarchy: &'a Hierarchy) -> Self {
        Self { hierarchy }
    }

    /// Parents before children, siblings in declaration order.
    pub fn pre_order(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            out.push(id);
            let children: Vec<NodeId> = self.hierarchy.children(id).collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Children before parents, siblings in declaration order.
    pub fn post_order(&self, root: NodeId) -> Vec<NodeId> {
        post_order_by(root, |id| self.hierarchy.children(id).collect())
    }
}

/// Post-order over any child relation; used while nodes are still being built.
pub(crate) fn post_order_by(root: NodeId, children: impl Fn(NodeId) -> Vec<NodeId>) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![(root, false)];
    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            out.push(id);
            continue;
        }
        if !visited.insert(id) {
            continue;
        }
        stack.push((id, true));
        for child in children(id).into_iter().rev() {
            if !visited.contains(&child) {
                stack.push((child, false));
            }
        }
    }
    out
}
