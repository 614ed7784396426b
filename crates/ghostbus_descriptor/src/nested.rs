//! Hierarchical address maps mirroring the instance tree.

use std::collections::{BTreeMap, HashMap};

use ghostbus_common::Interner;
use ghostbus_elaborate::{Hierarchy, Walker};
use ghostbus_ir::NodeId;
use serde::Serialize;

use crate::entry::MapEntry;
use crate::error::DescriptorError;

/// One instance: its own entries, its child instances and its module name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NestedMap {
    /// Entries declared by this instance, keyed by alias or name.
    pub regs: BTreeMap<String, MapEntry>,
    /// Child instances keyed by path relative to this one.
    pub modules: BTreeMap<String, NestedMap>,
    /// Name of the instantiated module.
    pub instanceof: String,
}

/// The nested map of the subtree rooted at `root`.
pub fn nested_map(
    hierarchy: &Hierarchy,
    interner: &Interner,
    root: NodeId,
    drops: &[String],
) -> Result<NestedMap, DescriptorError> {
    let mut built: HashMap<NodeId, NestedMap> = HashMap::new();
    let mut clashes = Vec::new();
    for id in Walker::new(hierarchy).post_order(root) {
        let node = hierarchy.node(id);
        let mut map = NestedMap {
            instanceof: interner.resolve(node.module_name).to_string(),
            ..NestedMap::default()
        };
        for item in node.region.items().into_iter().filter(|i| !i.grouped) {
            let element = &item.payloads[0];
            let base = node.base + item.placement.base();
            let (Some(entry), Some(name)) = (MapEntry::for_element(element, base), element.map_name())
            else {
                continue;
            };
            let key = interner.resolve(name).to_string();
            if drops.contains(&key) {
                continue;
            }
            if map.regs.insert(key.clone(), entry).is_some() {
                clashes.push(format!("{}.{key}", node.path_name()));
            }
        }
        for child in hierarchy.children(id) {
            let Some(sub) = built.remove(&child) else { continue };
            let key = hierarchy.node(child).path[node.path.len()..].join(".");
            if map.modules.insert(key.clone(), sub).is_some() {
                clashes.push(format!("{}.{key}", node.path_name()));
            }
        }
        built.insert(id, map);
    }
    if !clashes.is_empty() {
        return Err(DescriptorError::NameCollision { keys: clashes });
    }
    Ok(built.remove(&root).unwrap_or_default())
}
