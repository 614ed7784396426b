//! Flat `name -> entry` address maps.

use std::collections::BTreeMap;

use ghostbus_common::Interner;
use ghostbus_elaborate::Hierarchy;

use crate::entry::MapEntry;
use crate::error::DescriptorError;

/// Every mapped element of every domain, keyed by its alias or its dotted
/// path below the domain's common prefix. Keys listed in `drops` are skipped.
pub fn flat_map(
    hierarchy: &Hierarchy,
    interner: &Interner,
    drops: &[String],
) -> Result<BTreeMap<String, MapEntry>, DescriptorError> {
    let mut map = BTreeMap::new();
    let mut clashes = Vec::new();
    for (domain, _) in hierarchy.domains.iter() {
        for id in hierarchy.domain_nodes(domain) {
            let node = hierarchy.node(id);
            let prefix = hierarchy.map_path(id);
            for item in node.region.items().into_iter().filter(|i| !i.grouped) {
                let element = &item.payloads[0];
                let base = node.base + item.placement.base();
                let (Some(entry), Some(name)) = (MapEntry::for_element(element, base), element.map_name())
                else {
                    continue;
                };
                let name = interner.resolve(name);
                let aliased = element.name() != element.map_name();
                let key = if aliased {
                    name.to_string()
                } else {
                    prefix.iter().map(String::as_str).chain([name]).collect::<Vec<_>>().join(".")
                };
                if drops.contains(&key) {
                    log::debug!("dropping '{key}' from the address map");
                    continue;
                }
                if map.insert(key.clone(), entry).is_some() {
                    clashes.push(key);
                }
            }
        }
    }
    if !clashes.is_empty() {
        return Err(DescriptorError::NameCollision { keys: clashes });
    }
    Ok(map)
}
