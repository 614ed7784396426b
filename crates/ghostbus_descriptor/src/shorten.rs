//! Flat-map key shortening and mangling.
//!
//! A dotted key shortens to its last segment. Keys whose short forms collide
//! grow one leading segment at a time, and only the ones still colliding at a
//! given length keep growing.

use std::collections::BTreeMap;

use crate::error::DescriptorError;

/// The last `n` segments of a dotted name (the whole name when shorter).
fn suffix(segments: &[&str], n: usize) -> String {
    segments[segments.len().saturating_sub(n)..].join(".")
}

/// Assigns every key its shortest unique dotted suffix, preserving the
/// mapping from new to old keys.
pub fn shortest_unique(keys: &[String]) -> BTreeMap<String, String> {
    let split: Vec<Vec<&str>> = keys.iter().map(|k| k.split('.').collect()).collect();
    let mut result = BTreeMap::new();
    let mut pending: Vec<usize> = (0..keys.len()).collect();
    let mut n = 1;
    while !pending.is_empty() {
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for &i in &pending {
            groups.entry(suffix(&split[i], n)).or_default().push(i);
        }
        pending.clear();
        for (short, members) in groups {
            let exhausted = members.iter().all(|&i| split[i].len() <= n);
            if members.len() == 1 || exhausted {
                for i in members {
                    result.insert(suffix(&split[i], n), keys[i].clone());
                }
            } else {
                log::debug!("'{short}' is shared by {} keys; lengthening", members.len());
                pending.extend(members);
            }
        }
        n += 1;
    }
    result
}

/// Re-keys a flat map by shortest unique suffix.
pub fn shorten<V>(map: BTreeMap<String, V>) -> BTreeMap<String, V> {
    let keys: Vec<String> = map.keys().cloned().collect();
    let renames = shortest_unique(&keys);
    let mut map = map;
    renames
        .into_iter()
        .filter_map(|(short, long)| map.remove(&long).map(|v| (short, v)))
        .collect()
}

/// Replaces `.` with `_` in every key.
pub fn mangle<V>(map: BTreeMap<String, V>) -> Result<BTreeMap<String, V>, DescriptorError> {
    let mut out = BTreeMap::new();
    let mut clashes = Vec::new();
    for (key, value) in map {
        let mangled = key.replace('.', "_");
        if out.contains_key(&mangled) {
            clashes.push(mangled);
            continue;
        }
        out.insert(mangled, value);
    }
    if clashes.is_empty() {
        Ok(out)
    } else {
        Err(DescriptorError::NameCollision { keys: clashes })
    }
}
