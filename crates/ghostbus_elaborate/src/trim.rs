//! Common-prefix trimming of map paths.

use ghostbus_ir::DomainId;

use crate::tree::Hierarchy;

/// Records, per domain, how many leading path segments are shared by every
/// node that declares its own elements.
///
/// A domain whose only elements sit in its root trims the whole root path,
/// so its registers appear under their bare names.
pub fn trim_common_prefix(hierarchy: &mut Hierarchy) {
    let domains: Vec<DomainId> = hierarchy.domains.ids().collect();
    for domain in domains {
        let trimmed = common_prefix_len(
            hierarchy
                .domain_nodes(domain)
                .into_iter()
                .filter(|id| hierarchy.node(*id).has_local_elements())
                .map(|id| hierarchy.node(id).path.as_slice()),
        );
        log::debug!(
            "domain {}: trimming {trimmed} leading path segment(s)",
            domain.as_raw()
        );
        hierarchy.domains[domain].trimmed = trimmed;
    }
}

/// Length of the longest segment prefix shared by every path; zero when
/// there are no paths.
pub fn common_prefix_len<'a>(mut paths: impl Iterator<Item = &'a [String]>) -> usize {
    let Some(first) = paths.next() else {
        return 0;
    };
    let mut len = first.len();
    for path in paths {
        len = first
            .iter()
            .zip(path)
            .take(len)
            .take_while(|(a, b)| a == b)
            .count();
    }
    len
}
