//! `ghostbus map`: prints the resolved address space of every node.

use std::error::Error;
use std::fmt::Write;

use crate::pipeline::{elaborate, resolve_config, Elaborated};
use crate::{GlobalArgs, MapArgs};

/// Runs `ghostbus map`. Returns exit code 0 on success.
pub fn run(args: &MapArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let config = resolve_config(global)?;
    let elaborated = elaborate(&args.netlist, &config)?;
    print!("{}", render(&elaborated));
    Ok(0)
}

/// One table per live node, grouped by bus domain.
pub fn render(elaborated: &Elaborated) -> String {
    let Elaborated { interner, hierarchy } = elaborated;
    let mut out = String::new();
    for (id, domain) in hierarchy.domains.iter() {
        let bus = &domain.bus;
        let _ = writeln!(
            out,
            "== bus {} (aw {}, dw {}, base {:#x}) ==",
            domain.label(interner),
            bus.address_width,
            bus.data_width,
            bus.base
        );
        for node_id in hierarchy.domain_nodes(id) {
            let node = hierarchy.node(node_id);
            let _ = writeln!(
                out,
                "\n{} ({}) at {:#x}, {} address bits",
                node.path_name(),
                interner.resolve(node.module_name),
                node.base,
                node.width()
            );
            let _ = write!(out, "{}", node.region.space());
        }
        out.push('\n');
    }
    out
}
