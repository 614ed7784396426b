//! Bus ports of non-top modules and the bindings that connect them.
//!
//! Every module below a bus top receives the bus through a comma-leading
//! port list included at the end of its header, and every instantiation
//! binds those ports to the per-child wires the parent's decode creates.

use ghostbus_common::Interner;
use ghostbus_elaborate::Hierarchy;
use ghostbus_ir::{parse_literal, LoopBounds, NodeId, StepOp};

use crate::error::DecodeError;
use crate::signals::BusSignals;

/// Port declarations for the bus of one domain.
pub fn port_declarations(bus: &BusSignals) -> String {
    let (aw, dw) = (bus.aw, bus.dw);
    let mut out = String::new();
    let mut port = |dir: &str, range: Option<u32>, net: &str| {
        let range = range.map(|w| format!("[{}:0] ", w - 1)).unwrap_or_default();
        out.push_str(&format!(",{dir} {range}{net}\n"));
    };
    port("input ", None, &bus.clk);
    port("input ", Some(aw), &bus.addr);
    port("input ", Some(dw), &bus.dout);
    port("output", Some(dw), &bus.din);
    port("input ", None, &bus.we);
    for net in [&bus.wstb, &bus.re, &bus.rstb].into_iter().flatten() {
        port("input ", None, net);
    }
    out
}

/// Bindings of `node`'s bus ports to the wires its parent drives.
///
/// Replicas index the parent's wire arrays with their loop variable.
pub fn port_binding(
    hierarchy: &Hierarchy,
    interner: &Interner,
    bus: &BusSignals,
    node: NodeId,
) -> Result<String, DecodeError> {
    let node = hierarchy.node(node);
    let inst = interner.resolve(node.instance);
    let index = match &node.replica {
        Some(replica) => format!("[{}]", position_expr(&replica.group.bounds, interner)?),
        None => String::new(),
    };
    let mut out = format!(",.{clk}({clk})\n", clk = bus.clk);
    out.push_str(&format!(",.{addr}({addr}_{inst})\n", addr = bus.addr));
    out.push_str(&format!(",.{dout}({dout})\n", dout = bus.dout));
    out.push_str(&format!(",.{din}({din}_{inst}{index})\n", din = bus.din));
    let qualified = [Some(&bus.we), bus.wstb.as_ref(), bus.re.as_ref(), bus.rstb.as_ref()];
    for net in qualified.into_iter().flatten() {
        out.push_str(&format!(",.{net}({net}_{inst}{index})\n"));
    }
    Ok(out)
}

/// Zero-based iteration position of a generate loop, as a Verilog expression
/// of its index variable.
pub fn position_expr(bounds: &LoopBounds, interner: &Interner) -> Result<String, DecodeError> {
    let index = interner.resolve(bounds.index);
    let init = bounds.init.trim();
    let step = bounds.step.value.trim();
    let init_zero = parse_literal(init) == Some(0);
    let step_one = parse_literal(step) == Some(1);
    match bounds.step.op {
        StepOp::Add => Ok(match (init_zero, step_one) {
            (true, true) => index.to_string(),
            (true, false) => format!("{index}/({step})"),
            (false, true) => format!("{index}-({init})"),
            (false, false) => format!("({index}-({init}))/({step})"),
        }),
        StepOp::Sub => Ok(match step_one {
            true => format!("({init})-{index}"),
            false => format!("(({init})-{index})/({step})"),
        }),
        StepOp::Mul | StepOp::Div => Err(DecodeError::FeatureUnsupported(format!(
            "generate loop '{}' is not additive; replicated ports cannot be indexed by its position",
            bounds.header(index)
        ))),
    }
}
