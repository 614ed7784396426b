//! Verilog memory map for self-checking decoder testbenches.
//!
//! Lists every CSR of one domain with its address on the bus, reset value and
//! a seeded random value within its width, plus every RAM's base and shape,
//! then defines bus write/read-check tasks and a stimulus block that reads
//! reset values, writes the random values and reads them back.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ghostbus_common::Interner;
use ghostbus_elaborate::{Element, Hierarchy};
use ghostbus_ir::{DomainId, Memory, Register};

use crate::signals::BusSignals;
use crate::writer::{vhex, VerilogWriter};

struct Mapped<'a, T> {
    item: &'a T,
    addr: u64,
    path: String,
}

fn collect<'a>(
    hierarchy: &'a Hierarchy,
    interner: &Interner,
    domain: DomainId,
) -> (Vec<Mapped<'a, Register>>, Vec<Mapped<'a, Memory>>) {
    let mut csrs = Vec::new();
    let mut rams = Vec::new();
    let bus_base = hierarchy.domain(domain).bus.base;
    for id in hierarchy.domain_nodes(domain) {
        let node = hierarchy.node(id);
        let prefix = node.path_name();
        for item in node.region.items() {
            let addr = node.base - bus_base + item.placement.base();
            for payload in item.payloads {
                let path = |name| format!("{prefix}.{}", interner.resolve(name));
                match payload {
                    Element::Register(reg) => csrs.push(Mapped {
                        item: reg,
                        addr,
                        path: path(reg.name),
                    }),
                    Element::Memory(mem) => rams.push(Mapped {
                        item: mem,
                        addr,
                        path: path(mem.name),
                    }),
                    Element::External(_) | Element::Submodule(_) => {}
                }
            }
        }
    }
    (csrs, rams)
}

/// A `width'h…` literal with bit `n` set where `bits[n]` is true.
fn mask_literal(bits: &[bool]) -> String {
    let width = bits.len().max(1);
    let digits: String = (0..width.div_ceil(4))
        .rev()
        .map(|nibble| {
            let value = (0..4)
                .filter(|b| bits.get(nibble * 4 + b).copied().unwrap_or(false))
                .fold(0u32, |acc, b| acc | (1 << b));
            char::from_digit(value, 16).unwrap_or('0')
        })
        .collect();
    format!("{width}'h{digits}")
}

/// Random value in `0..2^width`.
fn random_value(rng: &mut StdRng, width: u32) -> u64 {
    match width {
        64.. => rng.gen(),
        w => rng.gen_range(0..(1u64 << w)),
    }
}

/// The testbench memory map of `domain`, random values drawn from `seed`.
///
/// Addresses are as seen on the bus, without the bus base.
pub fn testbench_map(hierarchy: &Hierarchy, interner: &Interner, domain: DomainId, seed: u64) -> String {
    let bus = BusSignals::new(hierarchy.domain(domain), interner, hierarchy.is_multi_domain());
    let (aw, dw) = (bus.aw, bus.dw);
    let (csrs, rams) = collect(hierarchy, interner, domain);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut w = VerilogWriter::new();
    w.comment("Auto-generated by ghostbus");
    w.line(format!("localparam nCSRs = {};", csrs.len()));
    w.line(format!("localparam nRAMs = {};", rams.len()));
    w.comment("CSRs");
    w.line(format!("reg [{}:0] GHOSTBUS_ADDRS [0:nCSRs-1];", aw - 1));
    w.line(format!("reg [{}:0] GHOSTBUS_INITVALS [0:nCSRs-1];", dw - 1));
    w.line(format!("reg [{}:0] GHOSTBUS_RANDVALS [0:nCSRs-1];", dw - 1));
    let writable: Vec<bool> = csrs
        .iter()
        .map(|c| c.item.access.writable() && !c.item.pulse)
        .collect();
    w.line(format!("reg [nCSRs-1:0] GHOSTBUS_WRITABLE = {};", mask_literal(&writable)));
    w.comment("RAMs");
    w.line(format!("reg [{}:0] GHOSTBUS_RAM_BASES [0:nRAMs-1];", aw - 1));
    w.line(format!("reg [{}:0] GHOSTBUS_RAM_WIDTHS [0:nRAMs-1];", dw - 1));
    w.line(format!("reg [{}:0] GHOSTBUS_RAM_DEPTHS [0:nRAMs-1];", aw));
    let ram_writable: Vec<bool> = rams.iter().map(|r| r.item.access.writable()).collect();
    w.line(format!(
        "reg [nRAMs-1:0] GHOSTBUS_RAM_WRITABLE = {};",
        mask_literal(&ram_writable)
    ));

    w.open("initial begin");
    for (n, csr) in csrs.iter().enumerate() {
        let reg = csr.item;
        w.line(format!("GHOSTBUS_ADDRS[{n}] = {}; // {}", vhex(csr.addr, aw), csr.path));
        w.line(format!("GHOSTBUS_INITVALS[{n}] = {};", vhex(reg.initial, dw)));
        w.line(format!(
            "GHOSTBUS_RANDVALS[{n}] = {};",
            vhex(random_value(&mut rng, reg.data_width), dw)
        ));
    }
    for (n, ram) in rams.iter().enumerate() {
        let mem = ram.item;
        w.line(format!("GHOSTBUS_RAM_BASES[{n}] = {}; // {}", vhex(ram.addr, aw), ram.path));
        w.line(format!("GHOSTBUS_RAM_WIDTHS[{n}] = {};", vhex(u64::from(mem.data_width), dw)));
        w.line(format!(
            "GHOSTBUS_RAM_DEPTHS[{n}] = {};",
            vhex(1u64 << mem.address_width, aw + 1)
        ));
    }
    w.close("end");

    emit_tasks(&mut w, &bus);
    emit_stimulus(&mut w);
    log::info!(
        "testbench map for bus '{}': {} CSRs, {} RAMs",
        hierarchy.domain(domain).label(interner),
        csrs.len(),
        rams.len()
    );
    w.finish()
}

fn emit_tasks(w: &mut VerilogWriter, bus: &BusSignals) {
    let (aw, dw) = (bus.aw, bus.dw);
    let clk = &bus.clk;
    w.comment("Bus transaction tasks");
    w.line("reg test_pass = 1'b1;");
    w.line("`ifndef TICK");
    w.line("  `define TICK 10");
    w.line("`endif");
    w.open(format!(
        "task GB_WRITE (input [{}:0] addr, input [{}:0] data);",
        aw - 1,
        dw - 1
    ));
    w.open("begin");
    w.line(format!("@(posedge {clk}) {} = addr;", bus.addr));
    w.line(format!("{} = data;", bus.dout));
    w.line(format!("{} = 1'b1;", bus.we));
    if let Some(wstb) = &bus.wstb {
        w.line(format!("{wstb} = 1'b1;"));
    }
    w.line(format!("@(posedge {clk}) {} = 1'b0;", bus.we));
    if let Some(wstb) = &bus.wstb {
        w.line(format!("{wstb} = 1'b0;"));
    }
    w.close("end");
    w.close("endtask");

    w.line("`ifndef RDDELAY");
    w.line("  `define RDDELAY 2");
    w.line("`endif");
    w.open(format!(
        "task GB_READ_CHECK (input [{}:0] addr, input [{}:0] checkval);",
        aw - 1,
        dw - 1
    ));
    w.open("begin");
    w.line(format!("@(posedge {clk}) {} = addr;", bus.addr));
    w.line(format!("{} = {};", bus.dout, vhex(0, dw)));
    w.line(format!("{} = 1'b0;", bus.we));
    if let Some(re) = &bus.re {
        w.line(format!("{re} = 1'b1;"));
    }
    w.line("#(`RDDELAY*`TICK);");
    w.line(format!("@(posedge {clk});"));
    if let Some(rstb) = &bus.rstb {
        w.line(format!("{rstb} = 1'b1;"));
        w.line(format!("@(posedge {clk}) {rstb} = 1'b0;"));
    }
    if let Some(re) = &bus.re {
        w.line(format!("{re} = 1'b0;"));
    }
    w.open(format!("if ({} != checkval) begin", bus.din));
    w.line("test_pass = 1'b0;");
    w.line("`ifndef YOSYS");
    w.line(format!(
        "$display(\"ERROR: Read from addr 0x%x. Expected 0x%x, got 0x%x\", addr, checkval, {});",
        bus.din
    ));
    w.line("`endif");
    w.close("end");
    w.close("end");
    w.close("endtask");
}

fn emit_stimulus(w: &mut VerilogWriter) {
    let verdict = |w: &mut VerilogWriter| {
        w.line("if (test_pass) $display(\"PASS\");");
        w.line("else $display(\"FAIL\");");
    };
    w.comment("Stimulus");
    w.line("integer LOOPN;");
    w.open("initial begin");
    w.line("#`TICK;");
    w.line("`ifdef GHOSTBUS_TEST_CSRS");
    w.line("$display(\"Reading reset values.\");");
    w.open("for (LOOPN=0; LOOPN<nCSRs; LOOPN=LOOPN+1) begin");
    w.line("#`TICK GB_READ_CHECK(GHOSTBUS_ADDRS[LOOPN], GHOSTBUS_INITVALS[LOOPN]);");
    w.close("end");
    verdict(w);
    w.line("#`TICK test_pass = 1'b1;");
    w.line("$display(\"Writing CSRs with random values.\");");
    w.open("for (LOOPN=0; LOOPN<nCSRs; LOOPN=LOOPN+1) begin");
    w.line("if (GHOSTBUS_WRITABLE[LOOPN]) #`TICK GB_WRITE(GHOSTBUS_ADDRS[LOOPN], GHOSTBUS_RANDVALS[LOOPN]);");
    w.close("end");
    w.line("$display(\"Reading back written values.\");");
    w.open("for (LOOPN=0; LOOPN<nCSRs; LOOPN=LOOPN+1) begin");
    w.line("if (GHOSTBUS_WRITABLE[LOOPN]) #`TICK GB_READ_CHECK(GHOSTBUS_ADDRS[LOOPN], GHOSTBUS_RANDVALS[LOOPN]);");
    w.close("end");
    verdict(w);
    w.line("`endif // GHOSTBUS_TEST_CSRS");
    w.open("if (test_pass) begin");
    w.line("$display(\"PASS\");");
    w.line("$finish(0);");
    w.close("end");
    w.open("else begin");
    w.line("$display(\"FAIL\");");
    w.line("$stop(0);");
    w.close("end");
    w.close("end");
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghostbus_config::PolicyConfig;
    use ghostbus_elaborate::HierarchyBuilder;
    use ghostbus_ir::{lower, parse_netlist};

    const DESIGN: &str = r#"{"top": "top", "modules": [
        {"name": "top",
         "buses": [{"nets": {"clk": "clk", "addr": "addr", "dout": "wdata", "din": "rdata",
                             "we": "we", "re": "re"}, "address_width": 8, "data_width": 16,
                    "base": 256}],
         "nets": [{"name": "ctrl", "width": 4, "initial": 5},
                  {"name": "go", "width": 1, "pulse": true},
                  {"name": "status", "width": 8, "kind": "wire"}],
         "memories": [{"name": "buf", "width": 12, "depth": 16}]}]}"#;

    fn map(seed: u64) -> String {
        let interner = Interner::new();
        let design = lower(&parse_netlist(DESIGN).unwrap(), &interner).unwrap();
        let h = HierarchyBuilder::new(&design, &interner, &PolicyConfig::default())
            .build()
            .unwrap();
        let domain = h.domains.ids().next().unwrap();
        testbench_map(&h, &interner, domain, seed)
    }

    #[test]
    fn lists_csrs_and_rams() {
        let tb = map(0);
        assert!(tb.contains("localparam nCSRs = 3;"));
        assert!(tb.contains("localparam nRAMs = 1;"));
        assert!(tb.contains("GHOSTBUS_ADDRS[0] = 8'h00; // top.ctrl"));
        assert!(tb.contains("GHOSTBUS_INITVALS[0] = 16'h0005;"));
        // ctrl writable; the pulse register and the wire are not.
        assert!(tb.contains("reg [nCSRs-1:0] GHOSTBUS_WRITABLE = 3'h1;"));
        assert!(tb.contains("GHOSTBUS_RAM_WIDTHS[0] = 16'h000c;"));
        assert!(tb.contains("GHOSTBUS_RAM_DEPTHS[0] = 9'h010;"));
        assert!(tb.contains("re = 1'b1;"));
    }

    #[test]
    fn seeded_values_are_reproducible() {
        assert_eq!(map(7), map(7));
    }

    #[test]
    fn random_values_fit_width() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert!(random_value(&mut rng, 3) < 8);
        }
        let _ = random_value(&mut rng, 64);
    }

    #[test]
    fn wide_masks() {
        let mut bits = vec![false; 70];
        bits[0] = true;
        bits[69] = true;
        assert_eq!(mask_literal(&bits), format!("70'h2{}1", "0".repeat(16)));
        assert_eq!(mask_literal(&[]), "1'h0");
    }
}
