//! Decode logic for one hierarchy level.
//!
//! A level is one resolved node. Its decode compares the upper address bits
//! against each child's base, drives per-child wires, writes and reads the
//! node's own registers and RAMs, and routes read data back through a
//! priority mux: children, externals, RAMs, then local registers.

use ghostbus_common::Interner;
use ghostbus_elaborate::{Element, Hierarchy, Node};
use ghostbus_ir::{ExternalModule, Memory, NodeId, Register};
use ghostbus_map::Placement;

use crate::error::DecodeError;
use crate::signals::BusSignals;
use crate::writer::{extend, slice, vhex, VerilogWriter};

const WSTB_HINT: &str =
    "bind one, or bind the write-enable net to both 'we' and 'wstb' if writes last a single cycle";
const RSTB_HINT: &str =
    "bind one, or bind the read-enable net to both 're' and 'rstb' if reads last a single cycle";

struct Csr<'a> {
    reg: &'a Register,
    addr: u64,
}

struct Ram<'a> {
    mem: &'a Memory,
    base: u64,
}

struct Ext<'a> {
    ext: &'a ExternalModule,
    base: u64,
}

enum Child<'a> {
    Single { node: NodeId, base: u64, width: u32 },
    /// Replicas decode against the group's slot width; a loose slot wider
    /// than a replica's region aliases the replica across the spare bits.
    Group { nodes: Vec<NodeId>, placement: &'a Placement },
}

/// Emits the decode logic of one node.
pub struct LevelDecoder<'a> {
    hierarchy: &'a Hierarchy,
    interner: &'a Interner,
    bus: &'a BusSignals,
    node: &'a Node,
    csrs: Vec<Csr<'a>>,
    rams: Vec<Ram<'a>>,
    exts: Vec<Ext<'a>>,
    children: Vec<Child<'a>>,
}

impl<'a> LevelDecoder<'a> {
    /// Collects the resolved layout of `node`.
    pub fn new(hierarchy: &'a Hierarchy, interner: &'a Interner, bus: &'a BusSignals, node: NodeId) -> Self {
        let node = hierarchy.node(node);
        let mut decoder = Self {
            hierarchy,
            interner,
            bus,
            node,
            csrs: Vec::new(),
            rams: Vec::new(),
            exts: Vec::new(),
            children: Vec::new(),
        };
        for item in node.region.items() {
            let base = item.placement.base();
            if item.grouped {
                let nodes = item.payloads.iter().filter_map(Element::submodule).collect();
                decoder.children.push(Child::Group {
                    nodes,
                    placement: item.placement,
                });
                continue;
            }
            match &item.payloads[0] {
                Element::Register(reg) => decoder.csrs.push(Csr { reg, addr: base }),
                Element::Memory(mem) => decoder.rams.push(Ram { mem, base }),
                Element::External(ext) => decoder.exts.push(Ext { ext, base }),
                Element::Submodule(child) => decoder.children.push(Child::Single {
                    node: *child,
                    base,
                    width: item.placement.width,
                }),
            }
        }
        decoder
    }

    fn name(&self, id: ghostbus_common::Ident) -> &'a str {
        self.interner.resolve(id)
    }

    fn inst(&self, id: NodeId) -> &'a str {
        self.name(self.hierarchy.node(id).instance)
    }

    /// Address bits decoded at this level.
    pub fn parent_width(&self) -> u32 {
        match self.node.parent {
            None => self.bus.aw,
            Some(_) => self.node.width(),
        }
    }

    fn local_select(&self) -> String {
        let pw = self.parent_width().max(1);
        slice(&self.bus.addr, pw - 1, 0)
    }

    fn local_addr(&self, addr: u64) -> String {
        vhex(addr, self.parent_width().max(1))
    }

    /// Compare selecting a `2^width` block at `base`.
    fn select(&self, base: u64, width: u32) -> String {
        let pw = self.parent_width();
        if width >= pw {
            return "1'b1".to_string();
        }
        format!(
            "{} == {}",
            slice(&self.bus.addr, pw - 1, width),
            vhex(base >> width, pw - width)
        )
    }

    /// Full-width address relative to a `2^width` block.
    fn relative_addr(&self, width: u32) -> String {
        let aw = self.bus.aw;
        if width == 0 {
            vhex(0, aw)
        } else if width >= aw {
            self.bus.addr.clone()
        } else {
            format!("{{{}, {}}}", vhex(0, aw - width), slice(&self.bus.addr, width - 1, 0))
        }
    }

    fn ram_index(&self, mem: &Memory) -> String {
        let word = match mem.address_width {
            0 => "0".to_string(),
            aw => slice(&self.bus.addr, aw - 1, 0),
        };
        format!("{}[{word}]", self.name(mem.name))
    }

    fn read_value(&self, expr: &str, width: u32, signed: bool) -> String {
        let msb = signed.then(|| format!("{expr}[{}]", width - 1));
        extend(expr, width, self.bus.dw, msb.as_deref())
    }

    /// Bus nets forwarded to children ANDed with the child's enable.
    fn qualified_nets(&self) -> Vec<&'a str> {
        let bus = self.bus;
        let mut nets = vec![bus.we.as_str()];
        nets.extend(bus.wstb.as_deref());
        nets.extend(bus.re.as_deref());
        nets.extend(bus.rstb.as_deref());
        nets
    }

    fn readable_csrs(&self) -> impl Iterator<Item = &Csr<'a>> {
        self.csrs.iter().filter(|c| c.reg.access.readable())
    }

    fn writable_csrs(&self) -> impl Iterator<Item = &Csr<'a>> {
        self.csrs.iter().filter(|c| c.reg.access.writable())
    }

    /// Checks that every strobe has a bus net to qualify it.
    pub fn check_roles(&self) -> Result<(), DecodeError> {
        for csr in self.writable_csrs() {
            let reg = csr.reg;
            if (reg.pulse || !reg.write_strobes.is_empty()) && !self.bus.has_wstb {
                let element = reg.write_strobes.first().copied().unwrap_or(reg.name);
                return Err(DecodeError::MissingBusRole {
                    path: self.node.path_name(),
                    element: self.name(element).to_string(),
                    role: "wstb",
                    hint: WSTB_HINT,
                });
            }
        }
        for csr in self.readable_csrs() {
            if let Some(&strobe) = csr.reg.read_strobes.first() {
                if !self.bus.has_rstb {
                    return Err(DecodeError::MissingBusRole {
                        path: self.node.path_name(),
                        element: self.name(strobe).to_string(),
                        role: "rstb",
                        hint: RSTB_HINT,
                    });
                }
            }
        }
        Ok(())
    }

    /// The complete decode text for this node.
    pub fn decode(&self) -> Result<String, DecodeError> {
        self.check_roles()?;
        let mut w = VerilogWriter::new();
        w.comment(format!(
            "Auto-generated by ghostbus for module {}; do not edit",
            self.name(self.node.module_name)
        ));
        self.emit_children(&mut w);
        self.emit_externals(&mut w);
        self.emit_local_decls(&mut w);
        self.emit_clocked(&mut w);
        self.emit_comb_reads(&mut w);
        self.emit_din(&mut w);
        Ok(w.finish())
    }

    fn emit_children(&self, w: &mut VerilogWriter) {
        let (dw, aw) = (self.bus.dw, self.bus.aw);
        let (din, addr) = (&self.bus.din, &self.bus.addr);
        for child in &self.children {
            match child {
                Child::Single { node, base, width } => {
                    let inst = self.inst(*node);
                    let end = base + (1u64 << width) - 1;
                    w.comment(format!("submodule {inst}: {base:#x}-{end:#x}"));
                    w.line(format!("wire [{}:0] {din}_{inst};", dw - 1));
                    w.line(format!("wire en_{inst} = {};", self.select(*base, *width)));
                    w.line(format!(
                        "wire [{}:0] {addr}_{inst} = {};",
                        aw - 1,
                        self.relative_addr(*width)
                    ));
                    for net in self.qualified_nets() {
                        w.line(format!("wire {net}_{inst} = {net} & en_{inst};"));
                    }
                }
                Child::Group { nodes, placement } => {
                    let Some(&first) = nodes.first() else { continue };
                    let inst = self.inst(first);
                    let n = nodes.len();
                    let cw = placement.width;
                    w.comment(format!(
                        "replicated submodule {inst}: {n} x {:#x} at stride {:#x} from {:#x}",
                        1u64 << cw,
                        placement.stride,
                        placement.base()
                    ));
                    w.line(format!("wire [{}:0] {din}_{inst} [0:{}];", dw - 1, n - 1));
                    w.line(format!("wire [{}:0] en_{inst};", n - 1));
                    w.line(format!(
                        "wire [{}:0] {addr}_{inst} = {};",
                        aw - 1,
                        self.relative_addr(cw)
                    ));
                    match &placement.block {
                        Some(block) => {
                            let bw = block.width;
                            w.line(format!("wire en_{inst}_blk = {};", self.select(block.base, bw)));
                            if bw > cw {
                                w.line(format!(
                                    "wire [{}:0] idx_{inst} = {};",
                                    bw - cw - 1,
                                    slice(addr, bw - 1, cw)
                                ));
                                w.line(format!(
                                    "assign en_{inst} = en_{inst}_blk ? ({} << idx_{inst}) : {};",
                                    vhex(1, n as u32),
                                    vhex(0, n as u32)
                                ));
                            } else {
                                w.line(format!("assign en_{inst} = en_{inst}_blk;"));
                            }
                        }
                        None => {
                            for (k, base) in placement.bases.iter().enumerate() {
                                w.line(format!("assign en_{inst}[{k}] = {};", self.select(*base, cw)));
                            }
                        }
                    }
                    for net in self.qualified_nets() {
                        w.line(format!(
                            "wire [{}:0] {net}_{inst} = {{{n}{{{net}}}}} & en_{inst};",
                            n - 1
                        ));
                    }
                }
            }
        }
    }

    fn emit_externals(&self, w: &mut VerilogWriter) {
        let bus = self.bus;
        for Ext { ext, base } in &self.exts {
            let name = self.name(ext.name);
            let (ew, edw) = (ext.address_width, ext.data_width);
            let end = base + (1u64 << ew) - 1;
            w.comment(format!("external module {name}: {base:#x}-{end:#x}"));
            w.line(format!("wire en_{name} = {};", self.select(*base, ew)));
            let nets = &ext.nets;
            let addr = match ew {
                0 => vhex(0, 1),
                _ => slice(&bus.addr, ew - 1, 0),
            };
            w.line(format!("assign {} = {addr};", self.name(nets.addr)));
            w.line(format!("assign {} = {};", self.name(nets.dout), slice(&bus.dout, edw - 1, 0)));
            w.line(format!("assign {} = {} & en_{name};", self.name(nets.we), bus.we));
            if let Some(wstb) = nets.distinct_wstb() {
                let qual = bus.wstb.as_deref().unwrap_or(&bus.we);
                w.line(format!("assign {} = {qual} & en_{name};", self.name(wstb)));
            }
            if let Some(re) = nets.re {
                w.line(format!("assign {} = {} & en_{name};", self.name(re), bus.read_qualifier()));
            }
            if let Some(rstb) = nets.distinct_rstb() {
                let qual = bus
                    .read_strobe_qualifier()
                    .unwrap_or_else(|| bus.read_qualifier());
                w.line(format!("assign {} = {qual} & en_{name};", self.name(rstb)));
            }
        }
    }

    fn emit_local_decls(&self, w: &mut VerilogWriter) {
        let dw = self.bus.dw;
        if self.readable_csrs().next().is_some() {
            w.comment("local registers");
            match self.bus.re {
                Some(_) => w.line(format!("reg [{}:0] {} = 0;", dw - 1, self.bus.local_din())),
                None => w.line(format!("reg [{}:0] {};", dw - 1, self.bus.local_din())),
            }
        }
        for Ram { mem, base } in &self.rams {
            let name = self.name(mem.name);
            let end = base + (1u64 << mem.address_width) - 1;
            w.comment(format!("RAM {name}: {base:#x}-{end:#x}"));
            w.line(format!("wire en_{name} = {};", self.select(*base, mem.address_width)));
            if mem.access.readable() {
                w.line(format!("reg [{}:0] rdata_{name} = 0;", dw - 1));
            }
        }
    }

    fn emit_clocked(&self, w: &mut VerilogWriter) {
        let bus = self.bus;
        let mut defaults = Vec::new();
        for csr in self.writable_csrs() {
            let reg = csr.reg;
            if reg.pulse {
                defaults.push(format!("{} <= {};", self.name(reg.name), vhex(0, reg.data_width)));
            }
            for s in &reg.write_strobes {
                defaults.push(format!("{} <= 1'b0;", self.name(*s)));
            }
        }
        for csr in self.readable_csrs() {
            for s in &csr.reg.read_strobes {
                defaults.push(format!("{} <= 1'b0;", self.name(*s)));
            }
        }
        let has_writes = self.writable_csrs().next().is_some();
        let read_strobed: Vec<&Csr<'a>> = self
            .readable_csrs()
            .filter(|c| !c.reg.read_strobes.is_empty())
            .collect();
        let registered_reads = bus.re.is_some() && self.readable_csrs().next().is_some();
        if defaults.is_empty() && !has_writes && self.rams.is_empty() && !registered_reads {
            return;
        }

        let wq = bus.write_qualifier();
        let select = self.local_select();
        w.open(format!("always @(posedge {}) begin", bus.clk));
        if !defaults.is_empty() {
            w.comment("strobe defaults");
            for line in &defaults {
                w.line(line);
            }
        }
        if has_writes {
            w.comment("register writes");
            w.open(format!("if ({wq}) begin"));
            w.open(format!("case ({select})"));
            for csr in self.writable_csrs() {
                let reg = csr.reg;
                let name = self.name(reg.name);
                let value = if reg.pulse {
                    vhex(1, reg.data_width)
                } else {
                    slice(&bus.dout, reg.data_width - 1, 0)
                };
                let addr = self.local_addr(csr.addr);
                if reg.write_strobes.is_empty() {
                    w.line(format!("{addr}: {name} <= {value};"));
                } else {
                    w.open(format!("{addr}: begin"));
                    w.line(format!("{name} <= {value};"));
                    for s in &reg.write_strobes {
                        w.line(format!("{} <= 1'b1;", self.name(*s)));
                    }
                    w.close("end");
                }
            }
            w.close("endcase");
            w.close("end");
        }
        for Ram { mem, .. } in &self.rams {
            let name = self.name(mem.name);
            let word = self.ram_index(mem);
            if mem.access.writable() {
                w.comment(format!("RAM {name} write"));
                w.line(format!(
                    "if ({wq} & en_{name}) {word} <= {};",
                    slice(&bus.dout, mem.data_width - 1, 0)
                ));
            }
            if mem.access.readable() {
                w.comment(format!("RAM {name} read, one cycle latency"));
                w.line(format!(
                    "rdata_{name} <= {};",
                    self.read_value(&word, mem.data_width, mem.signed)
                ));
            }
        }
        if let (false, Some(rq)) = (read_strobed.is_empty(), bus.read_strobe_qualifier()) {
            w.comment("read strobes");
            w.open(format!("if ({rq}) begin"));
            w.open(format!("case ({select})"));
            for csr in &read_strobed {
                let addr = self.local_addr(csr.addr);
                match csr.reg.read_strobes.as_slice() {
                    [only] => w.line(format!("{addr}: {} <= 1'b1;", self.name(*only))),
                    strobes => {
                        w.open(format!("{addr}: begin"));
                        for s in strobes {
                            w.line(format!("{} <= 1'b1;", self.name(*s)));
                        }
                        w.close("end");
                    }
                }
            }
            w.close("endcase");
            w.close("end");
        }
        if let (true, Some(re)) = (registered_reads, &bus.re) {
            let local_din = bus.local_din();
            w.comment("register reads");
            w.open(format!("if ({re}) begin"));
            w.open(format!("case ({select})"));
            for csr in self.readable_csrs() {
                let reg = csr.reg;
                w.line(format!(
                    "{}: {local_din} <= {};",
                    self.local_addr(csr.addr),
                    self.read_value(self.name(reg.name), reg.data_width, reg.signed)
                ));
            }
            w.line(format!("default: {local_din} <= {};", vhex(0, bus.dw)));
            w.close("endcase");
            w.close("end");
        }
        w.close("end");
    }

    fn emit_comb_reads(&self, w: &mut VerilogWriter) {
        if self.bus.re.is_some() || self.readable_csrs().next().is_none() {
            return;
        }
        let local_din = self.bus.local_din();
        w.comment("register reads");
        w.open("always @(*) begin");
        w.open(format!("case ({})", self.local_select()));
        for csr in self.readable_csrs() {
            let reg = csr.reg;
            w.line(format!(
                "{}: {local_din} = {};",
                self.local_addr(csr.addr),
                self.read_value(self.name(reg.name), reg.data_width, reg.signed)
            ));
        }
        w.line(format!("default: {local_din} = {};", vhex(0, self.bus.dw)));
        w.close("endcase");
        w.close("end");
    }

    fn emit_din(&self, w: &mut VerilogWriter) {
        let bus = self.bus;
        let mut sources = Vec::new();
        for child in &self.children {
            match child {
                Child::Single { node, .. } => {
                    let inst = self.inst(*node);
                    sources.push((format!("en_{inst}"), format!("{}_{inst}", bus.din)));
                }
                Child::Group { nodes, .. } => {
                    let Some(&first) = nodes.first() else { continue };
                    let inst = self.inst(first);
                    for k in 0..nodes.len() {
                        sources.push((format!("en_{inst}[{k}]"), format!("{}_{inst}[{k}]", bus.din)));
                    }
                }
            }
        }
        for Ext { ext, .. } in &self.exts {
            let name = self.name(ext.name);
            let value = extend(self.name(ext.nets.din), ext.data_width, bus.dw, None);
            sources.push((format!("en_{name}"), value));
        }
        for Ram { mem, .. } in self.rams.iter().filter(|r| r.mem.access.readable()) {
            let name = self.name(mem.name);
            sources.push((format!("en_{name}"), format!("rdata_{name}")));
        }
        let fallback = if self.readable_csrs().next().is_some() {
            bus.local_din()
        } else {
            vhex(0, bus.dw)
        };

        w.comment("read data routing");
        let Some(((cond, value), rest)) = sources.split_first() else {
            w.line(format!("assign {} = {fallback};", bus.din));
            return;
        };
        w.open(format!("assign {} = {cond} ? {value} :", bus.din));
        for (cond, value) in rest {
            w.line(format!("{cond} ? {value} :"));
        }
        w.close(format!("  {fallback};"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghostbus_config::{PolicyConfig, ReplicationMode};
    use ghostbus_elaborate::HierarchyBuilder;
    use ghostbus_ir::{lower, parse_netlist};

    const BUS: &str = r#"{"clk": "lb_clk", "addr": "lb_addr", "dout": "lb_wdata",
                                    "din": "lb_rdata", "we": "lb_write"}"#;

    fn hierarchy(text: &str, mode: ReplicationMode) -> (Hierarchy, Interner) {
        let interner = Interner::new();
        let design = lower(&parse_netlist(text).unwrap(), &interner).unwrap();
        let policy = PolicyConfig {
            replication: mode,
            ..PolicyConfig::default()
        };
        let h = HierarchyBuilder::new(&design, &interner, &policy).build().unwrap();
        (h, interner)
    }

    fn decode_node(h: &Hierarchy, interner: &Interner, path: &str) -> Result<String, DecodeError> {
        let (id, node) = h.nodes.iter().find(|(_, n)| n.path_name() == path).unwrap();
        let bus = BusSignals::new(h.domain(node.domain), interner, h.is_multi_domain());
        LevelDecoder::new(h, interner, &bus, id).decode()
    }

    fn single_level(bus: &str, nets: &str) -> String {
        format!(
            r#"{{"top": "top", "modules": [{{"name": "top",
                "buses": [{{"nets": {bus}, "address_width": 8, "data_width": 16}}],
                "nets": [{nets}]}}]}}"#
        )
    }

    #[test]
    fn combinational_reads_without_read_enable() {
        let text = single_level(
            BUS,
            r#"{"name": "ctrl", "width": 8}, {"name": "status", "width": 4, "kind": "wire"}"#,
        );
        let (h, interner) = hierarchy(&text, ReplicationMode::Packed);
        let v = decode_node(&h, &interner, "top").unwrap();
        assert!(v.contains("reg [15:0] local_din;"));
        assert!(v.contains("always @(*) begin"));
        assert!(v.contains("8'h00: local_din = {8'h00, ctrl};"));
        assert!(v.contains("8'h01: local_din = {12'h000, status};"));
        assert!(v.contains("default: local_din = 16'h0000;"));
        assert!(v.contains("if (lb_write) begin"));
        assert!(v.contains("8'h00: ctrl <= lb_wdata[7:0];"));
        assert!(!v.contains("status <="));
        assert!(v.contains("assign lb_rdata = local_din;"));
    }

    #[test]
    fn registered_reads_with_read_enable() {
        let bus = r#"{"clk": "clk", "addr": "addr", "dout": "wdata", "din": "rdata",
                      "we": "we", "re": "re"}"#;
        let text = single_level(bus, r#"{"name": "gain", "width": 12, "signed": true}"#);
        let (h, interner) = hierarchy(&text, ReplicationMode::Packed);
        let v = decode_node(&h, &interner, "top").unwrap();
        assert!(v.contains("reg [15:0] local_din = 0;"));
        assert!(!v.contains("always @(*)"));
        assert!(v.contains("if (re) begin"));
        assert!(v.contains("8'h00: local_din <= {{4{gain[11]}}, gain};"));
        assert!(v.contains("default: local_din <= 16'h0000;"));
    }

    #[test]
    fn write_strobes_need_wstb() {
        let text = single_level(
            BUS,
            r#"{"name": "go", "width": 1, "pulse": true}"#,
        );
        let (h, interner) = hierarchy(&text, ReplicationMode::Packed);
        let err = decode_node(&h, &interner, "top").unwrap_err();
        assert!(matches!(err, DecodeError::MissingBusRole { role: "wstb", .. }));
    }

    #[test]
    fn strobes_default_low_and_pulse() {
        let bus = r#"{"clk": "clk", "addr": "addr", "dout": "wdata", "din": "rdata",
                      "we": "we", "wstb": "wstb", "re": "re", "rstb": "rstb"}"#;
        let text = single_level(
            bus,
            r#"{"name": "go", "width": 1, "pulse": true},
               {"name": "ctrl", "width": 8},
               {"name": "ctrl_we", "width": 1, "strobe": {"target": "ctrl", "kind": "write"}},
               {"name": "fifo", "width": 8, "kind": "wire"},
               {"name": "fifo_re", "width": 1, "strobe": {"target": "fifo", "kind": "read"}}"#,
        );
        let (h, interner) = hierarchy(&text, ReplicationMode::Packed);
        let v = decode_node(&h, &interner, "top").unwrap();
        assert!(v.contains("go <= 1'h0;"));
        assert!(v.contains("ctrl_we <= 1'b0;"));
        assert!(v.contains("fifo_re <= 1'b0;"));
        assert!(v.contains("if (we & wstb) begin"));
        assert!(v.contains("8'h00: go <= 1'h1;"));
        assert!(v.contains("8'h01: begin"));
        assert!(v.contains("ctrl_we <= 1'b1;"));
        assert!(v.contains("if (rstb) begin"));
        assert!(v.contains("8'h02: fifo_re <= 1'b1;"));
    }

    #[test]
    fn read_strobe_without_qualifier_rejected() {
        let text = single_level(
            BUS,
            r#"{"name": "fifo", "width": 8, "kind": "wire"},
               {"name": "fifo_re", "width": 1, "strobe": {"target": "fifo", "kind": "read"}}"#,
        );
        let (h, interner) = hierarchy(&text, ReplicationMode::Packed);
        let err = decode_node(&h, &interner, "top").unwrap_err();
        assert!(matches!(err, DecodeError::MissingBusRole { role: "rstb", .. }));
    }

    #[test]
    fn read_enable_alone_does_not_qualify_read_strobes() {
        let nets = r#"{"name": "fifo", "width": 8, "kind": "wire"},
               {"name": "fifo_re", "width": 1, "strobe": {"target": "fifo", "kind": "read"}}"#;
        let re_only = r#"{"clk": "clk", "addr": "addr", "dout": "wdata", "din": "rdata",
                          "we": "we", "re": "re"}"#;
        let (h, interner) = hierarchy(&single_level(re_only, nets), ReplicationMode::Packed);
        let err = decode_node(&h, &interner, "top").unwrap_err();
        assert!(matches!(err, DecodeError::MissingBusRole { role: "rstb", .. }));

        let shared = r#"{"clk": "clk", "addr": "addr", "dout": "wdata", "din": "rdata",
                         "we": "we", "re": "re", "rstb": "re"}"#;
        let (h, interner) = hierarchy(&single_level(shared, nets), ReplicationMode::Packed);
        let v = decode_node(&h, &interner, "top").unwrap();
        assert!(v.contains("if (re) begin"));
        assert!(v.contains("fifo_re <= 1'b1;"));
    }

    fn with_children(mode: ReplicationMode) -> (Hierarchy, Interner) {
        let text = format!(
            r#"{{"top": "top", "modules": [
                {{"name": "top",
                  "buses": [{{"nets": {BUS}, "address_width": 8, "data_width": 16}}],
                  "nets": [{{"name": "ctrl", "width": 1}}],
                  "memories": [{{"name": "buf", "width": 8, "depth": 16}}],
                  "externals": [{{"name": "spi", "address_width": 2, "data_width": 8,
                      "nets": {{"clk": "spi_clk", "addr": "spi_addr", "dout": "spi_wdata",
                               "din": "spi_rdata", "we": "spi_we"}}}}],
                  "instances": [
                    {{"name": "u_adc", "module": "adc"}},
                    {{"name": "u_ch", "module": "chan",
                      "generate": {{"label": "gen_ch", "index": "i", "init": "0",
                                   "op": "<", "limit": "3", "step": "+1"}}}}]}},
                {{"name": "adc", "nets": [{{"name": "a", "width": 8}}, {{"name": "b", "width": 8}}]}},
                {{"name": "chan", "nets": [{{"name": "gain", "width": 8}}]}}]}}"#
        );
        hierarchy(&text, mode)
    }

    #[test]
    fn child_decode_wires() {
        let (h, interner) = with_children(ReplicationMode::Packed);
        let v = decode_node(&h, &interner, "top").unwrap();
        let adc = h
            .nodes
            .values()
            .find(|n| n.path_name() == "top.u_adc")
            .unwrap();
        let expected = format!(
            "wire en_u_adc = lb_addr[7:1] == {};",
            vhex(adc.offset >> 1, 7)
        );
        assert!(v.contains(&expected), "{v}");
        assert!(v.contains("wire [15:0] lb_rdata_u_adc;"));
        assert!(v.contains("wire [7:0] lb_addr_u_adc = {7'h00, lb_addr[0:0]};"));
        assert!(v.contains("wire lb_write_u_adc = lb_write & en_u_adc;"));
        assert!(v.contains("en_u_adc ? lb_rdata_u_adc :"));
    }

    #[test]
    fn packed_group_uses_block_compare_and_index() {
        let (h, interner) = with_children(ReplicationMode::Packed);
        let v = decode_node(&h, &interner, "top").unwrap();
        assert!(v.contains("wire [15:0] lb_rdata_u_ch [0:2];"));
        assert!(v.contains("wire [2:0] en_u_ch;"));
        assert!(v.contains("wire en_u_ch_blk = lb_addr[7:2] == "));
        assert!(v.contains("wire [1:0] idx_u_ch = lb_addr[1:0];"));
        assert!(v.contains("assign en_u_ch = en_u_ch_blk ? (3'h1 << idx_u_ch) : 3'h0;"));
        assert!(v.contains("wire [2:0] lb_write_u_ch = {3{lb_write}} & en_u_ch;"));
        assert!(v.contains("en_u_ch[2] ? lb_rdata_u_ch[2] :"));
    }

    #[test]
    fn loose_group_compares_each_replica() {
        let (h, interner) = with_children(ReplicationMode::Loose);
        let v = decode_node(&h, &interner, "top").unwrap();
        assert!(!v.contains("en_u_ch_blk"));
        assert!(v.contains("assign en_u_ch[0] = lb_addr[7:0] == "));
        assert!(v.contains("assign en_u_ch[2] = lb_addr[7:0] == "));
    }

    #[test]
    fn ram_and_external_paths() {
        let (h, interner) = with_children(ReplicationMode::Packed);
        let v = decode_node(&h, &interner, "top").unwrap();
        assert!(v.contains("reg [15:0] rdata_buf = 0;"));
        assert!(v.contains("if (lb_write & en_buf) buf[lb_addr[3:0]] <= lb_wdata[7:0];"));
        assert!(v.contains("rdata_buf <= {8'h00, buf[lb_addr[3:0]]};"));
        assert!(v.contains("assign spi_addr = lb_addr[1:0];"));
        assert!(v.contains("assign spi_wdata = lb_wdata[7:0];"));
        assert!(v.contains("assign spi_we = lb_write & en_spi;"));
        assert!(v.contains("en_spi ? {8'h00, spi_rdata} :"));
        // Priority: children, externals, RAMs, local registers.
        let child = v.find("en_u_adc ? ").unwrap();
        let ext = v.find("en_spi ? ").unwrap();
        let ram = v.find("en_buf ? ").unwrap();
        let local = v.find("  local_din;").unwrap();
        assert!(child < ext && ext < ram && ram < local);
    }

    #[test]
    fn child_level_decodes_own_width() {
        let (h, interner) = with_children(ReplicationMode::Packed);
        let v = decode_node(&h, &interner, "top.u_adc").unwrap();
        assert!(v.contains("case (lb_addr[0:0])"));
        assert!(v.contains("1'h1: b <= lb_wdata[7:0];"));
        assert!(!v.contains("wire en_"));
    }
}
