//! The on-disk JSON netlist and its lowering into a [`Design`].
//!
//! This is the interface to the Verilog front-end: every net, memory and
//! instance arrives with its placement request already typed. Lowering interns
//! names, resolves module references, attaches strobe nets to their target
//! registers and reduces generate loops to a concrete count.

use crate::arena::Arena;
use crate::bus::{Bus, BusNets, BusRole};
use crate::design::Design;
use crate::error::IrError;
use crate::external::ExternalModule;
use crate::generate::{CompareOp, LoopBounds, ReplicationGroup, Step};
use crate::ids::ModuleId;
use crate::module::{InstanceDecl, Keepout, ModuleDecl};
use crate::register::{Access, Memory, Register, StrobeKind};
use ghostbus_common::{width_of, Ident, Interner, MAX_ADDRESS_WIDTH};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Root of the JSON netlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetlistFile {
    /// Name of the top-level module.
    pub top: String,
    /// Every module that contributes to the memory map or contains one that does.
    pub modules: Vec<ModuleSpec>,
}

/// One module of the netlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleSpec {
    /// Module name.
    pub name: String,
    /// Buses declared in this module.
    #[serde(default)]
    pub buses: Vec<BusSpec>,
    /// Registers and strobe nets.
    #[serde(default)]
    pub nets: Vec<NetSpec>,
    /// RAM-like arrays.
    #[serde(default)]
    pub memories: Vec<MemorySpec>,
    /// Delegated external bus segments.
    #[serde(default)]
    pub externals: Vec<ExternalSpec>,
    /// Child instances.
    #[serde(default)]
    pub instances: Vec<InstanceSpec>,
    /// Reserved local ranges.
    #[serde(default)]
    pub keepouts: Vec<Keepout>,
}

/// A declared bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusSpec {
    /// Bus name; omit for the single anonymous bus.
    #[serde(default)]
    pub name: Option<String>,
    /// Role→net binding.
    pub nets: BTreeMap<BusRole, String>,
    /// Address width in bits.
    pub address_width: u32,
    /// Data width in bits.
    pub data_width: u32,
    /// Absolute base of the bus.
    #[serde(default)]
    pub base: u64,
}

/// Verilog net kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetKind {
    /// `reg`; host-writable.
    #[default]
    Reg,
    /// `wire`; read-only.
    Wire,
    /// `input` port; read-only.
    Input,
    /// `output` port; read-only.
    Output,
}

/// A register or strobe net.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetSpec {
    /// Net name.
    pub name: String,
    /// Bit width.
    pub width: u32,
    /// Net kind.
    #[serde(default)]
    pub kind: NetKind,
    /// Host access; defaults from `kind`.
    #[serde(default)]
    pub access: Option<Access>,
    /// Pinned local address.
    #[serde(default)]
    pub address: Option<u64>,
    /// Replacement map name.
    #[serde(default)]
    pub alias: Option<String>,
    /// Two's-complement value.
    #[serde(default)]
    pub signed: bool,
    /// Reset value.
    #[serde(default)]
    pub initial: u64,
    /// Declared-bus tag.
    #[serde(default)]
    pub bus: Option<String>,
    /// Register pulses to 1 for one cycle on write.
    #[serde(default)]
    pub pulse: bool,
    /// Makes this net a strobe of another register instead of a register.
    #[serde(default)]
    pub strobe: Option<StrobeSpec>,
    /// Enclosing generate block label.
    #[serde(default)]
    pub generate: Option<String>,
}

/// Strobe association of a net.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrobeSpec {
    /// Register the strobe follows.
    pub target: String,
    /// Transaction that pulses it.
    pub kind: StrobeKind,
}

/// A RAM-like array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemorySpec {
    /// Array name.
    pub name: String,
    /// Word width.
    pub width: u32,
    /// Number of words.
    pub depth: u64,
    /// Host access; defaults to read/write.
    #[serde(default)]
    pub access: Option<Access>,
    /// Pinned local base.
    #[serde(default)]
    pub address: Option<u64>,
    /// Replacement map name.
    #[serde(default)]
    pub alias: Option<String>,
    /// Two's-complement words.
    #[serde(default)]
    pub signed: bool,
    /// Declared-bus tag.
    #[serde(default)]
    pub bus: Option<String>,
    /// Enclosing generate block label.
    #[serde(default)]
    pub generate: Option<String>,
}

/// A delegated external bus segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalSpec {
    /// Name in the map and generated wires.
    pub name: String,
    /// The external instance's role→net binding.
    pub nets: BTreeMap<BusRole, String>,
    /// Address width consumed.
    pub address_width: u32,
    /// Data width.
    pub data_width: u32,
    /// Host access; defaults to read/write.
    #[serde(default)]
    pub access: Option<Access>,
    /// Pinned local base.
    #[serde(default)]
    pub address: Option<u64>,
    /// Replacement map name.
    #[serde(default)]
    pub alias: Option<String>,
    /// Declared-bus tag.
    #[serde(default)]
    pub bus: Option<String>,
    /// Enclosing generate block label.
    #[serde(default)]
    pub generate: Option<String>,
}

/// A child instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceSpec {
    /// Instance name.
    pub name: String,
    /// Module name.
    pub module: String,
    /// Pinned local base.
    #[serde(default)]
    pub address: Option<u64>,
    /// Declared-bus tag.
    #[serde(default)]
    pub bus: Option<String>,
    /// Enclosing generate-for loop.
    #[serde(default)]
    pub generate: Option<GenerateSpec>,
}

/// A generate-for loop around an instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateSpec {
    /// Generate block label.
    pub label: String,
    /// `genvar` name.
    pub index: String,
    /// Initial value expression.
    pub init: String,
    /// Comparison operator (`<`, `<=`, `>`, `>=`, `=`, `!=`).
    pub op: String,
    /// Comparison right-hand side.
    pub limit: String,
    /// Increment clause such as `+1`.
    pub step: String,
    /// Iteration count when the bounds are parametrized.
    #[serde(default)]
    pub count: Option<u32>,
}

/// Parses netlist JSON text.
pub fn parse_netlist(text: &str) -> Result<NetlistFile, IrError> {
    Ok(serde_json::from_str(text)?)
}

/// Reads and parses a netlist file.
pub fn load_netlist(path: &Path) -> Result<NetlistFile, IrError> {
    let text = std::fs::read_to_string(path)?;
    parse_netlist(&text)
}

/// Lowers a parsed netlist into the interned design model.
pub fn lower(file: &NetlistFile, interner: &Interner) -> Result<Design, IrError> {
    let mut ids: HashMap<&str, ModuleId> = HashMap::new();
    let mut modules: Arena<ModuleId, ModuleDecl> = Arena::new();
    for spec in &file.modules {
        if ids.contains_key(spec.name.as_str()) {
            return Err(IrError::DuplicateModule(spec.name.clone()));
        }
        let id = modules.alloc_with(|id| ModuleDecl::new(id, interner.get_or_intern(&spec.name)));
        ids.insert(spec.name.as_str(), id);
    }
    let top = *ids
        .get(file.top.as_str())
        .ok_or_else(|| IrError::UnknownTop(file.top.clone()))?;

    for spec in &file.modules {
        let id = ids[spec.name.as_str()];
        let lowering = ModuleLowering {
            spec,
            interner,
            ids: &ids,
        };
        let decl = lowering.lower(id)?;
        modules[id] = decl;
    }
    Ok(Design { modules, top })
}

struct ModuleLowering<'a> {
    spec: &'a ModuleSpec,
    interner: &'a Interner,
    ids: &'a HashMap<&'a str, ModuleId>,
}

impl ModuleLowering<'_> {
    fn lower(&self, id: ModuleId) -> Result<ModuleDecl, IrError> {
        self.check_unique_names()?;
        let mut decl = ModuleDecl::new(id, self.intern(&self.spec.name));
        decl.keepouts = self.spec.keepouts.clone();
        decl.buses = self
            .spec
            .buses
            .iter()
            .map(|b| self.lower_bus(b))
            .collect::<Result<_, _>>()?;
        decl.registers = self.lower_nets()?;
        decl.memories = self
            .spec
            .memories
            .iter()
            .map(|m| self.lower_memory(m))
            .collect::<Result<_, _>>()?;
        decl.externals = self
            .spec
            .externals
            .iter()
            .map(|e| self.lower_external(e))
            .collect::<Result<_, _>>()?;
        decl.instances = self
            .spec
            .instances
            .iter()
            .map(|i| self.lower_instance(i))
            .collect::<Result<_, _>>()?;
        Ok(decl)
    }

    fn intern(&self, s: &str) -> Ident {
        self.interner.get_or_intern(s)
    }

    fn intern_opt(&self, s: &Option<String>) -> Option<Ident> {
        s.as_deref().map(|s| self.intern(s))
    }

    fn check_unique_names(&self) -> Result<(), IrError> {
        let mut seen = HashSet::new();
        let names = self
            .spec
            .nets
            .iter()
            .map(|n| &n.name)
            .chain(self.spec.memories.iter().map(|m| &m.name))
            .chain(self.spec.externals.iter().map(|e| &e.name))
            .chain(self.spec.instances.iter().map(|i| &i.name));
        for name in names {
            if !seen.insert(name.as_str()) {
                return Err(IrError::DuplicateName {
                    module: self.spec.name.clone(),
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }

    fn lower_roles(
        &self,
        owner: &str,
        roles: &BTreeMap<BusRole, String>,
    ) -> Result<BusNets, IrError> {
        let interned = roles
            .iter()
            .map(|(role, net)| (*role, self.intern(net)))
            .collect();
        BusNets::from_roles(&interned).map_err(|role| IrError::MissingBusRole {
            owner: owner.to_string(),
            role: role.to_string(),
        })
    }

    fn check_address_width(&self, name: &str, width: u32) -> Result<(), IrError> {
        if width > MAX_ADDRESS_WIDTH {
            return Err(IrError::AddressTooWide {
                module: self.spec.name.clone(),
                name: name.to_string(),
                width,
                max: MAX_ADDRESS_WIDTH,
            });
        }
        Ok(())
    }

    fn lower_bus(&self, spec: &BusSpec) -> Result<Bus, IrError> {
        let owner = spec.name.clone().unwrap_or_else(|| self.spec.name.clone());
        if spec.address_width == 0 || spec.data_width == 0 {
            return Err(IrError::ZeroWidth {
                module: self.spec.name.clone(),
                name: owner,
            });
        }
        self.check_address_width(&owner, spec.address_width)?;
        Ok(Bus {
            name: self.intern_opt(&spec.name),
            nets: self.lower_roles(&owner, &spec.nets)?,
            address_width: spec.address_width,
            data_width: spec.data_width,
            base: spec.base,
        })
    }

    fn unsupported_generate(&self, name: &str, generate: &Option<String>) -> Result<(), IrError> {
        match generate {
            Some(label) => Err(IrError::FeatureUnsupported(format!(
                "'{name}' in module '{}' is declared inside generate block '{label}'; only instances may be replicated",
                self.spec.name
            ))),
            None => Ok(()),
        }
    }

    fn lower_nets(&self) -> Result<Vec<Register>, IrError> {
        let mut registers = Vec::new();
        let mut strobes = Vec::new();
        for net in &self.spec.nets {
            self.unsupported_generate(&net.name, &net.generate)?;
            if net.width == 0 {
                return Err(IrError::ZeroWidth {
                    module: self.spec.name.clone(),
                    name: net.name.clone(),
                });
            }
            if let Some(strobe) = &net.strobe {
                strobes.push((net, strobe));
                continue;
            }
            registers.push(self.lower_register(net)?);
        }
        for (net, strobe) in strobes {
            let target = self.intern(&strobe.target);
            let reg = registers
                .iter_mut()
                .find(|r| r.name == target)
                .ok_or_else(|| IrError::UnknownStrobeTarget {
                    module: self.spec.name.clone(),
                    strobe: net.name.clone(),
                    target: strobe.target.clone(),
                })?;
            let (allowed, kind, access) = match strobe.kind {
                StrobeKind::Write => (reg.access.writable(), "write", "writable"),
                StrobeKind::Read => (reg.access.readable(), "read", "readable"),
            };
            if !allowed {
                return Err(IrError::StrobeAccess {
                    module: self.spec.name.clone(),
                    strobe: net.name.clone(),
                    target: strobe.target.clone(),
                    kind,
                    access,
                });
            }
            let name = self.intern(&net.name);
            match strobe.kind {
                StrobeKind::Write => reg.write_strobes.push(name),
                StrobeKind::Read => reg.read_strobes.push(name),
            }
        }
        Ok(registers)
    }

    fn lower_register(&self, net: &NetSpec) -> Result<Register, IrError> {
        let access = match (net.access, net.kind) {
            (Some(access), _) => access,
            (None, NetKind::Reg) => Access::ReadWrite,
            (None, _) => Access::Read,
        };
        if access.writable() && net.kind != NetKind::Reg {
            return Err(IrError::WriteToWire {
                module: self.spec.name.clone(),
                net: net.name.clone(),
            });
        }
        if access == Access::Unspecified {
            log::warn!(
                "register '{}' in module '{}' has unspecified access; decoding as read-only",
                net.name,
                self.spec.name
            );
        }
        Ok(Register {
            name: self.intern(&net.name),
            data_width: net.width,
            access,
            initial: net.initial,
            address: net.address,
            alias: self.intern_opt(&net.alias),
            signed: net.signed,
            pulse: net.pulse,
            write_strobes: Vec::new(),
            read_strobes: Vec::new(),
            bus: self.intern_opt(&net.bus),
        })
    }

    fn lower_memory(&self, spec: &MemorySpec) -> Result<Memory, IrError> {
        self.unsupported_generate(&spec.name, &spec.generate)?;
        if spec.width == 0 || spec.depth == 0 {
            return Err(IrError::ZeroWidth {
                module: self.spec.name.clone(),
                name: spec.name.clone(),
            });
        }
        Ok(Memory {
            name: self.intern(&spec.name),
            data_width: spec.width,
            address_width: width_of(spec.depth),
            access: spec.access.unwrap_or(Access::ReadWrite),
            address: spec.address,
            alias: self.intern_opt(&spec.alias),
            signed: spec.signed,
            bus: self.intern_opt(&spec.bus),
        })
    }

    fn lower_external(&self, spec: &ExternalSpec) -> Result<ExternalModule, IrError> {
        self.unsupported_generate(&spec.name, &spec.generate)?;
        if spec.data_width == 0 {
            return Err(IrError::ZeroWidth {
                module: self.spec.name.clone(),
                name: spec.name.clone(),
            });
        }
        self.check_address_width(&spec.name, spec.address_width)?;
        Ok(ExternalModule {
            name: self.intern(&spec.name),
            nets: self.lower_roles(&spec.name, &spec.nets)?,
            address_width: spec.address_width,
            data_width: spec.data_width,
            access: spec.access.unwrap_or(Access::ReadWrite),
            address: spec.address,
            alias: self.intern_opt(&spec.alias),
            bus: self.intern_opt(&spec.bus),
        })
    }

    fn lower_instance(&self, spec: &InstanceSpec) -> Result<InstanceDecl, IrError> {
        let module = *self
            .ids
            .get(spec.module.as_str())
            .ok_or_else(|| IrError::UnknownModule {
                parent: self.spec.name.clone(),
                instance: spec.name.clone(),
                module: spec.module.clone(),
            })?;
        let generate = spec
            .generate
            .as_ref()
            .map(|g| self.lower_generate(&spec.name, g))
            .transpose()?;
        Ok(InstanceDecl {
            name: self.intern(&spec.name),
            module,
            address: spec.address,
            bus: self.intern_opt(&spec.bus),
            generate,
        })
    }

    fn lower_generate(&self, instance: &str, spec: &GenerateSpec) -> Result<ReplicationGroup, IrError> {
        let invalid = |reason: String| IrError::InvalidLoop {
            module: self.spec.name.clone(),
            instance: instance.to_string(),
            reason,
        };
        let op: CompareOp = spec.op.parse().map_err(invalid)?;
        let step: Step = spec.step.parse().map_err(invalid)?;
        let bounds = LoopBounds {
            index: self.intern(&spec.index),
            init: spec.init.clone(),
            op,
            limit: spec.limit.clone(),
            step,
        };
        let count = match (spec.count, bounds.evaluate()) {
            (Some(count), Some(evaluated)) if count != evaluated => {
                return Err(invalid(format!(
                    "explicit count {count} disagrees with the {evaluated} iterations of {}",
                    bounds.header(&spec.index)
                )));
            }
            (Some(count), _) | (None, Some(count)) => count,
            (None, None) => {
                return Err(IrError::UnresolvedLoopBound {
                    module: self.spec.name.clone(),
                    instance: instance.to_string(),
                    header: bounds.header(&spec.index),
                });
            }
        };
        Ok(ReplicationGroup {
            label: self.intern(&spec.label),
            bounds,
            count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NETLIST: &str = r#"{
        "top": "top",
        "modules": [
            {
                "name": "top",
                "buses": [{
                    "nets": {"clk": "lb_clk", "addr": "lb_addr", "dout": "lb_wdata",
                             "din": "lb_rdata", "we": "lb_write", "wstb": "lb_write"},
                    "address_width": 16, "data_width": 32
                }],
                "nets": [
                    {"name": "ctrl", "width": 8, "initial": 3},
                    {"name": "status", "width": 16, "kind": "wire"},
                    {"name": "ctrl_we", "width": 1, "strobe": {"target": "ctrl", "kind": "write"}}
                ],
                "memories": [{"name": "buf", "width": 16, "depth": 100}],
                "instances": [
                    {"name": "u_chan", "module": "chan",
                     "generate": {"label": "gen_chan", "index": "i", "init": "0",
                                  "op": "<", "limit": "4", "step": "+1"}}
                ]
            },
            {"name": "chan", "nets": [{"name": "gain", "width": 12, "signed": true}]}
        ]
    }"#;

    fn lowered() -> (Design, Interner) {
        let interner = Interner::new();
        let file = parse_netlist(NETLIST).unwrap();
        let design = lower(&file, &interner).unwrap();
        (design, interner)
    }

    #[test]
    fn lowers_registers_with_default_access() {
        let (design, interner) = lowered();
        let top = design.top_module();
        assert_eq!(interner.resolve(top.name), "top");
        assert_eq!(top.registers.len(), 2);
        assert_eq!(top.registers[0].access, Access::ReadWrite);
        assert_eq!(top.registers[0].initial, 3);
        assert_eq!(top.registers[1].access, Access::Read);
    }

    #[test]
    fn strobe_attached_to_target() {
        let (design, interner) = lowered();
        let ctrl = &design.top_module().registers[0];
        assert_eq!(ctrl.write_strobes, vec![interner.get_or_intern("ctrl_we")]);
    }

    #[test]
    fn memory_depth_becomes_width() {
        let (design, _) = lowered();
        assert_eq!(design.top_module().memories[0].address_width, 7);
    }

    #[test]
    fn generate_loop_counted() {
        let (design, interner) = lowered();
        let inst = &design.top_module().instances[0];
        let group = inst.generate.as_ref().unwrap();
        assert_eq!(group.count, 4);
        assert_eq!(interner.resolve(group.bounds.index), "i");
        assert_eq!(interner.resolve(design.modules[inst.module].name), "chan");
    }

    #[test]
    fn bus_shares_strobe_net() {
        let (design, _) = lowered();
        let bus = &design.top_module().buses[0];
        assert!(bus.name.is_none());
        assert_eq!(bus.nets.wstb, Some(bus.nets.we));
        assert_eq!(bus.nets.distinct_wstb(), None);
    }

    fn lower_str(text: &str) -> Result<Design, IrError> {
        lower(&parse_netlist(text)?, &Interner::new())
    }

    #[test]
    fn unknown_module_rejected() {
        let err = lower_str(
            r#"{"top": "top", "modules": [{"name": "top",
                "instances": [{"name": "u0", "module": "nope"}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, IrError::UnknownModule { .. }));
    }

    #[test]
    fn writable_wire_rejected() {
        let err = lower_str(
            r#"{"top": "top", "modules": [{"name": "top",
                "nets": [{"name": "w", "width": 1, "kind": "wire", "access": "rw"}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, IrError::WriteToWire { .. }));
    }

    #[test]
    fn parametrized_loop_needs_count() {
        let text = r#"{"top": "top", "modules": [
            {"name": "top", "instances": [{"name": "u", "module": "leaf",
              "generate": {"label": "g", "index": "i", "init": "0", "op": "<",
                           "limit": "N", "step": "+1"}}]},
            {"name": "leaf"}]}"#;
        assert!(matches!(
            lower_str(text).unwrap_err(),
            IrError::UnresolvedLoopBound { .. }
        ));
        let counted = text.replace("\"+1\"}", "\"+1\", \"count\": 3}");
        let design = lower_str(&counted).unwrap();
        assert_eq!(design.top_module().instances[0].generate.as_ref().unwrap().count, 3);
    }

    #[test]
    fn register_in_generate_block_unsupported() {
        let err = lower_str(
            r#"{"top": "top", "modules": [{"name": "top",
                "nets": [{"name": "r", "width": 1, "generate": "g"}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, IrError::FeatureUnsupported(_)));
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = lower_str(
            r#"{"top": "top", "modules": [{"name": "top",
                "nets": [{"name": "a", "width": 1}],
                "memories": [{"name": "a", "width": 8, "depth": 4}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, IrError::DuplicateName { .. }));
        let err = lower_str(r#"{"top": "top", "modules": [{"name": "top"}, {"name": "top"}]}"#)
            .unwrap_err();
        assert!(matches!(err, IrError::DuplicateModule(_)));
    }

    #[test]
    fn missing_bus_role_rejected() {
        let err = lower_str(
            r#"{"top": "top", "modules": [{"name": "top", "buses": [{
                "nets": {"clk": "c", "addr": "a", "dout": "d", "din": "q"},
                "address_width": 8, "data_width": 8}]}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("'we'"));
    }

    fn bus_module(address_width: u32, data_width: u32) -> String {
        format!(
            r#"{{"top": "top", "modules": [{{"name": "top", "buses": [{{"name": "host",
                "nets": {{"clk": "c", "addr": "a", "dout": "d", "din": "q", "we": "w"}},
                "address_width": {address_width}, "data_width": {data_width}}}]}}]}}"#
        )
    }

    #[test]
    fn bus_widths_bounded() {
        for (aw, dw) in [(0, 32), (8, 0)] {
            let err = lower_str(&bus_module(aw, dw)).unwrap_err();
            assert!(matches!(err, IrError::ZeroWidth { ref name, .. } if name == "host"));
        }
        let err = lower_str(&bus_module(70, 32)).unwrap_err();
        assert!(matches!(err, IrError::AddressTooWide { width: 70, max: 63, .. }));
        assert!(lower_str(&bus_module(63, 32)).is_ok());
        assert!(lower_str(&bus_module(1, 1)).is_ok());
    }

    #[test]
    fn external_address_width_bounded() {
        let text = |aw: u32| {
            format!(
                r#"{{"top": "top", "modules": [{{"name": "top",
                    "externals": [{{"name": "spi", "address_width": {aw}, "data_width": 8,
                        "nets": {{"clk": "c", "addr": "a", "dout": "d", "din": "q", "we": "w"}}}}]}}]}}"#
            )
        };
        let err = lower_str(&text(64)).unwrap_err();
        assert!(matches!(err, IrError::AddressTooWide { ref name, width: 64, .. } if name == "spi"));
        assert!(lower_str(&text(0)).is_ok());
    }

    #[test]
    fn write_strobe_on_read_only_register_rejected() {
        let err = lower_str(
            r#"{"top": "top", "modules": [{"name": "top", "nets": [
                {"name": "fifo", "width": 8, "kind": "wire"},
                {"name": "fifo_we", "width": 1, "strobe": {"target": "fifo", "kind": "write"}}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, IrError::StrobeAccess { kind: "write", .. }));
        assert_eq!(
            err.to_string(),
            "write strobe 'fifo_we' in module 'top' targets 'fifo', which is not host-writable"
        );
    }

    #[test]
    fn read_strobe_on_write_only_register_rejected() {
        let err = lower_str(
            r#"{"top": "top", "modules": [{"name": "top", "nets": [
                {"name": "cmd", "width": 8, "access": "w"},
                {"name": "cmd_re", "width": 1, "strobe": {"target": "cmd", "kind": "read"}}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, IrError::StrobeAccess { kind: "read", access: "readable", .. }));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netlist.json");
        std::fs::write(&path, NETLIST).unwrap();
        let file = load_netlist(&path).unwrap();
        assert_eq!(file.modules.len(), 2);
    }
}
