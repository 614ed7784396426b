//! Resolved bus net names for one domain.

use ghostbus_common::Interner;
use ghostbus_elaborate::Domain;

/// The bus of one domain with every net name resolved to text.
#[derive(Debug, Clone)]
pub struct BusSignals {
    /// Clock.
    pub clk: String,
    /// Address.
    pub addr: String,
    /// Write data (host to device).
    pub dout: String,
    /// Read data (device to host).
    pub din: String,
    /// Write enable.
    pub we: String,
    /// Write strobe when it is a net of its own.
    pub wstb: Option<String>,
    /// Whether a write strobe is bound at all, possibly sharing `we`.
    pub has_wstb: bool,
    /// Read enable.
    pub re: Option<String>,
    /// Read strobe when it is a net of its own.
    pub rstb: Option<String>,
    /// Whether a read strobe is bound at all, possibly sharing `re`.
    pub has_rstb: bool,
    /// Address width.
    pub aw: u32,
    /// Data width.
    pub dw: u32,
    /// Appended to file and local wire names in multi-domain designs.
    pub suffix: String,
}

impl BusSignals {
    /// Resolves the nets of `domain`'s bus.
    pub fn new(domain: &Domain, interner: &Interner, multi_domain: bool) -> Self {
        let nets = &domain.bus.nets;
        let name = |id| interner.resolve(id).to_string();
        Self {
            clk: name(nets.clk),
            addr: name(nets.addr),
            dout: name(nets.dout),
            din: name(nets.din),
            we: name(nets.we),
            wstb: nets.distinct_wstb().map(name),
            has_wstb: nets.wstb.is_some(),
            re: nets.re.map(name),
            rstb: nets.distinct_rstb().map(name),
            has_rstb: nets.rstb.is_some(),
            aw: domain.bus.address_width,
            dw: domain.bus.data_width,
            suffix: if multi_domain {
                format!("_{}", domain.label(interner))
            } else {
                String::new()
            },
        }
    }

    /// Qualifier for local writes: `we`, ANDed with a distinct `wstb`.
    pub fn write_qualifier(&self) -> String {
        match &self.wstb {
            Some(wstb) => format!("{} & {wstb}", self.we),
            None => self.we.clone(),
        }
    }

    /// Qualifier for read strobes: a distinct `rstb`, else `re` when `rstb`
    /// is bound to the same net. `None` without an `rstb` binding.
    pub fn read_strobe_qualifier(&self) -> Option<String> {
        if !self.has_rstb {
            return None;
        }
        self.rstb.clone().or_else(|| self.re.clone())
    }

    /// Read qualifier for external modules: `re`, else any cycle that is not a write.
    pub fn read_qualifier(&self) -> String {
        self.re.clone().unwrap_or_else(|| format!("~{}", self.we))
    }

    /// Local read-data register name.
    pub fn local_din(&self) -> String {
        format!("local_din{}", self.suffix)
    }
}
