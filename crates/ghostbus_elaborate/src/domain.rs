//! Assignment of elements to bus domains.

use ghostbus_common::{Ident, Interner};
use ghostbus_ir::Bus;

/// Picks the declared bus an element of a bus top belongs to.
///
/// A tag must name one of `buses`; an untagged element defaults to the only
/// bus. Returns the index into `buses`, or the reason the choice is ambiguous.
pub fn select_bus(buses: &[Bus], tag: Option<Ident>, interner: &Interner) -> Result<usize, String> {
    match tag {
        Some(tag) => buses
            .iter()
            .position(|b| b.name == Some(tag))
            .ok_or_else(|| format!("no bus named '{}' is declared here", interner.resolve(tag))),
        None if buses.len() == 1 => Ok(0),
        None => Err(format!(
            "{} buses are declared here and no bus is named",
            buses.len()
        )),
    }
}

/// Checks that an element below a bus top does not name a different bus.
pub fn check_tag(bus: &Bus, tag: Option<Ident>, interner: &Interner) -> Result<(), String> {
    match tag {
        Some(tag) if bus.name != Some(tag) => Err(format!(
            "it names bus '{}' but sits in the domain of bus '{}'",
            interner.resolve(tag),
            bus.name.map_or("<anonymous>", |n| interner.resolve(n))
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghostbus_ir::BusNets;

    fn bus(interner: &Interner, name: Option<&str>) -> Bus {
        let net = |s: &str| interner.get_or_intern(s);
        Bus {
            name: name.map(net),
            nets: BusNets {
                clk: net("clk"),
                addr: net("addr"),
                dout: net("dout"),
                din: net("din"),
                we: net("we"),
                wstb: None,
                re: None,
                rstb: None,
            },
            address_width: 16,
            data_width: 32,
            base: 0,
        }
    }

    #[test]
    fn single_bus_is_default() {
        let interner = Interner::new();
        let buses = vec![bus(&interner, None)];
        assert_eq!(select_bus(&buses, None, &interner), Ok(0));
    }

    #[test]
    fn untagged_with_two_buses_is_ambiguous() {
        let interner = Interner::new();
        let buses = vec![bus(&interner, Some("a")), bus(&interner, Some("b"))];
        let err = select_bus(&buses, None, &interner).unwrap_err();
        assert!(err.starts_with("2 buses"));
        let b = interner.get_or_intern("b");
        assert_eq!(select_bus(&buses, Some(b), &interner), Ok(1));
    }

    #[test]
    fn unknown_tag_rejected() {
        let interner = Interner::new();
        let buses = vec![bus(&interner, Some("a"))];
        let c = interner.get_or_intern("c");
        assert!(select_bus(&buses, Some(c), &interner).is_err());
    }

    #[test]
    fn foreign_tag_inside_domain() {
        let interner = Interner::new();
        let a = bus(&interner, Some("a"));
        let b = interner.get_or_intern("b");
        assert!(check_tag(&a, Some(b), &interner).is_err());
        assert!(check_tag(&a, None, &interner).is_ok());
        assert!(check_tag(&a, a.name, &interner).is_ok());
    }
}
