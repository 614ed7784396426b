//! The bounded power-of-two interval allocator.
//!
//! An [`AddressSpace`] covers local addresses `[0, top)`. At all times the
//! occupied entries, the vacant list and the keepout list tile that range
//! exactly, without gaps or overlaps, and no two vacant intervals touch.

use crate::error::MapError;
use crate::range::{AddressRange, Interval};
use ghostbus_common::{align_up, bits, is_aligned, InternalError, MAX_ADDRESS_WIDTH};
use std::fmt;

/// An occupied range and what occupies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupied<P> {
    /// The aligned range taken.
    pub range: AddressRange,
    /// The element placed there.
    pub payload: P,
}

impl<P> Occupied<P> {
    /// The occupied range as an [`Interval`].
    pub fn interval(&self) -> Interval {
        self.range.interval()
    }
}

/// One piece of the address space, as yielded by [`AddressSpace::segments`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a, P> {
    /// An allocated entry.
    Occupied(&'a Occupied<P>),
    /// Free space.
    Vacant(Interval),
    /// Reserved, never allocatable space.
    Keepout(Interval),
}

impl<P> Segment<'_, P> {
    /// The addresses this segment covers.
    pub fn interval(&self) -> Interval {
        match self {
            Segment::Occupied(entry) => entry.interval(),
            Segment::Vacant(iv) | Segment::Keepout(iv) => *iv,
        }
    }
}

/// Address-ordered merge of the occupied, vacant and keepout lists.
pub struct Segments<'a, P> {
    occupied: &'a [Occupied<P>],
    vacant: &'a [Interval],
    keepout: &'a [Interval],
}

impl<'a, P> Iterator for Segments<'a, P> {
    type Item = Segment<'a, P>;

    fn next(&mut self) -> Option<Self::Item> {
        let o = self.occupied.first().map(|e| e.range.base).unwrap_or(u64::MAX);
        let v = self.vacant.first().map(|iv| iv.start).unwrap_or(u64::MAX);
        let k = self.keepout.first().map(|iv| iv.start).unwrap_or(u64::MAX);
        if let (Some(entry), true) = (self.occupied.first(), o <= v && o <= k) {
            self.occupied = &self.occupied[1..];
            return Some(Segment::Occupied(entry));
        }
        if let (Some(iv), true) = (self.keepout.first(), k <= v) {
            self.keepout = &self.keepout[1..];
            return Some(Segment::Keepout(*iv));
        }
        let iv = self.vacant.first()?;
        self.vacant = &self.vacant[1..];
        Some(Segment::Vacant(*iv))
    }
}

/// A power-of-two address region owned by one hierarchy node.
#[derive(Debug, Clone)]
pub struct AddressSpace<P> {
    label: String,
    capacity: u64,
    top: u64,
    base: u64,
    occupied: Vec<Occupied<P>>,
    vacant: Vec<Interval>,
    keepout: Vec<Interval>,
}

impl<P> AddressSpace<P> {
    /// Creates an empty space of `2^width` addresses.
    ///
    /// Widths above [`MAX_ADDRESS_WIDTH`] are clamped; netlist lowering
    /// rejects them before any region is built.
    pub fn new(label: impl Into<String>, width: u32) -> Self {
        let capacity = 1u64 << width.min(MAX_ADDRESS_WIDTH);
        Self {
            label: label.into(),
            capacity,
            top: capacity,
            base: 0,
            occupied: Vec::new(),
            vacant: vec![Interval::new(0, capacity)],
            keepout: Vec::new(),
        }
    }

    /// Name used in error messages and tables.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// One past the highest usable local address.
    pub fn top(&self) -> u64 {
        self.top
    }

    /// Address width of the region (`log2(top)`, zero when empty).
    pub fn width(&self) -> u32 {
        if self.top <= 1 {
            0
        } else {
            bits(self.top - 1)
        }
    }

    /// Absolute address of local address zero.
    pub fn base(&self) -> u64 {
        self.base
    }

    /// Records the absolute base assigned when the region is attached.
    pub fn set_base(&mut self, base: u64) {
        self.base = base;
    }

    /// Number of occupied entries.
    pub fn len(&self) -> usize {
        self.occupied.len()
    }

    /// Returns `true` if nothing is allocated.
    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }

    /// Occupied entries in address order.
    pub fn entries(&self) -> impl Iterator<Item = &Occupied<P>> {
        self.occupied.iter()
    }

    /// Vacant intervals in address order.
    pub fn vacant(&self) -> &[Interval] {
        &self.vacant
    }

    /// Keepout intervals in address order.
    pub fn keepouts(&self) -> &[Interval] {
        &self.keepout
    }

    /// All segments in address order.
    pub fn segments(&self) -> Segments<'_, P> {
        Segments {
            occupied: &self.occupied,
            vacant: &self.vacant,
            keepout: &self.keepout,
        }
    }

    /// Payload of the entry starting exactly at `base`.
    pub fn get(&self, base: u64) -> Option<&P> {
        self.position(base).ok().map(|i| &self.occupied[i].payload)
    }

    /// Mutable payload of the entry starting exactly at `base`.
    pub fn get_mut(&mut self, base: u64) -> Option<&mut P> {
        match self.position(base) {
            Ok(i) => Some(&mut self.occupied[i].payload),
            Err(_) => None,
        }
    }

    /// The entry whose range contains `addr`.
    pub fn lookup(&self, addr: u64) -> Option<&Occupied<P>> {
        let i = self.occupied.partition_point(|e| e.range.base <= addr);
        let entry = self.occupied.get(i.checked_sub(1)?)?;
        (addr < entry.range.end()).then_some(entry)
    }

    /// One past the highest occupied or reserved address; zero when empty.
    pub fn high_addr(&self) -> u64 {
        let occupied = self.occupied.last().map_or(0, |e| e.range.end());
        let reserved = self.keepout.last().map_or(0, |iv| iv.end);
        occupied.max(reserved)
    }

    /// Places `payload` in `2^width` addresses and returns its base.
    ///
    /// With `addr` the entry goes exactly there; otherwise at the lowest
    /// aligned vacant range that fits.
    pub fn add(&mut self, width: u32, payload: P, addr: Option<u64>) -> Result<u64, MapError> {
        let base = match addr {
            Some(addr) => addr,
            None => self.first_fit(width).ok_or_else(|| MapError::NoRoom {
                label: self.label.clone(),
                width,
                top: self.top,
            })?,
        };
        let slot = self.vet(base, width)?;
        let range = AddressRange::new(base, width);
        self.carve(slot, range.interval());
        let at = self.occupied.partition_point(|e| e.range.base < base);
        self.occupied.insert(at, Occupied { range, payload });
        Ok(base)
    }

    /// Reserves `2^width` addresses at `addr` so nothing is ever placed there.
    pub fn keepout(&mut self, addr: u64, width: u32) -> Result<(), MapError> {
        let slot = self.vet(addr, width)?;
        let iv = AddressRange::new(addr, width).interval();
        self.carve(slot, iv);
        let at = self.keepout.partition_point(|k| k.start < addr);
        self.keepout.insert(at, iv);
        Ok(())
    }

    /// Removes the entry starting at `base` and returns its payload.
    pub fn remove(&mut self, base: u64) -> Result<P, MapError> {
        let i = self.position(base).map_err(|_| MapError::NotFound {
            label: self.label.clone(),
            base,
        })?;
        let entry = self.occupied.remove(i);
        self.vacate(entry.interval());
        Ok(entry.payload)
    }

    /// Lowest aligned base where a `2^width` element would fit.
    pub fn first_fit(&self, width: u32) -> Option<u64> {
        let size = 1u64.checked_shl(width)?;
        self.vacant.iter().find_map(|iv| {
            let start = align_up(iv.start, width)?;
            let end = start.checked_add(size)?;
            (end <= iv.end).then_some(start)
        })
    }

    /// Checks that `2^width` addresses at `base` could be allocated.
    ///
    /// Returns the index of the vacant interval that would be split.
    pub fn vet(&self, base: u64, width: u32) -> Result<usize, MapError> {
        let out_of_bounds = |size| MapError::OutOfBounds {
            label: self.label.clone(),
            base,
            size,
            top: self.top,
        };
        let size = 1u64.checked_shl(width).ok_or_else(|| out_of_bounds(u64::MAX))?;
        if !is_aligned(base, width) {
            return Err(MapError::Alignment {
                label: self.label.clone(),
                base,
                width,
            });
        }
        let end = base
            .checked_add(size)
            .filter(|&end| end <= self.top)
            .ok_or_else(|| out_of_bounds(size))?;
        let want = Interval::new(base, end);
        match self.vacant.iter().position(|iv| iv.covers(want)) {
            Some(slot) => Ok(slot),
            None => Err(self.collision(want)),
        }
    }

    /// Reduces the top to the smallest power of two covering [`high_addr`](Self::high_addr).
    ///
    /// Occupied entries are never evicted; an empty region shrinks to size zero.
    pub fn shrink(&mut self) {
        let high = self.high_addr();
        let new_top = if high == 0 { 0 } else { 1u64 << bits(high - 1) };
        self.vacant.retain(|iv| iv.start < new_top);
        if let Some(last) = self.vacant.last_mut() {
            last.end = last.end.min(new_top);
        }
        log::trace!("{}: shrink {:#x} -> {:#x}", self.label, self.top, new_top);
        self.top = new_top;
    }

    /// Extends the usable top to `new_top`.
    pub fn grow(&mut self, new_top: u64) -> Result<(), MapError> {
        if new_top == self.top {
            return Ok(());
        }
        if new_top < self.top {
            return Err(MapError::GrowBelowTop {
                label: self.label.clone(),
                requested: new_top,
                top: self.top,
            });
        }
        if !new_top.is_power_of_two() {
            return Err(MapError::FeatureUnsupported(format!(
                "{}: region top {new_top:#x} is not a power of two",
                self.label
            )));
        }
        match self.vacant.last_mut() {
            Some(last) if last.end == self.top => last.end = new_top,
            _ => self.vacant.push(Interval::new(self.top, new_top)),
        }
        self.top = new_top;
        self.capacity = self.capacity.max(new_top);
        Ok(())
    }

    /// Drops every entry and keepout and restores the original size.
    pub fn clear(&mut self) {
        self.occupied.clear();
        self.keepout.clear();
        self.top = self.capacity;
        self.vacant = vec![Interval::new(0, self.capacity)];
    }

    /// Verifies the tiling, alignment and vacancy-merge invariants.
    pub fn check_consistency(&self) -> Result<(), InternalError> {
        let mut cursor = 0u64;
        let mut previous_vacant = false;
        for segment in self.segments() {
            let iv = segment.interval();
            if iv.start != cursor {
                return Err(InternalError::new(format!(
                    "{}: segment {iv} does not start at {cursor:#x}",
                    self.label
                )));
            }
            if iv.is_empty() {
                return Err(InternalError::new(format!("{}: empty segment {iv}", self.label)));
            }
            let is_vacant = matches!(segment, Segment::Vacant(_));
            if is_vacant && previous_vacant {
                return Err(InternalError::new(format!(
                    "{}: vacant interval {iv} touches its predecessor",
                    self.label
                )));
            }
            if let Segment::Occupied(entry) = segment {
                if !is_aligned(entry.range.base, entry.range.width) {
                    return Err(InternalError::new(format!(
                        "{}: entry {iv} is misaligned",
                        self.label
                    )));
                }
            }
            previous_vacant = is_vacant;
            cursor = iv.end;
        }
        if cursor != self.top {
            return Err(InternalError::new(format!(
                "{}: segments end at {cursor:#x}, top is {:#x}",
                self.label, self.top
            )));
        }
        Ok(())
    }

    fn position(&self, base: u64) -> Result<usize, usize> {
        self.occupied.binary_search_by_key(&base, |e| e.range.base)
    }

    fn collision(&self, want: Interval) -> MapError {
        let hit = self
            .occupied
            .iter()
            .map(|e| ("entry", e.interval()))
            .chain(self.keepout.iter().map(|iv| ("keepout", *iv)))
            .find(|(_, iv)| iv.intersects(want));
        match hit {
            Some((other, iv)) => MapError::Overlap {
                label: self.label.clone(),
                base: want.start,
                end: want.end,
                other,
                other_start: iv.start,
                other_end: iv.end,
            },
            None => InternalError::new(format!(
                "{}: {want} is neither vacant nor taken",
                self.label
            ))
            .into(),
        }
    }

    fn carve(&mut self, slot: usize, taken: Interval) {
        let free = self.vacant.remove(slot);
        let mut at = slot;
        if free.start < taken.start {
            self.vacant.insert(at, Interval::new(free.start, taken.start));
            at += 1;
        }
        if taken.end < free.end {
            self.vacant.insert(at, Interval::new(taken.end, free.end));
        }
    }

    fn vacate(&mut self, freed: Interval) {
        let at = self.vacant.partition_point(|iv| iv.start < freed.start);
        let lower = at.checked_sub(1).filter(|&i| self.vacant[i].end == freed.start);
        let upper = (at < self.vacant.len() && self.vacant[at].start == freed.end).then_some(at);
        match (lower, upper) {
            // Bridges two free intervals.
            (Some(l), Some(u)) => {
                self.vacant[l].end = self.vacant[u].end;
                self.vacant.remove(u);
            }
            // Extends the free interval below.
            (Some(l), None) => self.vacant[l].end = freed.end,
            // Extends the free interval above, including the first one.
            (None, Some(u)) => self.vacant[u].start = freed.start,
            // Standalone: empty list, before all, between, or after all.
            (None, None) => self.vacant.insert(at, freed),
        }
    }
}

impl<P> fmt::Display for AddressSpace<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const W: usize = 19;
        writeln!(f, "{} (top {:#x})", self.label, self.top)?;
        writeln!(f, "|{:^W$}|{:^W$}|{:^W$}|", "Used", "Free", "Keepout")?;
        writeln!(f, "|{0}|{0}|{0}|", "-".repeat(W))?;
        for segment in self.segments() {
            let iv = segment.interval();
            let cell = format!(" {:8x}-{:8x}", iv.start, iv.end);
            let empty = "";
            let (used, free, keep) = match segment {
                Segment::Occupied(_) => (cell.as_str(), empty, empty),
                Segment::Vacant(_) => (empty, cell.as_str(), empty),
                Segment::Keepout(_) => (empty, empty, cell.as_str()),
            };
            writeln!(f, "|{used:<W$}|{free:<W$}|{keep:<W$}|")?;
        }
        Ok(())
    }
}
