//! Deferred, ordered placement on top of an [`AddressSpace`].
//!
//! Entries are staged in declaration order and placed by
//! [`StagedRegion::resolve`] in three passes: keepouts, then pinned entries,
//! then auto-placed entries in staging order. A pinned address therefore
//! always wins over an auto-placed entry declared before it.

use crate::error::MapError;
use crate::range::AddressRange;
use crate::replicate::{Placement, ReplicationResolver};
use crate::space::AddressSpace;

/// Resolution state of a staged entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageState {
    /// Not yet placed.
    Unresolved,
    /// Placed; its [`Placement`] is valid.
    Resolved,
}

/// What the underlying [`AddressSpace`] stores: an index into the staged entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    /// Index of the staged entry.
    pub entry: usize,
    /// Replica index within a group; zero for single entries.
    pub replica: usize,
}

/// One staged element or replica group.
#[derive(Debug, Clone)]
pub struct StagedEntry<P> {
    payloads: Vec<P>,
    grouped: bool,
    requested: Option<u64>,
    width: u32,
    state: StageState,
    placement: Option<Placement>,
}

impl<P> StagedEntry<P> {
    /// The element, or one payload per replica.
    pub fn payloads(&self) -> &[P] {
        &self.payloads
    }

    /// Whether this entry is a replica group.
    pub fn is_group(&self) -> bool {
        self.grouped
    }

    /// Pinned base, if any.
    pub fn requested(&self) -> Option<u64> {
        self.requested
    }

    /// Address width of each element.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Resolution state.
    pub fn state(&self) -> StageState {
        self.state
    }

    /// Where the entry landed, once resolved.
    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }
}

/// A resolved entry as seen by consumers walking the region.
#[derive(Debug)]
pub struct ResolvedItem<'a, P> {
    /// Index of the staged entry.
    pub index: usize,
    /// Where it landed.
    pub placement: &'a Placement,
    /// One payload per base in `placement`.
    pub payloads: &'a [P],
    /// Whether the entry is a replica group.
    pub grouped: bool,
}

#[derive(Debug, Clone, Copy)]
struct StagedKeepout {
    addr: u64,
    width: u32,
}

/// A region whose placement is deferred until [`resolve`](Self::resolve).
#[derive(Debug, Clone)]
pub struct StagedRegion<P> {
    space: AddressSpace<Slot>,
    entries: Vec<StagedEntry<P>>,
    keepouts: Vec<StagedKeepout>,
    resolved: bool,
}

impl<P> StagedRegion<P> {
    /// Creates an empty region of `2^width` addresses.
    pub fn new(label: impl Into<String>, width: u32) -> Self {
        Self {
            space: AddressSpace::new(label, width),
            entries: Vec::new(),
            keepouts: Vec::new(),
            resolved: false,
        }
    }

    /// Region label.
    pub fn label(&self) -> &str {
        self.space.label()
    }

    /// Stages a single element; returns its entry index.
    pub fn stage(&mut self, width: u32, payload: P, addr: Option<u64>) -> usize {
        self.push(vec![payload], false, width, addr)
    }

    /// Stages a replica group; returns its entry index.
    pub fn stage_group(&mut self, width: u32, payloads: Vec<P>, addr: Option<u64>) -> usize {
        self.push(payloads, true, width, addr)
    }

    /// Stages a reserved range.
    pub fn stage_keepout(&mut self, addr: u64, width: u32) {
        self.keepouts.push(StagedKeepout { addr, width });
        self.resolved = false;
    }

    fn push(&mut self, payloads: Vec<P>, grouped: bool, width: u32, requested: Option<u64>) -> usize {
        self.entries.push(StagedEntry {
            payloads,
            grouped,
            requested,
            width,
            state: StageState::Unresolved,
            placement: None,
        });
        self.resolved = false;
        self.entries.len() - 1
    }

    /// Places every unresolved entry. Calling it again without staging
    /// anything new is a no-op.
    ///
    /// Staging after a resolve requires [`unstage`](Self::unstage) first;
    /// otherwise the new entries are placed around the existing ones.
    pub fn resolve(&mut self, resolver: &ReplicationResolver) -> Result<(), MapError> {
        if self.resolved {
            return Ok(());
        }
        let keepouts = std::mem::take(&mut self.keepouts);
        for keepout in &keepouts {
            if !self.space.keepouts().iter().any(|iv| iv.start == keepout.addr) {
                self.space.keepout(keepout.addr, keepout.width)?;
            }
        }
        self.keepouts = keepouts;
        for pinned_pass in [true, false] {
            for index in 0..self.entries.len() {
                let entry = &self.entries[index];
                if entry.state == StageState::Unresolved && entry.requested.is_some() == pinned_pass {
                    self.place(index, resolver)?;
                }
            }
        }
        self.resolved = true;
        Ok(())
    }

    fn place(&mut self, index: usize, resolver: &ReplicationResolver) -> Result<(), MapError> {
        let entry = &self.entries[index];
        let (width, requested) = (entry.width, entry.requested);
        let placement = if entry.grouped {
            let slots = (0..entry.payloads.len())
                .map(|replica| Slot { entry: index, replica })
                .collect();
            resolver.place(&mut self.space, width, slots, requested)?
        } else {
            let slot = Slot { entry: index, replica: 0 };
            let base = self.space.add(width, slot, requested)?;
            Placement::single(base, width)
        };
        let entry = &mut self.entries[index];
        entry.placement = Some(placement);
        entry.state = StageState::Resolved;
        Ok(())
    }

    /// Returns every entry to [`StageState::Unresolved`] and clears the space.
    pub fn unstage(&mut self) {
        self.space.clear();
        for entry in &mut self.entries {
            entry.state = StageState::Unresolved;
            entry.placement = None;
        }
        self.resolved = false;
    }

    /// Shrinks the underlying space to its minimal power-of-two width.
    pub fn shrink(&mut self) {
        self.space.shrink();
    }

    /// Whether the last [`resolve`](Self::resolve) is still current.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Whether no element has been staged.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|e| e.payloads.is_empty())
    }

    /// Current address width.
    pub fn width(&self) -> u32 {
        self.space.width()
    }

    /// Absolute base of local address zero.
    pub fn base(&self) -> u64 {
        self.space.base()
    }

    /// Records the absolute base.
    pub fn set_base(&mut self, base: u64) {
        self.space.set_base(base);
    }

    /// The underlying allocator.
    pub fn space(&self) -> &AddressSpace<Slot> {
        &self.space
    }

    /// Staged entries in staging order.
    pub fn entries(&self) -> &[StagedEntry<P>] {
        &self.entries
    }

    /// Resolved entries ordered by their first base.
    pub fn items(&self) -> Vec<ResolvedItem<'_, P>> {
        let mut items: Vec<_> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let placement = entry.placement.as_ref()?;
                (placement.count() > 0).then_some(ResolvedItem {
                    index,
                    placement,
                    payloads: &entry.payloads,
                    grouped: entry.grouped,
                })
            })
            .collect();
        items.sort_by_key(|item| item.placement.base());
        items
    }

    /// Every placed payload with its range, in address order.
    pub fn occupied(&self) -> impl Iterator<Item = (AddressRange, &P)> + '_ {
        self.space
            .entries()
            .map(|o| (o.range, &self.entries[o.payload.entry].payloads[o.payload.replica]))
    }

    /// The payload whose range contains `addr`.
    pub fn lookup(&self, addr: u64) -> Option<(AddressRange, &P)> {
        let o = self.space.lookup(addr)?;
        Some((o.range, &self.entries[o.payload.entry].payloads[o.payload.replica]))
    }

    /// Mutable payload placed exactly at `base`.
    pub fn payload_at_mut(&mut self, base: u64) -> Option<&mut P> {
        let slot = *self.space.get(base)?;
        Some(&mut self.entries[slot.entry].payloads[slot.replica])
    }
}
