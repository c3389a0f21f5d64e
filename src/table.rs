//! Table: fixed-capacity open addressing with Robin Hood linear probing.
//!
//! Capacity is `2^order`. Each occupied slot stores the entry's 32-bit hash
//! code next to the key, so probe costs are computed from the stored code and
//! keys are never re-hashed after insertion.
//!
//! Invariants
//! - `len <= capacity`; `insert` into a full table panics.
//! - Along a run of occupied slots, the probe cost grows by at most one from
//!   one slot to the next. Lookups rely on this to stop early: once the probe
//!   distance exceeds the occupant's cost, the key cannot be further along.
//! - Deletion shifts the rest of the run backward (no tombstones).
//! - No occupied slot sits below the low-water `peek` cursor.

use core::borrow::Borrow;
use core::cell::Cell;
use core::fmt;

/// Smallest table order (64 slots).
pub const MIN_ORDER: u8 = 6;
/// Largest table order.
pub const MAX_ORDER: u8 = 31;

#[derive(Debug, Clone)]
pub(crate) struct Slot<K, V> {
    pub(crate) hash: u32,
    pub(crate) key: K,
    pub(crate) value: V,
}

/// Result of [`Table::insert`].
#[derive(Debug)]
pub(crate) enum Inserted<K, V> {
    /// The key was new; it now lives at this slot.
    New(usize),
    /// The key was present; its old entry was overwritten and is returned.
    Replaced(K, V),
}

pub(crate) struct Table<K, V> {
    slots: Box<[Option<Slot<K, V>>]>,
    order: u8,
    len: usize,
    peek: Cell<usize>,
}

fn empty_slots<K, V>(order: u8) -> Box<[Option<Slot<K, V>>]> {
    (0..1usize << order).map(|_| None).collect()
}

impl<K, V> Table<K, V> {
    pub(crate) fn new(order: u8) -> Self {
        assert!(
            (MIN_ORDER..=MAX_ORDER).contains(&order),
            "table order {order} out of range"
        );
        Self {
            slots: empty_slots(order),
            order,
            len: 0,
            peek: Cell::new(1usize << order),
        }
    }

    #[inline]
    pub(crate) fn order(&self) -> u8 {
        self.order
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn mask(&self) -> usize {
        self.capacity() - 1
    }

    /// Slot visited at probe distance `probe` for `hash`.
    #[inline]
    fn slot(&self, hash: u32, probe: usize) -> usize {
        (hash as usize).wrapping_add(probe) & self.mask()
    }

    /// Probe distance of an entry with `hash` sitting at `slot`, wrapping
    /// around the end of the table.
    #[inline]
    fn cost(&self, slot: usize, hash: u32) -> usize {
        slot.wrapping_sub(self.slot(hash, 0)) & self.mask()
    }

    /// Lower the low-water cursor if `slot` is below it.
    #[inline]
    fn note_write(&self, slot: usize) {
        if slot < self.peek.get() {
            self.peek.set(slot);
        }
    }

    /// Current low-water cursor.
    #[inline]
    pub(crate) fn low_water(&self) -> usize {
        self.peek.get()
    }

    #[inline]
    pub(crate) fn entry_at(&self, slot: usize) -> Option<(&K, &V)> {
        self.slots
            .get(slot)?
            .as_ref()
            .map(|e| (&e.key, &e.value))
    }

    #[inline]
    pub(crate) fn value_mut_at(&mut self, slot: usize) -> Option<&mut V> {
        self.slots.get_mut(slot)?.as_mut().map(|e| &mut e.value)
    }

    /// First occupied slot at or after `from`.
    pub(crate) fn next_occupied(&self, from: usize) -> Option<usize> {
        (from..self.capacity()).find(|&i| self.slots[i].is_some())
    }

    /// Some occupied slot, scanning upward from the low-water cursor and
    /// advancing it to the slot found. Repeated calls never rescan below it.
    pub(crate) fn peek_slot(&self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let found = self.next_occupied(self.peek.get())?;
        self.peek.set(found);
        Some(found)
    }

    /// Remove the entry at `slot`, shifting the rest of its run back one slot
    /// until an empty slot or an entry already in its ideal slot.
    ///
    /// # Panics
    /// Panics if `slot` is empty.
    pub(crate) fn take_at(&mut self, slot: usize) -> Slot<K, V> {
        let removed = self.slots[slot]
            .take()
            .expect("take_at called on an empty slot");
        self.len -= 1;
        self.note_write(slot);
        let mut hole = slot;
        for _ in 1..self.capacity() {
            let next = (hole + 1) & self.mask();
            match &self.slots[next] {
                Some(e) if self.cost(next, e.hash) > 0 => {}
                _ => break,
            }
            self.slots.swap(hole, next);
            self.note_write(hole);
            hole = next;
        }
        removed
    }

    /// Move the run starting at `from` one slot forward, up to the first empty
    /// slot, leaving `from` empty.
    fn shift_forward(&mut self, from: usize) {
        let mask = self.mask();
        let empty = (0..self.capacity())
            .map(|i| (from + i) & mask)
            .find(|&i| self.slots[i].is_none())
            .expect("table below capacity has an empty slot");
        let mut cur = empty;
        while cur != from {
            let prev = cur.wrapping_sub(1) & mask;
            self.slots.swap(prev, cur);
            self.note_write(cur);
            cur = prev;
        }
    }

    /// Drop every entry. Tables above the minimum order shrink back to it.
    pub(crate) fn clear(&mut self) {
        if self.order > MIN_ORDER {
            self.order = MIN_ORDER;
            self.slots = empty_slots(MIN_ORDER);
        } else {
            self.slots.iter_mut().for_each(|s| *s = None);
        }
        self.len = 0;
        self.peek.set(self.capacity());
    }

    /// Largest probe distance over all live entries.
    pub(crate) fn max_probe_len(&self) -> usize {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|e| self.cost(i, e.hash)))
            .max()
            .unwrap_or(0)
    }
}

impl<K: Eq, V> Table<K, V> {
    /// Slot holding `key`, if present.
    pub(crate) fn find<Q>(&self, key: &Q, hash: u32) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        if self.is_empty() {
            return None;
        }
        for probe in 0..self.capacity() {
            let slot = self.slot(hash, probe);
            let e = self.slots[slot].as_ref()?;
            if e.hash == hash && key == <K as Borrow<Q>>::borrow(&e.key) {
                return Some(slot);
            }
            if probe > self.cost(slot, e.hash) {
                return None;
            }
        }
        None
    }

    /// Insert or overwrite.
    ///
    /// # Panics
    /// Panics when the table is already at capacity; the caller's growth
    /// policy must never let that happen.
    pub(crate) fn insert(&mut self, key: K, value: V, hash: u32) -> Inserted<K, V> {
        assert!(
            self.len < self.capacity(),
            "insert into a full table (order {})",
            self.order
        );
        for probe in 0..self.capacity() {
            let slot = self.slot(hash, probe);
            let Some(occupant) = &self.slots[slot] else {
                self.slots[slot] = Some(Slot { hash, key, value });
                self.len += 1;
                self.note_write(slot);
                return Inserted::New(slot);
            };
            let occupant_cost = self.cost(slot, occupant.hash);
            if occupant.hash == hash && occupant.key == key {
                if let Some(e) = self.slots[slot].as_mut() {
                    let old = core::mem::replace(e, Slot { hash, key, value });
                    self.note_write(slot);
                    return Inserted::Replaced(old.key, old.value);
                }
            }
            if probe > occupant_cost {
                self.shift_forward(slot);
                self.slots[slot] = Some(Slot { hash, key, value });
                self.len += 1;
                self.note_write(slot);
                return Inserted::New(slot);
            }
        }
        unreachable!("probe sequence exhausted below capacity")
    }

    pub(crate) fn remove<Q>(&mut self, key: &Q, hash: u32) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let slot = self.find(key, hash)?;
        let e = self.take_at(slot);
        Some((e.key, e.value))
    }
}

#[cfg(test)]
impl<K: crate::key::HashKey, V> Table<K, V> {
    /// Panics unless every structural invariant holds.
    pub(crate) fn check_invariants(&self) {
        let occupied = self.slots.iter().filter(|s| s.is_some()).count();
        assert_eq!(occupied, self.len, "len matches occupied slots");
        if let Some(first) = self.next_occupied(0) {
            assert!(first >= self.peek.get(), "no entry below the low-water cursor");
        }
        for (i, s) in self.slots.iter().enumerate() {
            let Some(e) = s else { continue };
            assert_eq!(e.hash, e.key.hash_code(), "stored hash matches key");
            assert_eq!(self.find(&e.key, e.hash), Some(i), "entry reachable by lookup");
            let next = (i + 1) & self.mask();
            if let Some(n) = &self.slots[next] {
                assert!(
                    self.cost(next, n.hash) <= self.cost(i, e.hash) + 1,
                    "robin hood ordering broken at slot {next}"
                );
            }
        }
    }
}

impl<K, V> fmt::Debug for Table<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("order", &self.order)
            .field("len", &self.len)
            .field("peek", &self.peek.get())
            .finish_non_exhaustive()
    }
}
