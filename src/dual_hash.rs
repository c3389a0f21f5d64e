//! DualHash: one logical key set/map over two Robin Hood tables.
//!
//! `hi` receives every insertion. During a resize the previous table lives on
//! as `lo` and drains into `hi` one entry per mutating call, so no single
//! insert or remove ever rehashes more than one extra entry. `lo` is always
//! half the capacity of `hi` (except at the minimum order, where both have
//! 64 slots and `lo` stays empty).
//!
//! Invariants
//! - No-shadow: a key lives in at most one of `lo`/`hi`.
//! - Growth runs only for genuinely new keys: move-higher first, then expand
//!   once `lo` is empty and `hi` reaches 3/4 capacity.
//! - Shrink runs only after a successful remove: move-lower first, then
//!   shrink once `hi` is empty and `lo` holds at most 1/4 of `hi`'s capacity.
//! - Every insert, successful remove and clear bumps the edit version;
//!   pooled cursors taken before the bump panic on their next use.

use core::borrow::Borrow;
use core::fmt;
use core::mem;
use core::sync::atomic::{AtomicU64, Ordering};

use log::{debug, trace};

use crate::edit::{EditStamp, EditVersion};
use crate::iter::{Half, Iter, Walk};
use crate::key::HashKey;
use crate::pool::{Pool, PoolKey};
use crate::table::{Inserted, Table, MAX_ORDER, MIN_ORDER};

/// Handle to a pooled cursor owned by a [`DualHash`].
///
/// Created by [`DualHash::cursor`]; valid until released, until the hash is
/// cleared, or until the next structural edit. A cursor is tied to the hash
/// that created it; passing it to another hash panics.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Cursor {
    key: PoolKey,
    owner: u64,
}

/// Source of per-hash owner ids stamped into cursors.
static NEXT_OWNER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
struct CursorRecord {
    walk: Walk,
    stamp: EditStamp,
}

/// Counters of the incremental resize machinery.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ResizeStats {
    /// Single entries moved between `lo` and `hi`.
    pub migrations: u64,
    /// Times `hi` was promoted to `lo` under a table of twice the capacity.
    pub expansions: u64,
    /// Times `lo` was demoted to `hi` over a table of half the capacity.
    pub shrinks: u64,
}

pub struct DualHash<K, V> {
    lo: Table<K, V>,
    hi: Table<K, V>,
    edits: EditVersion,
    cursors: Pool<CursorRecord>,
    stats: ResizeStats,
    owner: u64,
}

/// Grow threshold: 3/4 of capacity.
#[inline]
fn grow_limit<K, V>(t: &Table<K, V>) -> usize {
    let cap = t.capacity();
    cap - cap / 4
}

/// Shrink threshold: 1/4 of capacity, or 0 at the minimum order.
#[inline]
fn shrink_limit<K, V>(t: &Table<K, V>) -> usize {
    if t.order() > MIN_ORDER {
        t.capacity() / 4
    } else {
        0
    }
}

#[cold]
#[track_caller]
fn released_cursor() -> ! {
    panic!("cursor used after it was released")
}

#[track_caller]
fn check_owner(owner: u64, cursor: Cursor) {
    assert!(
        cursor.owner == owner,
        "cursor used on a hash other than the one that created it"
    );
}

#[track_caller]
fn live_record<'p>(
    pool: &'p mut Pool<CursorRecord>,
    edits: &EditVersion,
    owner: u64,
    cursor: Cursor,
) -> &'p mut CursorRecord {
    check_owner(owner, cursor);
    let Some(record) = pool.get_mut(cursor.key) else {
        released_cursor()
    };
    edits.check(record.stamp);
    record
}

impl<K, V> DualHash<K, V> {
    pub fn new() -> Self {
        Self {
            lo: Table::new(MIN_ORDER),
            hi: Table::new(MIN_ORDER),
            edits: EditVersion::new(),
            cursors: Pool::new(),
            stats: ResizeStats::default(),
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lo.len() + self.hi.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Order of `hi`, the table that receives insertions.
    pub fn order(&self) -> u8 {
        self.hi.order()
    }

    /// Total slots across both tables.
    pub fn capacity(&self) -> usize {
        self.lo.capacity() + self.hi.capacity()
    }

    pub fn lo_len(&self) -> usize {
        self.lo.len()
    }

    pub fn hi_len(&self) -> usize {
        self.hi.len()
    }

    /// Worst probe distance over all live entries.
    pub fn max_probe_len(&self) -> usize {
        self.lo.max_probe_len().max(self.hi.max_probe_len())
    }

    pub fn stats(&self) -> ResizeStats {
        self.stats
    }

    /// Number of cursors currently allocated from this hash's pool.
    pub fn live_cursors(&self) -> usize {
        self.cursors.len()
    }

    #[inline]
    fn table(&self, half: Half) -> &Table<K, V> {
        match half {
            Half::Lo => &self.lo,
            Half::Hi => &self.hi,
        }
    }

    /// Some live entry, taken from `lo` when it has any.
    pub fn peek_entry(&self) -> Option<(&K, &V)> {
        if let Some(slot) = self.lo.peek_slot() {
            return self.lo.entry_at(slot);
        }
        let slot = self.hi.peek_slot()?;
        self.hi.entry_at(slot)
    }

    /// Some live key, taken from `lo` when it has any.
    pub fn peek(&self) -> Option<&K> {
        self.peek_entry().map(|(k, _)| k)
    }

    /// Drop every entry and return both tables to the minimum order.
    /// Outstanding cursors are released.
    pub fn clear(&mut self) {
        let (len, order) = (self.len(), self.hi.order());
        self.lo.clear();
        self.hi.clear();
        self.cursors.clear();
        self.edits.bump();
        debug!("rhash clear: dropped {len} entries, order {order} -> {MIN_ORDER}");
    }

    /// Entries in scan order: `lo` first, then `hi`. The borrow keeps the
    /// hash from being edited while the iterator is alive.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.lo, &self.hi)
    }

    /// Allocate a pooled cursor positioned before the first entry.
    pub fn cursor(&mut self) -> Cursor {
        let record = CursorRecord {
            walk: Walk::start(&self.lo),
            stamp: self.edits.stamp(),
        };
        Cursor {
            key: self.cursors.alloc(record),
            owner: self.owner,
        }
    }

    /// Advance `cursor` and return the next key, or `None` at the end.
    ///
    /// # Panics
    /// Panics if the cursor belongs to another hash, was released, or the
    /// hash was edited since the cursor was created.
    #[track_caller]
    pub fn cursor_next(&mut self, cursor: Cursor) -> Option<&K> {
        let record = live_record(&mut self.cursors, &self.edits, self.owner, cursor);
        let (half, slot) = record.walk.advance(&self.lo, &self.hi)?;
        self.table(half).entry_at(slot).map(|(k, _)| k)
    }

    /// Value paired with the key most recently returned by
    /// [`cursor_next`](Self::cursor_next); `None` before the first call and
    /// after the end.
    ///
    /// # Panics
    /// Same conditions as [`cursor_next`](Self::cursor_next).
    #[track_caller]
    pub fn cursor_value(&self, cursor: Cursor) -> Option<&V> {
        check_owner(self.owner, cursor);
        let Some(record) = self.cursors.get(cursor.key) else {
            released_cursor()
        };
        self.edits.check(record.stamp);
        let (half, slot) = record.walk.current()?;
        self.table(half).entry_at(slot).map(|(_, v)| v)
    }

    /// Return a cursor to the pool. `false` if it was already released
    /// (including by [`clear`](Self::clear)).
    ///
    /// # Panics
    /// Panics if the cursor belongs to another hash.
    #[track_caller]
    pub fn release_cursor(&mut self, cursor: Cursor) -> bool {
        check_owner(self.owner, cursor);
        self.cursors.release(cursor.key).is_some()
    }
}

impl<K: HashKey, V> DualHash<K, V> {
    fn find<Q>(&self, key: &Q) -> Option<(Half, usize)>
    where
        K: Borrow<Q>,
        Q: HashKey + ?Sized,
    {
        let hash = key.hash_code();
        if let Some(slot) = self.lo.find(key, hash) {
            return Some((Half::Lo, slot));
        }
        self.hi.find(key, hash).map(|slot| (Half::Hi, slot))
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: HashKey + ?Sized,
    {
        self.find(key).is_some()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: HashKey + ?Sized,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: HashKey + ?Sized,
    {
        let (half, slot) = self.find(key)?;
        self.table(half).entry_at(slot)
    }

    /// Mutable access to a value. Not a structural edit: cursors stay valid.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: HashKey + ?Sized,
    {
        match self.find(key)? {
            (Half::Lo, slot) => self.lo.value_mut_at(slot),
            (Half::Hi, slot) => self.hi.value_mut_at(slot),
        }
    }

    /// Insert or overwrite. Returns the displaced entry when the key was
    /// already present.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        self.edits.bump();
        let hash = key.hash_code();
        let slot = match self.hi.insert(key, value, hash) {
            Inserted::Replaced(k, v) => return Some((k, v)),
            Inserted::New(slot) => slot,
        };
        // A key still waiting in `lo` is now shadowed by the new `hi` entry.
        let (key, _) = self
            .hi
            .entry_at(slot)
            .expect("freshly inserted slot must be occupied");
        let shadow = self.lo.remove(key, hash);
        if shadow.is_none() {
            self.grow();
        }
        shadow
    }

    /// Remove a key, returning its entry.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: HashKey + ?Sized,
    {
        let hash = key.hash_code();
        let removed = match self.lo.remove(key, hash) {
            Some(e) => e,
            None => self.hi.remove(key, hash)?,
        };
        self.edits.bump();
        self.shrink();
        Some(removed)
    }

    fn grow(&mut self) {
        if !self.lo.is_empty() && self.hi.len() + 2 * self.lo.len() >= grow_limit(&self.hi) {
            self.migrate(Half::Lo);
        }
        if self.lo.is_empty()
            && self.hi.len() >= grow_limit(&self.hi)
            && self.hi.order() < MAX_ORDER
        {
            let bigger = Table::new(self.hi.order() + 1);
            self.lo = mem::replace(&mut self.hi, bigger);
            self.stats.expansions += 1;
            debug!(
                "rhash expand: {} entries, order {} -> {}",
                self.lo.len(),
                self.lo.order(),
                self.hi.order()
            );
        }
    }

    fn shrink(&mut self) {
        let limit = shrink_limit(&self.hi);
        if !self.hi.is_empty() && limit > 0 {
            self.migrate(Half::Hi);
        }
        if self.hi.is_empty() && self.lo.len() <= limit && self.hi.order() > MIN_ORDER {
            let smaller = Table::new(self.lo.order().saturating_sub(1).max(MIN_ORDER));
            self.hi = mem::replace(&mut self.lo, smaller);
            self.stats.shrinks += 1;
            debug!(
                "rhash shrink: {} entries, order {} -> {}",
                self.hi.len(),
                self.hi.order() + 1,
                self.hi.order()
            );
        }
        if self.is_empty() && self.hi.order() > MIN_ORDER {
            let order = self.hi.order();
            self.lo = Table::new(MIN_ORDER);
            self.hi = Table::new(MIN_ORDER);
            debug!("rhash reset: empty, order {order} -> {MIN_ORDER}");
        }
    }

    /// Move one arbitrary entry out of `from` into the other table.
    fn migrate(&mut self, from: Half) {
        let (src, dst) = match from {
            Half::Lo => (&mut self.lo, &mut self.hi),
            Half::Hi => (&mut self.hi, &mut self.lo),
        };
        let Some(slot) = src.peek_slot() else {
            return;
        };
        let entry = src.take_at(slot);
        trace!(
            "rhash migrate {:?}: hash {:#010x} from order {} to order {}",
            from,
            entry.hash,
            src.order(),
            dst.order()
        );
        let placed = dst.insert(entry.key, entry.value, entry.hash);
        debug_assert!(matches!(placed, Inserted::New(_)), "migrated key shadowed");
        self.stats.migrations += 1;
    }
}

impl<K, V> Default for DualHash<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for DualHash<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: HashKey, V> Extend<(K, V)> for DualHash<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: HashKey, V> FromIterator<(K, V)> for DualHash<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut h = Self::new();
        h.extend(iter);
        h
    }
}

impl<'a, K, V> IntoIterator for &'a DualHash<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
impl<K: HashKey, V> DualHash<K, V> {
    /// Panics unless both tables and the cross-table invariants hold.
    pub(crate) fn check_invariants(&self) {
        self.lo.check_invariants();
        self.hi.check_invariants();
        let lo_keys = (0..self.lo.capacity()).filter_map(|i| self.lo.entry_at(i));
        for (k, _) in lo_keys {
            assert!(
                self.hi.find(k, k.hash_code()).is_none(),
                "key shadowed in both tables"
            );
        }
        assert_eq!(
            self.lo.order(),
            self.hi.order().saturating_sub(1).max(MIN_ORDER),
            "lo is half of hi"
        );
        assert!(self.hi.len() < self.hi.capacity(), "hi never fills");
        assert!(self.lo.len() < self.lo.capacity(), "lo never fills");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: fixed-width keys grow 64 -> 128 -> 256 with expansions at
    /// 48 and 96 keys, and migration drains `lo` before the next expansion.
    #[test]
    fn growth_follows_three_quarter_threshold() {
        let mut h: DualHash<u32, u32> = DualHash::new();
        for k in 0..47u32 {
            assert!(h.insert(k, k).is_none());
        }
        assert_eq!(h.order(), MIN_ORDER);
        h.insert(47, 47);
        assert_eq!(h.order(), 7);
        assert_eq!(h.lo_len(), 48);
        assert_eq!(h.stats().expansions, 1);

        for k in 48..100u32 {
            h.insert(k, k);
            h.check_invariants();
        }
        assert_eq!(h.len(), 100);
        assert_eq!(h.order(), 8);
        assert_eq!(h.stats().expansions, 2);
        assert!(h.stats().migrations >= 48);
        for k in 0..100u32 {
            assert_eq!(h.get(&k), Some(&k));
        }
    }

    /// Invariant: each mutating call migrates at most one entry.
    #[test]
    fn at_most_one_migration_per_call() {
        let mut h: DualHash<u32, ()> = DualHash::new();
        for k in 0..2000u32 {
            let before = h.stats().migrations;
            h.insert(k, ());
            assert!(h.stats().migrations - before <= 1);
        }
        for k in 0..2000u32 {
            let before = h.stats().migrations;
            assert!(h.remove(&k).is_some());
            assert!(h.stats().migrations - before <= 1);
            if k % 97 == 0 {
                h.check_invariants();
            }
        }
        assert!(h.is_empty());
        assert_eq!(h.order(), MIN_ORDER);
    }

    #[test]
    fn overwrite_returns_displaced_entry_without_growing() {
        let mut h: DualHash<String, u32> = DualHash::new();
        assert_eq!(h.insert("a".into(), 1), None);
        assert_eq!(h.insert("a".into(), 2), Some(("a".to_string(), 1)));
        assert_eq!(h.len(), 1);
        assert_eq!(h.get("a"), Some(&2));
        *h.get_mut("a").unwrap() += 40;
        assert_eq!(h.get("a"), Some(&42));
    }

    /// Invariant: re-inserting a key still waiting in `lo` evicts the old
    /// copy and reports it as displaced.
    #[test]
    fn reinsert_during_migration_evicts_shadow() {
        let mut h: DualHash<u32, &str> = DualHash::new();
        for k in 0..48u32 {
            h.insert(k, "old");
        }
        assert_eq!(h.lo_len(), 48);
        let in_lo = (0..48u32).find(|k| h.lo.find(k, k.hash_code()).is_some()).unwrap();
        let stats = h.stats();
        assert_eq!(h.insert(in_lo, "new"), Some((in_lo, "old")));
        assert_eq!(h.stats(), stats, "no growth bookkeeping on update");
        assert_eq!(h.get(&in_lo), Some(&"new"));
        assert_eq!(h.len(), 48);
        h.check_invariants();
    }

    #[test]
    fn shrink_runs_back_to_min_order() {
        let mut h: DualHash<u64, u64> = (0..1000u64).map(|k| (k, k * 2)).collect();
        let grown = h.order();
        assert!(grown >= 11);
        for k in 0..990u64 {
            assert_eq!(h.remove(&k), Some((k, k * 2)));
        }
        assert!(h.order() < grown);
        assert!(h.stats().shrinks > 0);
        h.check_invariants();
        for k in 990..1000u64 {
            assert_eq!(h.get(&k), Some(&(k * 2)));
        }
    }

    #[test]
    fn remove_of_absent_key_is_not_an_edit() {
        let mut h: DualHash<u32, ()> = DualHash::new();
        h.insert(1, ());
        let c = h.cursor();
        assert_eq!(h.remove(&2), None);
        assert_eq!(h.cursor_next(c), Some(&1));
    }

    #[test]
    fn peek_prefers_lo() {
        let mut h: DualHash<u32, ()> = DualHash::new();
        assert_eq!(h.peek(), None);
        for k in 0..48u32 {
            h.insert(k, ());
        }
        let p = *h.peek().unwrap();
        assert!(h.lo.find(&p, p.hash_code()).is_some());
        assert_eq!(h.peek(), Some(&p), "stable without edits");
    }

    #[test]
    fn cursor_walks_every_key_with_values() {
        let mut h: DualHash<u32, u32> = DualHash::new();
        for k in 0..60u32 {
            h.insert(k, k + 1000);
        }
        assert!(h.lo_len() > 0 && h.hi_len() > 0, "entries split across tables");
        let c = h.cursor();
        assert_eq!(h.cursor_value(c), None);
        let mut seen = Vec::new();
        while let Some(&k) = h.cursor_next(c) {
            assert_eq!(h.cursor_value(c), Some(&(k + 1000)));
            seen.push(k);
        }
        assert_eq!(h.cursor_value(c), None);
        assert_eq!(h.cursor_next(c), None);
        seen.sort_unstable();
        assert_eq!(seen, (0..60).collect::<Vec<_>>());
        assert!(h.release_cursor(c));
        assert!(!h.release_cursor(c));
        assert_eq!(h.live_cursors(), 0);
    }

    #[test]
    fn iter_matches_cursor_order() {
        let mut h: DualHash<u32, ()> = (0..70u32).map(|k| (k, ())).collect();
        let by_iter: Vec<u32> = h.iter().map(|(k, _)| *k).collect();
        let c = h.cursor();
        let mut by_cursor = Vec::new();
        while let Some(&k) = h.cursor_next(c) {
            by_cursor.push(k);
        }
        assert_eq!(by_iter, by_cursor);
        assert_eq!(h.iter().len(), 70);
    }

    #[test]
    fn get_mut_keeps_cursor_valid() {
        let mut h: DualHash<u32, u32> = DualHash::new();
        h.insert(5, 0);
        let c = h.cursor();
        *h.get_mut(&5).unwrap() = 9;
        assert_eq!(h.cursor_next(c), Some(&5));
        assert_eq!(h.cursor_value(c), Some(&9));
    }

    #[test]
    #[should_panic(expected = "stale cursor")]
    fn cursor_after_insert_panics() {
        let mut h: DualHash<u32, ()> = DualHash::new();
        h.insert(1, ());
        let c = h.cursor();
        h.cursor_next(c);
        h.insert(2, ());
        h.cursor_next(c);
    }

    #[test]
    #[should_panic(expected = "stale cursor")]
    fn cursor_after_overwrite_panics() {
        let mut h: DualHash<u32, u32> = DualHash::new();
        h.insert(1, 1);
        let c = h.cursor();
        h.insert(1, 2);
        h.cursor_value(c);
    }

    /// Invariant: two hashes hand out equal pool keys for their first
    /// cursors; the owner id still keeps one hash from accepting the other's.
    #[test]
    #[should_panic(expected = "other than the one that created it")]
    fn cursor_from_another_hash_panics() {
        let mut a: DualHash<u32, ()> = DualHash::new();
        let mut b: DualHash<u32, ()> = DualHash::new();
        a.insert(1, ());
        b.insert(1, ());
        b.insert(2, ());
        let ca = a.cursor();
        let cb = b.cursor();
        assert_eq!(ca.key, cb.key);
        assert_ne!(ca, cb);
        b.cursor_next(ca);
    }

    #[test]
    fn foreign_cursor_leaves_owner_cursor_untouched() {
        let mut a: DualHash<u32, ()> = DualHash::new();
        let mut b: DualHash<u32, ()> = DualHash::new();
        b.insert(1, ());
        b.insert(2, ());
        let ca = a.cursor();
        let cb = b.cursor();
        for res in [
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                b.cursor_next(ca);
            })),
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                b.cursor_value(ca);
            })),
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                b.release_cursor(ca);
            })),
        ] {
            assert!(res.is_err(), "expected foreign cursor to panic");
        }
        let mut seen = Vec::new();
        while let Some(&k) = b.cursor_next(cb) {
            seen.push(k);
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2]);
        assert!(a.release_cursor(ca));
        assert!(b.release_cursor(cb));
    }

    #[test]
    #[should_panic(expected = "released")]
    fn released_cursor_panics() {
        let mut h: DualHash<u32, ()> = DualHash::new();
        let c = h.cursor();
        h.release_cursor(c);
        h.cursor_next(c);
    }

    #[test]
    fn clear_resets_tables_and_cursors() {
        let mut h: DualHash<u32, ()> = (0..500u32).map(|k| (k, ())).collect();
        let c = h.cursor();
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.order(), MIN_ORDER);
        assert_eq!(h.capacity(), 128);
        assert_eq!(h.live_cursors(), 0);
        assert!(!h.release_cursor(c));
        h.insert(3, ());
        assert!(h.contains(&3));
    }

    #[test]
    fn debug_lists_entries() {
        let mut h: DualHash<u32, char> = DualHash::new();
        h.insert(1, 'x');
        assert_eq!(format!("{h:?}"), "{1: 'x'}");
    }
}
