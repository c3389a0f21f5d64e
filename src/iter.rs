//! Iteration over both halves of a [`DualHash`](crate::DualHash).
//!
//! [`Walk`] is the position state shared by the borrowing [`Iter`] and the
//! pooled cursors: it scans `lo` upward from its low-water cursor, then `hi`
//! upward from its own, one occupied slot at a time. Neither tracks edits
//! itself. `Iter` holds shared borrows of both tables, so the hash cannot be
//! mutated while it is alive; pooled cursors are checked against the edit
//! version by their owner.

use core::iter::FusedIterator;

use crate::table::Table;

/// Which of the two tables a slot index refers to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Half {
    Lo,
    Hi,
}

#[derive(Clone, Debug)]
pub(crate) struct Walk {
    /// Table being scanned; `None` once both are exhausted.
    half: Option<Half>,
    /// Next slot to examine in `half`.
    next: usize,
    /// Slot of the most recently yielded entry.
    current: Option<(Half, usize)>,
}

impl Walk {
    /// Position just before `lo`'s first live entry.
    pub(crate) fn start<K, V>(lo: &Table<K, V>) -> Self {
        Self {
            half: Some(Half::Lo),
            next: lo.low_water(),
            current: None,
        }
    }

    /// Step to the next occupied slot, crossing from `lo` to `hi` when `lo`
    /// runs out.
    pub(crate) fn advance<K, V>(
        &mut self,
        lo: &Table<K, V>,
        hi: &Table<K, V>,
    ) -> Option<(Half, usize)> {
        loop {
            let half = self.half?;
            let table = match half {
                Half::Lo => lo,
                Half::Hi => hi,
            };
            if let Some(slot) = table.next_occupied(self.next) {
                self.next = slot + 1;
                self.current = Some((half, slot));
                return self.current;
            }
            match half {
                Half::Lo => {
                    self.half = Some(Half::Hi);
                    self.next = hi.low_water();
                }
                Half::Hi => {
                    self.half = None;
                    self.current = None;
                }
            }
        }
    }

    /// Slot of the entry most recently returned by [`advance`](Self::advance).
    pub(crate) fn current(&self) -> Option<(Half, usize)> {
        self.current
    }
}

/// Borrowing iterator over `(&K, &V)` pairs, `lo` entries first.
pub struct Iter<'a, K, V> {
    lo: &'a Table<K, V>,
    hi: &'a Table<K, V>,
    walk: Walk,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(lo: &'a Table<K, V>, hi: &'a Table<K, V>) -> Self {
        Self {
            lo,
            hi,
            walk: Walk::start(lo),
            remaining: lo.len() + hi.len(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (half, slot) = self.walk.advance(self.lo, self.hi)?;
        let table = match half {
            Half::Lo => self.lo,
            Half::Hi => self.hi,
        };
        self.remaining -= 1;
        table.entry_at(slot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            lo: self.lo,
            hi: self.hi,
            walk: self.walk.clone(),
            remaining: self.remaining,
        }
    }
}
