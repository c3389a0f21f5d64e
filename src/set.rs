//! RHashSet: key-only façade over [`DualHash`].

use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;

use crate::dual_hash::{Cursor, DualHash, ResizeStats};
use crate::key::HashKey;

/// Set of keys with bounded per-operation resize cost.
pub struct RHashSet<K> {
    inner: DualHash<K, ()>,
}

/// Borrowing iterator over the keys of an [`RHashSet`].
pub struct Iter<'a, K> {
    inner: crate::iter::Iter<'a, K, ()>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}
impl<K> FusedIterator for Iter<'_, K> {}

impl<K> Clone for Iter<'_, K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K> RHashSet<K> {
    pub fn new() -> Self {
        Self {
            inner: DualHash::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Some key in the set; repeated calls without edits return the same key.
    pub fn peek(&self) -> Option<&K> {
        self.inner.peek()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            inner: self.inner.iter(),
        }
    }

    pub fn cursor(&mut self) -> Cursor {
        self.inner.cursor()
    }

    /// See [`DualHash::cursor_next`].
    #[track_caller]
    pub fn cursor_next(&mut self, cursor: Cursor) -> Option<&K> {
        self.inner.cursor_next(cursor)
    }

    #[track_caller]
    pub fn release_cursor(&mut self, cursor: Cursor) -> bool {
        self.inner.release_cursor(cursor)
    }

    pub fn order(&self) -> u8 {
        self.inner.order()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    pub fn max_probe_len(&self) -> usize {
        self.inner.max_probe_len()
    }

    pub fn stats(&self) -> ResizeStats {
        self.inner.stats()
    }
}

impl<K: HashKey> RHashSet<K> {
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: HashKey + ?Sized,
    {
        self.inner.contains(key)
    }

    /// Add a key. Returns the key it replaced when an equal key was already
    /// present.
    pub fn add(&mut self, key: K) -> Option<K> {
        self.inner.insert(key, ()).map(|(k, ())| k)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: HashKey + ?Sized,
    {
        self.inner.remove(key).map(|(k, ())| k)
    }
}

impl<K> Default for RHashSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for RHashSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: HashKey> Extend<K> for RHashSet<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for k in iter {
            self.add(k);
        }
    }
}

impl<K: HashKey> FromIterator<K> for RHashSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut s = Self::new();
        s.extend(iter);
        s
    }
}

impl<'a, K> IntoIterator for &'a RHashSet<K> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
