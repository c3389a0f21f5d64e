//! RHashMap: key/value façade over [`DualHash`].

use core::borrow::Borrow;
use core::fmt;

use crate::dual_hash::{Cursor, DualHash, ResizeStats};
use crate::iter::Iter;
use crate::key::HashKey;

/// Map with bounded per-operation resize cost.
pub struct RHashMap<K, V> {
    inner: DualHash<K, V>,
}

impl<K, V> RHashMap<K, V> {
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

    /// Some key in the map; repeated calls without edits return the same key.
    pub fn peek(&self) -> Option<&K> {
        self.inner.peek()
    }

    pub fn peek_entry(&self) -> Option<(&K, &V)> {
        self.inner.peek_entry()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        self.inner.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.inner.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.inner.iter().map(|(_, v)| v)
    }

    pub fn cursor(&mut self) -> Cursor {
        self.inner.cursor()
    }

    /// See [`DualHash::cursor_next`].
    #[track_caller]
    pub fn cursor_next(&mut self, cursor: Cursor) -> Option<&K> {
        self.inner.cursor_next(cursor)
    }

    /// See [`DualHash::cursor_value`].
    #[track_caller]
    pub fn cursor_value(&self, cursor: Cursor) -> Option<&V> {
        self.inner.cursor_value(cursor)
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

impl<K: HashKey, V> RHashMap<K, V> {
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: HashKey + ?Sized,
    {
        self.inner.contains(key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: HashKey + ?Sized,
    {
        self.inner.get(key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: HashKey + ?Sized,
    {
        self.inner.get_mut(key)
    }

    /// Insert or overwrite. Returns the previous key and value when the key
    /// was already present.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        self.inner.insert(key, value)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: HashKey + ?Sized,
    {
        self.inner.remove(key)
    }
}

impl<K, V> Default for RHashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for RHashMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl<K: HashKey, V> Extend<(K, V)> for RHashMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.inner.extend(iter);
    }
}

impl<K: HashKey, V> FromIterator<(K, V)> for RHashMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: DualHash::from_iter(iter),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a RHashMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
