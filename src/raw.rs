//! RawHash: type-erased set-or-map over byte keys.
//!
//! The role (set or map) and the key width are fixed at construction. Keys
//! are byte slices normalised by [`KeyWidth`]: fixed-width keys keep exactly
//! `key_width` bytes, terminated keys stop at the first NUL. Map-only calls on
//! a set and set-only calls on a map are silent no-ops that report absence;
//! the typed [`RHashSet`](crate::RHashSet) and [`RHashMap`](crate::RHashMap)
//! rule that misuse out at compile time.

use core::fmt;

use crate::dual_hash::{Cursor, DualHash, ResizeStats};
use crate::key::{KeyError, KeyWidth};

/// Erased hash over byte keys. Set entries carry no value.
pub struct RawHash<V> {
    inner: DualHash<Box<[u8]>, Option<V>>,
    width: KeyWidth,
    is_map: bool,
}

impl<V> RawHash<V> {
    fn with_role(key_width: u16, is_map: bool) -> Self {
        Self {
            inner: DualHash::new(),
            width: KeyWidth::from_bytes(key_width),
            is_map,
        }
    }

    /// Key-only hash. `key_width == 0` selects NUL-terminated keys.
    pub fn create_set(key_width: u16) -> Self {
        Self::with_role(key_width, false)
    }

    /// Hash with one value per key. `key_width == 0` selects NUL-terminated
    /// keys.
    pub fn create_map(key_width: u16) -> Self {
        Self::with_role(key_width, true)
    }

    pub fn key_width(&self) -> KeyWidth {
        self.width
    }

    pub fn is_map(&self) -> bool {
        self.is_map
    }

    pub fn count(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn contains(&self, key: &[u8]) -> Result<bool, KeyError> {
        let key = self.width.normalize(key)?;
        Ok(self.inner.contains(key))
    }

    /// Value stored for `key`. Always `None` on a set.
    pub fn get(&self, key: &[u8]) -> Result<Option<&V>, KeyError> {
        let key = self.width.normalize(key)?;
        Ok(self.inner.get(key).and_then(Option::as_ref))
    }

    /// Some stored key, or `None` when empty.
    pub fn peek(&self) -> Option<&[u8]> {
        self.inner.peek().map(|k| &**k)
    }

    /// Add a key to a set. Returns the previously stored equal key. No-op on
    /// a map.
    pub fn add(&mut self, key: &[u8]) -> Result<Option<Box<[u8]>>, KeyError> {
        let key = self.width.normalize(key)?;
        if self.is_map {
            return Ok(None);
        }
        Ok(self.inner.insert(key.into(), None).map(|(k, _)| k))
    }

    /// Insert or overwrite a map entry. Returns the previous key and value.
    /// No-op on a set.
    pub fn put(&mut self, key: &[u8], value: V) -> Result<Option<(Box<[u8]>, V)>, KeyError> {
        let key = self.width.normalize(key)?;
        if !self.is_map {
            return Ok(None);
        }
        let prev = self.inner.insert(key.into(), Some(value));
        Ok(prev.and_then(|(k, v)| v.map(|v| (k, v))))
    }

    /// Remove a key, returning the stored copy. A map entry's value is dropped.
    pub fn remove(&mut self, key: &[u8]) -> Result<Option<Box<[u8]>>, KeyError> {
        let key = self.width.normalize(key)?;
        Ok(self.inner.remove(key).map(|(k, _)| k))
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Keys with their values (`None` on a set), `lo` table first.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], Option<&V>)> + '_ {
        self.inner.iter().map(|(k, v)| (&**k, v.as_ref()))
    }

    pub fn iterator_create(&mut self) -> Cursor {
        self.inner.cursor()
    }

    /// # Panics
    /// Panics on a destroyed cursor, a cursor from another hash, or after any
    /// structural edit.
    #[track_caller]
    pub fn iterator_next(&mut self, it: Cursor) -> Option<&[u8]> {
        self.inner.cursor_next(it).map(|k| &**k)
    }

    /// Value of the key last returned by [`iterator_next`](Self::iterator_next).
    /// Always `None` on a set.
    #[track_caller]
    pub fn iterator_value(&self, it: Cursor) -> Option<&V> {
        self.inner.cursor_value(it).and_then(Option::as_ref)
    }

    /// `false` if the cursor was already destroyed.
    ///
    /// # Panics
    /// Panics on a cursor created by another hash.
    #[track_caller]
    pub fn iterator_destroy(&mut self, it: Cursor) -> bool {
        self.inner.release_cursor(it)
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

impl<V> fmt::Debug for RawHash<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawHash")
            .field("role", &if self.is_map { "map" } else { "set" })
            .field("key_width", &self.width)
            .field("count", &self.count())
            .field("order", &self.order())
            .finish()
    }
}
