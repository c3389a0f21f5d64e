//! Pool: fixed-size record allocator backed by generational slots.
//!
//! Records are all the same type, so every record has the same size.
//! Released slots are reused by later allocations; the generation in each
//! [`PoolKey`] keeps a stale key from resolving to the record that reused
//! its slot.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Generational key of one pooled record.
    pub struct PoolKey;
}

#[derive(Debug)]
pub struct Pool<T> {
    records: SlotMap<PoolKey, T>,
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Self {
            records: SlotMap::with_key(),
        }
    }

    /// Size in bytes of one record.
    pub const fn record_size(&self) -> usize {
        core::mem::size_of::<T>()
    }

    pub fn alloc(&mut self, record: T) -> PoolKey {
        self.records.insert(record)
    }

    pub fn get(&self, key: PoolKey) -> Option<&T> {
        self.records.get(key)
    }

    pub fn get_mut(&mut self, key: PoolKey) -> Option<&mut T> {
        self.records.get_mut(key)
    }

    /// Return a record to the pool. `None` if it was already released.
    pub fn release(&mut self, key: PoolKey) -> Option<T> {
        self.records.remove(key)
    }

    /// Release every record at once; all outstanding keys go stale.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_get_release() {
        let mut p: Pool<(u32, u32)> = Pool::new();
        assert_eq!(p.record_size(), 8);
        let a = p.alloc((1, 2));
        let b = p.alloc((3, 4));
        assert_eq!(p.len(), 2);
        assert_eq!(p.get(a), Some(&(1, 2)));
        p.get_mut(b).unwrap().0 = 30;
        assert_eq!(p.get(b), Some(&(30, 4)));

        assert_eq!(p.release(a), Some((1, 2)));
        assert_eq!(p.release(a), None, "double release is rejected");
        assert!(p.get(a).is_none());
        assert_eq!(p.len(), 1);
    }

    /// A released key must not alias the record that reuses its slot.
    #[test]
    fn stale_key_does_not_alias_reused_slot() {
        let mut p: Pool<u8> = Pool::new();
        let old = p.alloc(1);
        p.release(old);
        let new = p.alloc(2);
        assert_ne!(old, new);
        assert!(p.get(old).is_none());
        assert_eq!(p.get(new), Some(&2));
    }

    #[test]
    fn clear_releases_everything() {
        let mut p: Pool<u8> = Pool::new();
        let keys: Vec<_> = (0..10).map(|i| p.alloc(i)).collect();
        p.clear();
        assert!(p.is_empty());
        assert!(keys.iter().all(|&k| p.get(k).is_none()));
    }
}
