//! Always-on edit versioning.
//!
//! A hash bumps its [`EditVersion`] on every structural edit. Pooled cursors
//! capture an [`EditStamp`] when created and check it on every use; a
//! mismatch means entries may have moved under the cursor and is fatal.
//! Unlike a debug assertion, the check runs in release builds too.

/// Per-hash edit counter. Wraps on overflow; a cursor would need to sit idle
/// across exactly 2^64 edits to miss a change.
#[derive(Debug, Default, Clone)]
pub struct EditVersion {
    n_edit: u64,
}

/// Snapshot of an [`EditVersion`] taken by a cursor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EditStamp(u64);

impl EditVersion {
    pub const fn new() -> Self {
        Self { n_edit: 0 }
    }

    /// Record one structural edit.
    #[inline]
    pub fn bump(&mut self) {
        self.n_edit = self.n_edit.wrapping_add(1);
    }

    #[inline]
    pub fn stamp(&self) -> EditStamp {
        EditStamp(self.n_edit)
    }

    #[inline]
    pub fn is_current(&self, stamp: EditStamp) -> bool {
        self.n_edit == stamp.0
    }

    /// Panics if the hash was edited after `stamp` was taken.
    #[inline]
    #[track_caller]
    pub fn check(&self, stamp: EditStamp) {
        assert!(
            self.is_current(stamp),
            "stale cursor: hash was edited after the cursor was created"
        );
    }
}
