//! rhash: Robin Hood hash sets and maps with incremental resizing.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: average O(1) lookup/insert/remove with a bounded worst case per
//!   call. Robin Hood probing bounds probe length; incremental rehashing
//!   bounds resize pauses to one migrated entry per mutating call.
//! - Layers:
//!   - Table<K, V>: fixed-capacity open-addressing array of `2^order`
//!     slots with Robin Hood insertion and backward-shift deletion.
//!   - DualHash<K, V>: two tables, `lo` and `hi`. Inserts go to `hi`; while
//!     a resize is in progress `lo` drains into `hi` (or back) one entry at a
//!     time.
//!   - RHashSet<K> / RHashMap<K, V>: typed façades.
//!   - RawHash<V>: erased set-or-map over byte keys with a per-instance key
//!     width, for callers that pick the role at runtime.
//!
//! Constraints
//! - Single-threaded; no interior locking.
//! - Keys hash with djb2 through [`HashKey`]; each entry stores its 32-bit
//!   hash so probing and migration never call back into the key.
//! - Grow at 3/4 of `hi`'s capacity, shrink at 1/4; table orders run from
//!   [`MIN_ORDER`] to [`MAX_ORDER`].
//!
//! Iteration
//! - [`DualHash::iter`] borrows the hash, so the borrow checker rules out
//!   edits during iteration.
//! - Pooled [`Cursor`]s outlive borrows and are checked at runtime: every
//!   structural edit bumps an edit version, and a cursor used after one
//!   panics. The check is on in release builds too.
//! - A cursor is bound to the hash that created it; using it on another
//!   hash panics.
//!
//! Failure model
//! - Inserting into a full table, stale, released or foreign cursors are
//!   contract violations and panic.
//! - Malformed erased keys are reported as [`KeyError`].

pub mod dual_hash;
mod dual_hash_proptest;
pub mod edit;
pub mod iter;
pub mod key;
pub mod map;
pub mod pool;
pub mod raw;
pub mod set;
mod table;

// Public surface
pub use dual_hash::{Cursor, DualHash, ResizeStats};
pub use key::{djb2, HashKey, KeyError, KeyWidth};
pub use map::RHashMap;
pub use raw::RawHash;
pub use set::RHashSet;
pub use table::{MAX_ORDER, MIN_ORDER};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
