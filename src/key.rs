//! Key hashing: djb2 hash codes over fixed-width or terminated keys.
//!
//! Every key type stored in a table implements [`HashKey`]. The hash code is
//! the classic djb2 polynomial (seed 5381, multiplier 33) computed over the
//! key's bytes: exactly `N` bytes for fixed-width keys, or the bytes before
//! the terminator for string keys. Borrowed forms (`str` for `String`, `[u8]`
//! for `Vec<u8>`) hash identically to their owned forms, so lookups through
//! `Borrow` find the same slots.

use core::num::NonZeroU16;
use std::ffi::{CStr, CString};

/// Seed of the djb2 hash.
pub const DJB2_SEED: u32 = 5381;

/// djb2 over a byte slice: `h = h * 33 + b` for each byte, wrapping.
#[inline]
pub fn djb2(bytes: &[u8]) -> u32 {
    bytes.iter().fold(DJB2_SEED, |h, &b| {
        (h << 5).wrapping_add(h).wrapping_add(u32::from(b))
    })
}

/// A key that can be stored in a [`Table`](crate::table::Table).
///
/// Implementations must keep `hash_code` consistent with `Eq`: equal keys
/// produce equal codes. Types related through `Borrow` must also agree.
pub trait HashKey: Eq {
    /// 32-bit hash code of this key.
    fn hash_code(&self) -> u32;
}

impl<T: HashKey + ?Sized> HashKey for &T {
    #[inline]
    fn hash_code(&self) -> u32 {
        (**self).hash_code()
    }
}

impl<T: HashKey + ?Sized> HashKey for Box<T> {
    #[inline]
    fn hash_code(&self) -> u32 {
        (**self).hash_code()
    }
}

macro_rules! fixed_width_key {
    ($($t:ty),* $(,)?) => {
        $(
            impl HashKey for $t {
                #[inline]
                fn hash_code(&self) -> u32 {
                    djb2(&self.to_le_bytes())
                }
            }
        )*
    };
}

fixed_width_key!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl HashKey for char {
    #[inline]
    fn hash_code(&self) -> u32 {
        u32::from(*self).hash_code()
    }
}

impl<const N: usize> HashKey for [u8; N] {
    #[inline]
    fn hash_code(&self) -> u32 {
        djb2(self)
    }
}

impl HashKey for [u8] {
    #[inline]
    fn hash_code(&self) -> u32 {
        djb2(self)
    }
}

impl HashKey for Vec<u8> {
    #[inline]
    fn hash_code(&self) -> u32 {
        djb2(self)
    }
}

impl HashKey for str {
    #[inline]
    fn hash_code(&self) -> u32 {
        djb2(self.as_bytes())
    }
}

impl HashKey for String {
    #[inline]
    fn hash_code(&self) -> u32 {
        djb2(self.as_bytes())
    }
}

impl HashKey for CStr {
    #[inline]
    fn hash_code(&self) -> u32 {
        djb2(self.to_bytes())
    }
}

impl HashKey for CString {
    #[inline]
    fn hash_code(&self) -> u32 {
        djb2(self.to_bytes())
    }
}

/// How an erased byte key is delimited.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum KeyWidth {
    /// Key ends at the first NUL byte (or the end of the slice).
    Terminated,
    /// Key is exactly this many bytes.
    Fixed(NonZeroU16),
}

/// Rejected erased key.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum KeyError {
    #[error("key is {actual} bytes but the key width is {expected}")]
    TooShort { expected: u16, actual: usize },
}

impl KeyWidth {
    /// `0` selects terminated keys, anything else a fixed width.
    pub const fn from_bytes(key_width: u16) -> Self {
        match NonZeroU16::new(key_width) {
            Some(w) => KeyWidth::Fixed(w),
            None => KeyWidth::Terminated,
        }
    }

    /// Width in bytes, `0` for terminated keys.
    pub const fn bytes(self) -> u16 {
        match self {
            KeyWidth::Terminated => 0,
            KeyWidth::Fixed(w) => w.get(),
        }
    }

    /// Trim `raw` down to the bytes that make up the key.
    pub fn normalize(self, raw: &[u8]) -> Result<&[u8], KeyError> {
        match self {
            KeyWidth::Terminated => {
                let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                Ok(&raw[..end])
            }
            KeyWidth::Fixed(w) => {
                let w = usize::from(w.get());
                raw.get(..w).ok_or(KeyError::TooShort {
                    expected: w as u16,
                    actual: raw.len(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn djb2_known_values() {
        assert_eq!(djb2(b""), 5381);
        assert_eq!(djb2(b"a"), 5381 * 33 + 97);
        assert_eq!(djb2(b"ab"), (5381 * 33 + 97) * 33 + 98);
    }

    #[test]
    fn djb2_wraps_instead_of_overflowing() {
        let long = vec![0xffu8; 64];
        let reference = long
            .iter()
            .fold(DJB2_SEED, |h, &b| h.wrapping_mul(33).wrapping_add(u32::from(b)));
        assert_eq!(djb2(&long), reference);
        assert_eq!(djb2(&long), 488_505_541);
    }

    /// Borrowed and owned forms must land on the same hash code.
    #[test]
    fn borrowed_forms_agree() {
        let s = String::from("module.function");
        assert_eq!(s.hash_code(), s.as_str().hash_code());
        assert_eq!(s.hash_code(), djb2(s.as_bytes()));

        let v = vec![1u8, 2, 3];
        assert_eq!(v.hash_code(), v.as_slice().hash_code());
        let b: Box<[u8]> = v.clone().into_boxed_slice();
        assert_eq!(b.hash_code(), v.hash_code());

        let c = CString::new("abc").unwrap();
        assert_eq!(c.hash_code(), c.as_c_str().hash_code());
        assert_eq!(c.hash_code(), "abc".hash_code());
    }

    #[test]
    fn integers_hash_their_little_endian_bytes() {
        assert_eq!(7u32.hash_code(), djb2(&[7, 0, 0, 0]));
        assert_eq!(7u32.hash_code(), [7u8, 0, 0, 0].hash_code());
        assert_ne!(7u32.hash_code(), 7u64.hash_code());
    }

    #[test]
    fn key_width_zero_is_terminated() {
        assert_eq!(KeyWidth::from_bytes(0), KeyWidth::Terminated);
        assert_eq!(KeyWidth::from_bytes(4).bytes(), 4);
        assert_eq!(KeyWidth::Terminated.bytes(), 0);
    }

    #[test]
    fn terminated_keys_stop_at_nul() {
        let w = KeyWidth::Terminated;
        assert_eq!(w.normalize(b"abc\0def").unwrap(), b"abc");
        assert_eq!(w.normalize(b"abc").unwrap(), b"abc");
        assert_eq!(w.normalize(b"\0").unwrap(), b"");
    }

    #[test]
    fn fixed_keys_take_exact_width() {
        let w = KeyWidth::from_bytes(4);
        assert_eq!(w.normalize(&[1, 2, 3, 4, 5]).unwrap(), &[1u8, 2, 3, 4][..]);
        assert_eq!(w.normalize(&[0, 0, 0, 0]).unwrap(), &[0u8; 4][..]);
        assert_eq!(
            w.normalize(&[1, 2]),
            Err(KeyError::TooShort {
                expected: 4,
                actual: 2
            })
        );
    }
}
