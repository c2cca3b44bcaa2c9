//! ALU status flags.

use std::fmt;
use serde::{Serialize, Deserialize};

/// Bit positions used by [`FlagSet::bits`].
pub const Z: u8 = 0x01;
pub const N: u8 = 0x02;
pub const C: u8 = 0x04;
pub const V: u8 = 0x08;

/// The four status flags produced by every ALU operation.
///
/// A fresh set is computed on each execute; flags are never carried over
/// from a previous operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FlagSet {
    /// Z: the result is exactly zero.
    pub zero: bool,
    /// N: bit 7 of the result is set.
    pub negative: bool,
    /// C: unsigned carry out of ADD, or borrow in SUB.
    pub carry: bool,
    /// V: two's-complement sign error in ADD or SUB.
    pub overflow: bool,
}

impl FlagSet {
    /// Derive Z and N from a result; C and V cleared.
    #[inline]
    pub const fn from_result(result: u8) -> Self {
        Self {
            zero: result == 0,
            negative: result & 0x80 != 0,
            carry: false,
            overflow: false,
        }
    }

    /// Pack into a nibble: Z=bit0, N=bit1, C=bit2, V=bit3.
    pub const fn bits(self) -> u8 {
        (self.zero as u8) * Z
            | (self.negative as u8) * N
            | (self.carry as u8) * C
            | (self.overflow as u8) * V
    }

    /// Unpack from [`FlagSet::bits`] layout. Upper bits are ignored.
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            zero: bits & Z != 0,
            negative: bits & N != 0,
            carry: bits & C != 0,
            overflow: bits & V != 0,
        }
    }

    /// True if C or V is raised.
    #[inline]
    pub const fn is_critical(self) -> bool {
        self.carry || self.overflow
    }

    /// Flags as `(letter, value)` pairs in Z, N, C, V order.
    pub fn iter(self) -> impl Iterator<Item = (char, bool)> {
        [
            ('Z', self.zero),
            ('N', self.negative),
            ('C', self.carry),
            ('V', self.overflow),
        ]
        .into_iter()
    }
}

impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (letter, value) in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", letter, value as u8)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_result() {
        assert_eq!(FlagSet::from_result(0), FlagSet { zero: true, ..Default::default() });
        assert_eq!(FlagSet::from_result(0x80), FlagSet { negative: true, ..Default::default() });
        assert_eq!(FlagSet::from_result(0x7F), FlagSet::default());
    }

    #[test]
    fn test_bits_roundtrip() {
        for bits in 0..16u8 {
            assert_eq!(FlagSet::from_bits(bits).bits(), bits);
        }
        assert_eq!(FlagSet::from_bits(0xF0), FlagSet::default());
    }

    #[test]
    fn test_display() {
        let flags = FlagSet { zero: false, negative: true, carry: true, overflow: false };
        assert_eq!(flags.to_string(), "Z=0 N=1 C=1 V=0");
    }
}
