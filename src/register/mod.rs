//! 8-bit registers and their presentation helpers.
//!
//! - [`Register`] - An 8-bit unsigned register value
//! - [`bits`] - Number ↔ bit-array synchronization with reentrancy guards
//! - [`display`] - Signed/unsigned, hex and nibble rendering

pub mod bits;
pub mod display;

use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;

pub use bits::{from_bits, to_bits, BitFieldSync, BitFieldView};
pub use display::{format_hex, format_nibbles, SignedView};

/// An 8-bit hardware register.
///
/// Registers cannot be out of range: wide writes wrap to the low byte.
/// Text input goes through [`Register::parse_input`], which rejects values
/// outside 0-255 instead of wrapping.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Register(u8);

impl Register {
    /// Create a zeroed register.
    #[inline]
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Create from a byte.
    #[inline]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Create from a wider value, keeping only the low 8 bits.
    #[inline]
    pub const fn from_masked(value: u32) -> Self {
        Self((value & 0xFF) as u8)
    }

    /// Current value.
    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Value read as two's complement.
    #[inline]
    pub const fn signed(self) -> i8 {
        self.0 as i8
    }

    /// Bit `index` (0 = LSB).
    #[inline]
    pub const fn bit(self, index: usize) -> bool {
        (self.0 >> index) & 1 == 1
    }

    /// Parse user text as a register value.
    ///
    /// Accepts surrounding whitespace. Anything that is not an integer, or
    /// an integer outside 0-255, is rejected.
    pub fn parse_input(text: &str) -> Result<Self, InputError> {
        let trimmed = text.trim();
        let value: i64 = trimmed
            .parse()
            .map_err(|_| InputError::NotANumber(trimmed.to_string()))?;
        Self::checked(value)
    }

    /// Range-checked conversion from an integer.
    pub fn checked(value: i64) -> Result<Self, InputError> {
        u8::try_from(value)
            .map(Self)
            .map_err(|_| InputError::OutOfRange(value))
    }
}

impl From<u8> for Register {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<Register> for u8 {
    fn from(reg: Register) -> Self {
        reg.0
    }
}

impl fmt::Debug for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", format_nibbles(self.0), self.0)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rejected register input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("not a valid integer: {0:?}")]
    NotANumber(String),

    #[error("value {0} out of range (0-255)")]
    OutOfRange(i64),
}
