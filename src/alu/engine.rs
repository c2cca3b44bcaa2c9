//! ALU execution engine.
//!
//! `execute` is a pure function: identical inputs always produce identical
//! outputs, and nothing outside the returned [`AluOutput`] is touched.

use serde::{Serialize, Deserialize};
use thiserror::Error;
use crate::alu::{FlagSet, Opcode};

/// The `(result, flags)` pair returned by the ALU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AluOutput {
    /// 8-bit result, always masked.
    pub result: u8,
    /// Status flags derived from this result.
    pub flags: FlagSet,
}

/// The inputs of one ALU operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub a: u8,
    pub b: u8,
    pub opcode: Opcode,
}

impl Operation {
    /// Run this operation through the ALU.
    #[inline]
    pub fn run(&self) -> AluOutput {
        execute(self.a, self.b, self.opcode)
    }
}

/// Errors raised by the ALU front door.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AluError {
    #[error("invalid opcode: {0} (expected 0-5)")]
    InvalidOpcode(u8),

    #[error("unknown operation: {0:?} (expected ADD, SUB, AND, OR, XOR or NOT)")]
    UnknownMnemonic(String),
}

#[inline]
const fn sign(value: u8) -> bool {
    value & 0x80 != 0
}

/// Execute one ALU operation on two 8-bit operands.
///
/// For NOT the second operand is ignored. Carry and overflow are only ever
/// raised by ADD and SUB.
pub fn execute(a: u8, b: u8, opcode: Opcode) -> AluOutput {
    let (result, carry, overflow) = match opcode {
        Opcode::Add => {
            let raw = a as u16 + b as u16;
            let result = (raw & 0xFF) as u8;
            let overflow = sign(a) == sign(b) && sign(result) != sign(a);
            (result, raw > 0xFF, overflow)
        }
        Opcode::Sub => {
            // a + (!b + 1), truncated to 8 bits
            let result = a.wrapping_add((!b).wrapping_add(1));
            let overflow = sign(a) != sign(b) && sign(result) != sign(a);
            (result, a < b, overflow)
        }
        Opcode::And => (a & b, false, false),
        Opcode::Or => (a | b, false, false),
        Opcode::Xor => (a ^ b, false, false),
        Opcode::Not => (!a, false, false),
    };

    let mut flags = FlagSet::from_result(result);
    if opcode.is_arithmetic() {
        flags.carry = carry;
        flags.overflow = overflow;
    }

    AluOutput { result, flags }
}

/// Execute with a numeric opcode.
///
/// Unknown codes are rejected before anything is computed.
pub fn execute_raw(a: u8, b: u8, code: u8) -> Result<AluOutput, AluError> {
    let opcode = Opcode::try_from(code)?;
    Ok(execute(a, b, opcode))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(z: bool, n: bool, c: bool, v: bool) -> FlagSet {
        FlagSet { zero: z, negative: n, carry: c, overflow: v }
    }

    #[test]
    fn test_add_with_carry() {
        let out = execute(200, 100, Opcode::Add);
        assert_eq!(out.result, 44);
        assert_eq!(out.flags, flags(false, false, true, false));
    }

    #[test]
    fn test_sub_with_borrow() {
        let out = execute(5, 10, Opcode::Sub);
        assert_eq!(out.result, 251);
        assert_eq!(out.flags, flags(false, true, true, false));
    }

    #[test]
    fn test_and_to_zero() {
        let out = execute(170, 85, Opcode::And);
        assert_eq!(out.result, 0);
        assert_eq!(out.flags, flags(true, false, false, false));
    }

    #[test]
    fn test_xor_all_ones() {
        let out = execute(170, 85, Opcode::Xor);
        assert_eq!(out.result, 255);
        assert_eq!(out.flags, flags(false, true, false, false));
    }

    #[test]
    fn test_add_signed_overflow() {
        let out = execute(100, 50, Opcode::Add);
        assert_eq!(out.result, 150);
        assert_eq!(out.flags, flags(false, true, false, true));
    }

    #[test]
    fn test_add_negative_overflow() {
        // -128 + -1 = +127 in 8 bits
        let out = execute(0x80, 0xFF, Opcode::Add);
        assert_eq!(out.result, 0x7F);
        assert!(out.flags.carry);
        assert!(out.flags.overflow);
        assert!(!out.flags.negative);
    }

    #[test]
    fn test_sub_signed_overflow() {
        // 100 - (-50) = 150, which is negative as a byte
        let out = execute(100, 206, Opcode::Sub);
        assert_eq!(out.result, 150);
        assert!(out.flags.overflow);
        assert!(out.flags.carry);

        // -128 - 1 = +127
        let out = execute(0x80, 1, Opcode::Sub);
        assert_eq!(out.result, 0x7F);
        assert!(out.flags.overflow);
        assert!(!out.flags.carry);
    }

    #[test]
    fn test_sub_equal_is_zero() {
        let out = execute(42, 42, Opcode::Sub);
        assert_eq!(out.result, 0);
        assert_eq!(out.flags, flags(true, false, false, false));
    }

    #[test]
    fn test_not_ignores_b() {
        let a = execute(0b1010_1100, 0, Opcode::Not);
        let b = execute(0b1010_1100, 0xFF, Opcode::Not);
        assert_eq!(a, b);
        assert_eq!(a.result, 0b0101_0011);
        assert!(!a.flags.carry && !a.flags.overflow);
    }

    #[test]
    fn test_or() {
        let out = execute(0b1010_1100, 0b1111_0000, Opcode::Or);
        assert_eq!(out.result, 0b1111_1100);
        assert_eq!(out.flags, flags(false, true, false, false));
    }

    #[test]
    fn test_execute_raw() {
        assert_eq!(execute_raw(1, 2, 0).unwrap().result, 3);
        assert_eq!(execute_raw(1, 2, 6), Err(AluError::InvalidOpcode(6)));
    }

    #[test]
    fn test_operation_run() {
        let op = Operation { a: 200, b: 100, opcode: Opcode::Add };
        assert_eq!(op.run(), execute(200, 100, Opcode::Add));
    }
}
