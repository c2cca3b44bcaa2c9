//! ALU operation codes.
//!
//! Codes follow the classic teaching layout:
//! - `0` = ADD, `1` = SUB (arithmetic, affect C and V)
//! - `2` = AND, `3` = OR, `4` = XOR (binary logical)
//! - `5` = NOT (unary, only uses the accumulator)

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use crate::alu::AluError;

/// One of the six operations the ALU can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum Opcode {
    /// A + B
    #[default]
    Add = 0,
    /// A - B
    Sub = 1,
    /// A & B
    And = 2,
    /// A | B
    Or = 3,
    /// A ^ B
    Xor = 4,
    /// !A (B is ignored)
    Not = 5,
}

impl Opcode {
    /// All opcodes in code order.
    pub const ALL: [Opcode; 6] = [
        Opcode::Add,
        Opcode::Sub,
        Opcode::And,
        Opcode::Or,
        Opcode::Xor,
        Opcode::Not,
    ];

    /// Numeric opcode.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// ADD and SUB are the only operations that drive carry and overflow.
    #[inline]
    pub const fn is_arithmetic(self) -> bool {
        matches!(self, Opcode::Add | Opcode::Sub)
    }

    /// NOT reads only the accumulator.
    #[inline]
    pub const fn is_unary(self) -> bool {
        matches!(self, Opcode::Not)
    }

    /// Upper-case mnemonic, e.g. `"XOR"`.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Xor => "XOR",
            Opcode::Not => "NOT",
        }
    }

    /// Operator symbol used in expressions like `A + B`.
    pub const fn symbol(self) -> &'static str {
        match self {
            Opcode::Add => "+",
            Opcode::Sub => "-",
            Opcode::And => "&",
            Opcode::Or => "|",
            Opcode::Xor => "^",
            Opcode::Not => "~",
        }
    }

    /// Readable name for status lines and menus.
    pub const fn description(self) -> &'static str {
        match self {
            Opcode::Add => "ADD (addition)",
            Opcode::Sub => "SUB (subtraction)",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Xor => "XOR",
            Opcode::Not => "NOT",
        }
    }

    /// The next opcode in code order, wrapping from NOT back to ADD.
    pub fn next(self) -> Self {
        Self::ALL[(self.code() as usize + 1) % Self::ALL.len()]
    }

    /// The previous opcode in code order, wrapping from ADD to NOT.
    pub fn prev(self) -> Self {
        let len = Self::ALL.len();
        Self::ALL[(self.code() as usize + len - 1) % len]
    }
}

impl TryFrom<u8> for Opcode {
    type Error = AluError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or(AluError::InvalidOpcode(code))
    }
}

impl FromStr for Opcode {
    type Err = AluError;

    /// Accepts mnemonics in any case and the operator symbols.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if let Some(op) = Self::ALL.iter().find(|op| op.symbol() == token) {
            return Ok(*op);
        }
        match token.to_ascii_uppercase().as_str() {
            "ADD" => Ok(Opcode::Add),
            "SUB" => Ok(Opcode::Sub),
            "AND" => Ok(Opcode::And),
            "OR" => Ok(Opcode::Or),
            "XOR" => Ok(Opcode::Xor),
            "NOT" => Ok(Opcode::Not),
            _ => Err(AluError::UnknownMnemonic(token.to_string())),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
