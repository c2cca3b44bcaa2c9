//! The 8-bit arithmetic-logic unit.
//!
//! This module provides the pure computation core:
//! - [`Opcode`] - The six supported operations (ADD, SUB, AND, OR, XOR, NOT)
//! - [`FlagSet`] - The four status flags (Z, N, C, V)
//! - [`execute`] - `(result, flags) = execute(a, b, opcode)`
//! - [`explain`] - Human-readable explanation of the raised flags

mod opcode;
mod flags;
mod engine;
pub mod explain;

pub use opcode::Opcode;
pub use flags::FlagSet;
pub use engine::{execute, execute_raw, AluError, AluOutput, Operation};
pub use explain::{explain, Severity, StatusReport};
