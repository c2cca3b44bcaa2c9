//! Plain-language explanations of ALU flags.
//!
//! Used by front ends to fill a status bar after each operation. Messages
//! are ordered by importance: V, C, N, Z.

use serde::{Serialize, Deserialize};
use crate::alu::{AluOutput, Opcode, Operation};

/// How alarming the flag combination is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// No flags raised.
    Normal,
    /// Only Z raised.
    Zero,
    /// N raised, no C or V.
    Warning,
    /// C or V raised.
    Critical,
}

/// Explanation of one operation's flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub messages: Vec<String>,
    pub severity: Severity,
}

impl StatusReport {
    /// The two most important messages joined into one status line.
    pub fn summary(&self) -> String {
        self.messages
            .iter()
            .take(2)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Explain why each flag of `out` was raised for `op`.
pub fn explain(op: &Operation, out: &AluOutput) -> StatusReport {
    let flags = out.flags;
    let mut messages = Vec::new();

    if flags.overflow {
        messages.push("OVERFLOW: signed result has the wrong sign".to_string());
    }

    if flags.carry {
        match op.opcode {
            Opcode::Add => messages.push(format!(
                "CARRY: {}+{}={} exceeded 8 bits (>255)",
                op.a,
                op.b,
                op.a as u16 + op.b as u16
            )),
            Opcode::Sub => messages.push(format!(
                "BORROW: {}-{} needed a borrow (result below zero)",
                op.a, op.b
            )),
            _ => {}
        }
    }

    if flags.negative {
        messages.push(format!(
            "NEGATIVE: bit 7 is set ({} is {} in two's complement)",
            out.result, out.result as i8
        ));
    }

    if flags.zero {
        messages.push("ZERO: the result is exactly zero".to_string());
    }

    if messages.is_empty() {
        messages.push(format!(
            "{} = {}, all flags clear",
            op.opcode.description(),
            out.result
        ));
    }

    let severity = if flags.is_critical() {
        Severity::Critical
    } else if flags.negative {
        Severity::Warning
    } else if flags.zero {
        Severity::Zero
    } else {
        Severity::Normal
    };

    StatusReport { messages, severity }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(a: u8, b: u8, opcode: Opcode) -> StatusReport {
        let op = Operation { a, b, opcode };
        explain(&op, &op.run())
    }

    #[test]
    fn test_carry_message() {
        let r = report(200, 100, Opcode::Add);
        assert_eq!(r.severity, Severity::Critical);
        assert_eq!(r.messages, vec!["CARRY: 200+100=300 exceeded 8 bits (>255)".to_string()]);
    }

    #[test]
    fn test_borrow_then_negative() {
        let r = report(5, 10, Opcode::Sub);
        assert_eq!(r.severity, Severity::Critical);
        assert!(r.messages[0].starts_with("BORROW"));
        assert!(r.messages[1].starts_with("NEGATIVE"));
        assert!(r.messages[1].contains("-5"));
    }

    #[test]
    fn test_overflow_comes_first() {
        let r = report(100, 50, Opcode::Add);
        assert!(r.messages[0].starts_with("OVERFLOW"));
        assert!(r.messages[1].starts_with("NEGATIVE"));
    }

    #[test]
    fn test_summary_keeps_two() {
        // -128 + -128: V, C and Z all raised
        let r = report(0x80, 0x80, Opcode::Add);
        assert_eq!(r.messages.len(), 3);
        assert_eq!(r.summary().matches(" | ").count(), 1);
    }

    #[test]
    fn test_zero_and_normal() {
        assert_eq!(report(170, 85, Opcode::And).severity, Severity::Zero);
        let r = report(1, 2, Opcode::Add);
        assert_eq!(r.severity, Severity::Normal);
        assert_eq!(r.summary(), "ADD (addition) = 3, all flags clear");
    }

    #[test]
    fn test_negative_is_warning() {
        assert_eq!(report(170, 85, Opcode::Xor).severity, Severity::Warning);
    }
}
