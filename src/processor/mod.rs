//! Single-accumulator processor.
//!
//! The processor owns the two ALU input registers:
//! - A (accumulator): running value across chained operations
//! - B (operand, TMP): second input to binary operations
//!
//! Every write-back is a named transition ([`Processor::use_result_as_accumulator`],
//! [`Processor::clock_tick`]) so front ends never mutate registers as a side
//! effect of their own event handlers.

use serde::{Serialize, Deserialize};
use tracing::debug;
use crate::alu::{AluOutput, Opcode, Operation};
use crate::config::SimConfig;
use crate::register::Register;

/// Which register an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegisterId {
    Accumulator,
    Operand,
}

impl RegisterId {
    /// Short label: `"A"` or `"B"`.
    pub const fn label(self) -> &'static str {
        match self {
            RegisterId::Accumulator => "A",
            RegisterId::Operand => "B",
        }
    }
}

/// A register's value changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterEvent {
    pub register: RegisterId,
    pub old: u8,
    pub new: u8,
}

/// Callback notified of register changes.
pub type Observer = Box<dyn FnMut(&RegisterEvent) + Send>;

/// The accumulator processor.
pub struct Processor {
    acc: Register,
    operand: Register,
    initial: (Register, Register),
    last: Option<(Operation, AluOutput)>,
    observers: Vec<Observer>,
}

impl Processor {
    /// Create a processor with the given initial register values.
    pub fn new(acc: u8, operand: u8) -> Self {
        let initial = (Register::new(acc), Register::new(operand));
        Self {
            acc: initial.0,
            operand: initial.1,
            initial,
            last: None,
            observers: Vec::new(),
        }
    }

    /// Create a processor from configured initial values.
    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.initial_accumulator, config.initial_operand)
    }

    /// Current accumulator value.
    #[inline]
    pub fn accumulator(&self) -> u8 {
        self.acc.value()
    }

    /// Current operand value.
    #[inline]
    pub fn operand(&self) -> u8 {
        self.operand.value()
    }

    /// Result of the most recent operation, manual or clocked.
    pub fn last_output(&self) -> Option<AluOutput> {
        self.last.map(|(_, out)| out)
    }

    /// Inputs of the most recent operation.
    pub fn last_operation(&self) -> Option<Operation> {
        self.last.map(|(op, _)| op)
    }

    /// Register an observer. It is called once per actual value change of
    /// either register, whatever caused it.
    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    fn write(&mut self, id: RegisterId, value: Register) {
        let slot = match id {
            RegisterId::Accumulator => &mut self.acc,
            RegisterId::Operand => &mut self.operand,
        };
        let old = *slot;
        *slot = value;

        if old != value {
            let event = RegisterEvent { register: id, old: old.value(), new: value.value() };
            for observer in &mut self.observers {
                observer(&event);
            }
        }
    }

    /// Overwrite the accumulator.
    pub fn set_accumulator(&mut self, value: u8) {
        self.write(RegisterId::Accumulator, Register::new(value));
    }

    /// Overwrite the operand.
    pub fn set_operand(&mut self, value: u8) {
        self.write(RegisterId::Operand, Register::new(value));
    }

    /// Write a wider value into the accumulator, keeping the low 8 bits.
    pub fn write_accumulator(&mut self, value: u32) {
        self.write(RegisterId::Accumulator, Register::from_masked(value));
    }

    /// Write a wider value into the operand, keeping the low 8 bits.
    pub fn write_operand(&mut self, value: u32) {
        self.write(RegisterId::Operand, Register::from_masked(value));
    }

    /// Run the ALU on A and B without writing anything back.
    ///
    /// The result is remembered for [`Processor::use_result_as_accumulator`].
    pub fn execute(&mut self, opcode: Opcode) -> AluOutput {
        let op = Operation { a: self.accumulator(), b: self.operand(), opcode };
        let out = op.run();
        debug!(a = op.a, b = op.b, %opcode, result = out.result, flags = %out.flags, "execute");
        self.last = Some((op, out));
        out
    }

    /// Move the last result into A and clear B.
    ///
    /// Pre: at least one operation has run. Post: A = last result, B = 0.
    /// Returns the new accumulator, or `None` with no change if nothing has
    /// been executed yet.
    pub fn use_result_as_accumulator(&mut self) -> Option<u8> {
        let out = self.last_output()?;
        self.set_accumulator(out.result);
        self.write(RegisterId::Operand, Register::zero());
        debug!(acc = out.result, "result moved to accumulator");
        Some(out.result)
    }

    /// One clocked step: load `operand` into B, run the ALU and overwrite A
    /// with the result.
    ///
    /// Post: B = `operand`, A = `execute(old A, operand, opcode).result`.
    /// Returns the discarded accumulator value and the ALU output.
    pub fn clock_tick(&mut self, operand: u8, opcode: Opcode) -> (u8, AluOutput) {
        let previous = self.accumulator();
        self.set_operand(operand);
        let out = self.execute(opcode);
        self.set_accumulator(out.result);
        (previous, out)
    }

    /// Restore the initial register values and forget the last result.
    pub fn reset(&mut self) {
        let (acc, operand) = self.initial;
        self.write(RegisterId::Accumulator, acc);
        self.write(RegisterId::Operand, operand);
        self.last = None;
    }
}

impl Default for Processor {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("acc", &self.acc)
            .field("operand", &self.operand)
            .field("last", &self.last)
            .field("observers", &self.observers.len())
            .finish()
    }
}
