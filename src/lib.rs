//! # ALU8 Simulator
//!
//! An 8-bit arithmetic-logic unit and a single-accumulator processor driven
//! by a periodic clock, for teaching how an ALU computes results and status
//! flags.
//!
//! The computation core is UI-free: front ends hand it two bytes and an
//! opcode and get back a result and a flag set to render.

pub mod alu;
pub mod register;
pub mod processor;
pub mod clock;
pub mod config;
pub mod logging;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use alu::{execute, execute_raw, explain, AluError, AluOutput, FlagSet, Opcode, Operation};
pub use register::{from_bits, to_bits, BitFieldSync, BitFieldView, InputError, Register, SignedView};
pub use processor::{Processor, RegisterEvent, RegisterId};
pub use clock::{ClockDriver, ClockScheduler, ClockState, OpcodeSelector, TickReport};
pub use config::{ConfigError, SimConfig};

#[cfg(feature = "tui")]
pub use tui::run_simulator;
