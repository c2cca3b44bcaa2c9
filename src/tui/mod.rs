//! Terminal front end for the ALU simulator.
//!
//! Provides an interactive terminal view with:
//! - Accumulator and operand registers as numbers and bit toggles
//! - Operation selection and manual execution
//! - Result in decimal (signed or unsigned), hex and binary
//! - Z/N/C/V flag lights and a status line explaining them
//! - Clock control with a per-tick pulse indicator

mod app;
mod ui;

pub use app::{Focus, RegisterPanel, SimulatorApp, run_simulator};
