//! WebAssembly bindings for the ALU simulator.
//!
//! This module provides JavaScript-friendly wrappers around the core. The
//! page drives the clock by calling [`WasmSimulator::poll`] from a timer or
//! animation frame with `performance.now()`.

use std::time::Duration;
use wasm_bindgen::prelude::*;
use crate::alu::{self, explain, Opcode};
use crate::clock::ClockScheduler;
use crate::config::SimConfig;
use crate::processor::Processor;
use crate::register::{format_nibbles, Register, SignedView};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn millis(now_ms: f64) -> Duration {
    Duration::from_micros((now_ms.max(0.0) * 1000.0) as u64)
}

fn js_error(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

/// WebAssembly-friendly simulator wrapper.
#[wasm_bindgen]
pub struct WasmSimulator {
    processor: Processor,
    clock: ClockScheduler,
    opcode: Opcode,
}

#[wasm_bindgen]
impl WasmSimulator {
    /// Create a simulator with default configuration.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        let config = SimConfig {
            seed: Some((js_sys::Math::random() * u32::MAX as f64) as u64),
            ..SimConfig::default()
        };
        Self {
            processor: Processor::from_config(&config),
            clock: ClockScheduler::from_config(&config),
            opcode: config.opcode,
        }
    }

    /// Set A from user text. Rejects values outside 0-255.
    #[wasm_bindgen]
    pub fn set_accumulator(&mut self, text: &str) -> Result<u8, JsError> {
        let value = Register::parse_input(text).map_err(js_error)?.value();
        self.processor.set_accumulator(value);
        Ok(value)
    }

    /// Set B from user text. Rejects values outside 0-255.
    #[wasm_bindgen]
    pub fn set_operand(&mut self, text: &str) -> Result<u8, JsError> {
        let value = Register::parse_input(text).map_err(js_error)?.value();
        self.processor.set_operand(value);
        Ok(value)
    }

    /// Select the operation by mnemonic or symbol.
    #[wasm_bindgen]
    pub fn select(&mut self, opcode: &str) -> Result<(), JsError> {
        self.opcode = opcode.parse().map_err(js_error)?;
        Ok(())
    }

    /// Execute the selected operation. Returns `{result, flags, status}` as JSON.
    #[wasm_bindgen]
    pub fn execute(&mut self) -> Result<String, JsError> {
        let out = self.processor.execute(self.opcode);
        let op = self.processor.last_operation().ok_or_else(|| JsError::new("no operation"))?;
        let status = explain(&op, &out);
        serde_json::to_string(&serde_json::json!({
            "result": out.result,
            "flags": out.flags,
            "status": status.summary(),
            "severity": status.severity,
        }))
        .map_err(js_error)
    }

    /// Move the last result into A and clear B. Returns false if nothing ran yet.
    #[wasm_bindgen]
    pub fn use_result(&mut self) -> bool {
        self.processor.use_result_as_accumulator().is_some()
    }

    /// Start the clock.
    #[wasm_bindgen]
    pub fn start(&mut self, now_ms: f64) -> bool {
        self.clock.start(millis(now_ms), self.opcode)
    }

    /// Stop the clock.
    #[wasm_bindgen]
    pub fn stop(&mut self) -> bool {
        self.clock.stop()
    }

    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Fire a tick if due. Returns the tick report as JSON, or `None`.
    #[wasm_bindgen]
    pub fn poll(&mut self, now_ms: f64) -> Result<Option<String>, JsError> {
        match self.clock.poll(millis(now_ms), &mut self.processor, self.opcode) {
            Some(report) => serde_json::to_string(&report).map(Some).map_err(js_error),
            None => Ok(None),
        }
    }

    /// Current pulse indicator level.
    #[wasm_bindgen]
    pub fn pulse(&self) -> bool {
        self.clock.pulse()
    }

    #[wasm_bindgen]
    pub fn accumulator(&self) -> u8 {
        self.processor.accumulator()
    }

    #[wasm_bindgen]
    pub fn operand(&self) -> u8 {
        self.processor.operand()
    }

    /// Restore initial registers and stop the clock.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.clock.stop();
        self.processor.reset();
    }
}

impl Default for WasmSimulator {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot ALU call with a numeric opcode (0-5). Returns `{result, flags}` as JSON.
#[wasm_bindgen]
pub fn wasm_execute(a: u8, b: u8, code: u8) -> Result<String, JsError> {
    let out = alu::execute_raw(a, b, code).map_err(js_error)?;
    serde_json::to_string(&out).map_err(js_error)
}

/// Render a byte as decimal in the chosen view.
#[wasm_bindgen]
pub fn wasm_render_decimal(value: u8, signed: bool) -> String {
    let view = if signed { SignedView::Signed } else { SignedView::Unsigned };
    view.render_decimal(value)
}

/// Render a byte as nibble-grouped binary.
#[wasm_bindgen]
pub fn wasm_render_binary(value: u8) -> String {
    format_nibbles(value)
}
