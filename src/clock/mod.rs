//! Clock-driven automatic execution.
//!
//! While running, every tick loads a random operand into B, runs the
//! selected operation on A and B, and writes the result back into A.
//!
//! - [`ClockScheduler`] - The tick state machine, polled by the host loop
//! - [`ClockDriver`] - A timer thread hosting a scheduler

mod driver;

use std::time::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};
use crate::alu::{AluOutput, Opcode};
use crate::config::SimConfig;
use crate::processor::Processor;

pub use driver::{ClockDriver, OpcodeSelector};

/// Clock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    /// No ticks are scheduled.
    Stopped,
    /// Ticking. `next_due` is measured on the host's monotonic time base.
    Running {
        /// Operation selected when the clock was started.
        armed_opcode: Opcode,
        next_due: Duration,
    },
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Accumulator value overwritten by this tick.
    pub previous_accumulator: u8,
    /// Random operand loaded into B.
    pub operand: u8,
    pub opcode: Opcode,
    /// ALU output, now also in A.
    pub output: AluOutput,
    /// Indicator level after this tick (toggles every tick).
    pub pulse: bool,
}

/// Shortest accepted tick period. Shorter intervals, zero included, are
/// raised to this.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

fn clamp_interval(interval: Duration) -> Duration {
    if interval < MIN_INTERVAL {
        warn!(requested_us = interval.as_micros() as u64, "tick interval raised to 1 ms");
        MIN_INTERVAL
    } else {
        interval
    }
}

/// Called once per tick to flash an activity indicator.
pub type PulseHandler = Box<dyn FnMut(&TickReport) + Send>;

/// Repeating tick controller.
///
/// The scheduler owns no timer of its own: the host passes its current
/// monotonic time to [`ClockScheduler::poll`], which fires when a tick is
/// due. This fits single-threaded event loops (terminal UI, browser).
pub struct ClockScheduler {
    interval: Duration,
    state: ClockState,
    seed: Option<u64>,
    rng: StdRng,
    pulse: bool,
    ticks: u64,
    on_pulse: Option<PulseHandler>,
}

impl ClockScheduler {
    /// Create a stopped scheduler. A `seed` makes the operand sequence
    /// reproducible; without one the generator is seeded from the OS.
    pub fn new(interval: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            interval: clamp_interval(interval),
            state: ClockState::Stopped,
            seed,
            rng,
            pulse: false,
            ticks: 0,
            on_pulse: None,
        }
    }

    /// Create a stopped scheduler from configuration.
    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.tick_interval(), config.seed)
    }

    /// Tick period.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Change the tick period. Takes effect from the next scheduled tick.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = clamp_interval(interval);
    }

    /// Seed the operand generator was created with.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ClockState::Running { .. })
    }

    /// Number of ticks fired so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Current indicator level.
    pub fn pulse(&self) -> bool {
        self.pulse
    }

    /// Install the per-tick pulse callback, replacing any previous one.
    pub fn on_pulse(&mut self, handler: PulseHandler) {
        self.on_pulse = Some(handler);
    }

    /// Arm the clock. The first tick is due one interval after `now`.
    ///
    /// Returns `false` (and changes nothing) if already running.
    pub fn start(&mut self, now: Duration, opcode: Opcode) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = ClockState::Running {
            armed_opcode: opcode,
            next_due: now + self.interval,
        };
        info!(interval_ms = self.interval.as_millis() as u64, %opcode, "clock started");
        true
    }

    /// Disarm the clock. No tick fires from [`ClockScheduler::poll`] after
    /// this returns.
    ///
    /// Returns `false` if already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state = ClockState::Stopped;
        info!(ticks = self.ticks, "clock stopped");
        true
    }

    /// Time left until the next tick, or `None` when stopped.
    pub fn time_until_next(&self, now: Duration) -> Option<Duration> {
        match self.state {
            ClockState::Running { next_due, .. } => Some(next_due.saturating_sub(now)),
            ClockState::Stopped => None,
        }
    }

    /// Fire a tick if one is due at `now`.
    ///
    /// `opcode` is the operation currently selected by the user, so a
    /// selection change while running applies from the next tick. At most
    /// one tick fires per call. The next tick is due one interval after
    /// this one was due, so late polls do not shift the cadence; if a whole
    /// period was missed, it is due one interval after `now` instead.
    pub fn poll(&mut self, now: Duration, processor: &mut Processor, opcode: Opcode) -> Option<TickReport> {
        let ClockState::Running { armed_opcode, next_due } = self.state else {
            return None;
        };
        if now < next_due {
            return None;
        }

        let report = self.tick(processor, opcode);
        let mut next_due = next_due + self.interval;
        if next_due <= now {
            next_due = now + self.interval;
        }
        self.state = ClockState::Running { armed_opcode, next_due };
        Some(report)
    }

    /// Run one tick unconditionally.
    ///
    /// 1. draw a random byte into B
    /// 2. run the ALU on A and B
    /// 3. overwrite A with the result
    /// 4. toggle the pulse and notify the pulse callback
    pub fn tick(&mut self, processor: &mut Processor, opcode: Opcode) -> TickReport {
        let operand: u8 = self.rng.random();
        let (previous_accumulator, output) = processor.clock_tick(operand, opcode);

        self.ticks += 1;
        self.pulse = !self.pulse;

        let report = TickReport {
            tick: self.ticks,
            previous_accumulator,
            operand,
            opcode,
            output,
            pulse: self.pulse,
        };
        debug!(
            tick = report.tick,
            a = previous_accumulator,
            b = operand,
            %opcode,
            result = output.result,
            flags = %output.flags,
            "clock tick"
        );

        if let Some(handler) = self.on_pulse.as_mut() {
            handler(&report);
        }
        report
    }
}

impl std::fmt::Debug for ClockScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClockScheduler")
            .field("interval", &self.interval)
            .field("state", &self.state)
            .field("ticks", &self.ticks)
            .field("pulse", &self.pulse)
            .finish()
    }
}
