//! Threaded clock host.
//!
//! [`ClockDriver`] runs a [`ClockScheduler`] on its own timer thread. The
//! processor sits behind a mutex shared with manual callers, and every tick
//! holds that mutex for all four of its steps, so a manual execute can never
//! land in the middle of a tick.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, info};
use crate::alu::Opcode;
use crate::clock::{ClockScheduler, PulseHandler};
use crate::processor::Processor;

/// The currently selected operation, shared with the timer thread.
///
/// Read fresh on every tick.
#[derive(Debug)]
pub struct OpcodeSelector(AtomicU8);

impl OpcodeSelector {
    pub fn new(opcode: Opcode) -> Self {
        Self(AtomicU8::new(opcode.code()))
    }

    pub fn get(&self) -> Opcode {
        // only codes of valid opcodes are ever stored
        Opcode::try_from(self.0.load(Ordering::Acquire)).unwrap_or_default()
    }

    pub fn set(&self, opcode: Opcode) {
        self.0.store(opcode.code(), Ordering::Release);
    }
}

struct Worker {
    stop: Sender<()>,
    handle: JoinHandle<ClockScheduler>,
}

/// Lock the processor. A panic while holding the lock cannot leave the
/// registers invalid, so poisoning is ignored.
fn lock(processor: &Mutex<Processor>) -> MutexGuard<'_, Processor> {
    processor.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A clock that ticks on a background thread.
pub struct ClockDriver {
    processor: Arc<Mutex<Processor>>,
    selector: Arc<OpcodeSelector>,
    interval: Duration,
    seed: Option<u64>,
    idle: Option<ClockScheduler>,
    worker: Option<Worker>,
}

impl ClockDriver {
    /// Wrap a stopped scheduler.
    pub fn new(
        scheduler: ClockScheduler,
        processor: Arc<Mutex<Processor>>,
        selector: Arc<OpcodeSelector>,
    ) -> Self {
        Self {
            processor,
            selector,
            interval: scheduler.interval(),
            seed: scheduler.seed(),
            idle: Some(scheduler),
            worker: None,
        }
    }

    /// The shared processor.
    pub fn processor(&self) -> Arc<Mutex<Processor>> {
        Arc::clone(&self.processor)
    }

    /// The shared opcode selection.
    pub fn selector(&self) -> Arc<OpcodeSelector> {
        Arc::clone(&self.selector)
    }

    /// Run `f` with exclusive access to the processor. Ticks wait until it
    /// returns.
    pub fn with_processor<R>(&self, f: impl FnOnce(&mut Processor) -> R) -> R {
        f(&mut lock(&self.processor))
    }

    /// Install the pulse callback. Only possible while stopped; returns
    /// `false` when running.
    ///
    /// The callback runs on the timer thread with the processor locked, so
    /// it must not lock the processor or stop the driver itself.
    pub fn on_pulse(&mut self, handler: PulseHandler) -> bool {
        match self.idle.as_mut() {
            Some(scheduler) => {
                scheduler.on_pulse(handler);
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Start the timer thread. Returns `false` if already running.
    pub fn start(&mut self) -> bool {
        let Some(mut scheduler) = self.idle.take() else {
            return false;
        };

        let interval = scheduler.interval();
        let epoch = Instant::now();
        scheduler.start(Duration::ZERO, self.selector.get());

        let (stop, stop_rx) = mpsc::channel::<()>();
        let processor = Arc::clone(&self.processor);
        let selector = Arc::clone(&self.selector);

        let spawned = thread::Builder::new()
            .name("alu8-clock".into())
            .spawn(move || {
                loop {
                    // sleep until the next tick is due on the epoch's time base
                    let wait = scheduler.time_until_next(epoch.elapsed()).unwrap_or(interval);
                    match stop_rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {
                            let mut cpu = lock(&processor);
                            scheduler.poll(epoch.elapsed(), &mut cpu, selector.get());
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                scheduler.stop();
                scheduler
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(Worker { stop, handle });
                true
            }
            Err(e) => {
                // the closure (and the scheduler inside it) is gone
                error!("failed to spawn clock thread: {}; pulse handler and tick count lost", e);
                self.idle = Some(self.replacement());
                false
            }
        }
    }

    /// Stop the timer thread and wait for it to exit.
    ///
    /// A tick already in progress completes; once this returns no further
    /// tick fires. Returns `false` if already stopped.
    pub fn stop(&mut self) -> bool {
        let Some(worker) = self.worker.take() else {
            return false;
        };

        // a send error means the thread already exited
        let _ = worker.stop.send(());
        match worker.handle.join() {
            Ok(scheduler) => {
                info!(ticks = scheduler.ticks(), "clock driver stopped");
                self.idle = Some(scheduler);
            }
            Err(_) => {
                error!("clock thread panicked; pulse handler and tick count lost");
                self.idle = Some(self.replacement());
            }
        }
        true
    }

    /// A fresh stopped scheduler with the original interval and seed.
    fn replacement(&self) -> ClockScheduler {
        ClockScheduler::new(self.interval, self.seed)
    }

    /// Ticks fired so far. Only known while stopped.
    pub fn ticks(&self) -> Option<u64> {
        self.idle.as_ref().map(ClockScheduler::ticks)
    }
}

impl Drop for ClockDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
