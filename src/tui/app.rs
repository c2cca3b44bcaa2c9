//! Simulator application state and logic.

use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};
use crate::alu::{explain, Opcode, Severity};
use crate::clock::{ClockScheduler, TickReport};
use crate::config::SimConfig;
use crate::processor::{Processor, RegisterEvent, RegisterId};
use crate::register::{to_bits, BitFieldSync, BitFieldView, SignedView};

/// Widgets of one input register: a number field and eight bit toggles.
#[derive(Debug, Clone, Default)]
pub struct RegisterPanel {
    pub text: String,
    pub bits: [bool; 8],
    /// Last rejected input, shown under the field.
    pub error: Option<String>,
}

impl RegisterPanel {
    fn with_value(value: u8) -> Self {
        Self {
            text: value.to_string(),
            bits: to_bits(value),
            error: None,
        }
    }
}

impl BitFieldView for RegisterPanel {
    fn show_bits(&mut self, bits: [bool; 8]) {
        self.bits = bits;
        self.error = None;
    }

    fn show_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.error = None;
    }
}

/// Which register receives typing and bit toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Accumulator,
    Operand,
}

impl Focus {
    /// The processor register this focus edits.
    pub fn register(self) -> RegisterId {
        match self {
            Focus::Accumulator => RegisterId::Accumulator,
            Focus::Operand => RegisterId::Operand,
        }
    }
}

/// Simulator application state.
pub struct SimulatorApp {
    /// The processor being driven.
    pub processor: Processor,
    /// Automatic execution clock.
    pub clock: ClockScheduler,
    /// Selected operation.
    pub opcode: Opcode,
    /// Decimal display mode for results.
    pub view: SignedView,
    /// Register under edit.
    pub focus: Focus,
    /// Selected bit (0 = LSB).
    pub bit_cursor: usize,
    /// Pending numeric input for the focused register.
    pub input: String,
    pub acc_sync: BitFieldSync,
    pub acc_panel: RegisterPanel,
    pub op_sync: BitFieldSync,
    pub op_panel: RegisterPanel,
    /// Status message to display.
    pub status: String,
    /// Colour class of the status message.
    pub severity: Severity,
    /// Most recent clock tick.
    pub last_tick: Option<TickReport>,
    /// Should we quit?
    pub should_quit: bool,
    events: Receiver<RegisterEvent>,
    epoch: Instant,
}

impl SimulatorApp {
    /// Create the simulator from configuration.
    pub fn new(config: &SimConfig) -> Self {
        let mut processor = Processor::from_config(config);
        let (tx, events) = mpsc::channel();
        processor.subscribe(Box::new(move |event| {
            // receiver lives as long as the app
            let _ = tx.send(*event);
        }));

        let acc = processor.accumulator();
        let operand = processor.operand();
        let view = if config.signed_view { SignedView::Signed } else { SignedView::Unsigned };

        Self {
            processor,
            clock: ClockScheduler::from_config(config),
            opcode: config.opcode,
            view,
            focus: Focus::Accumulator,
            bit_cursor: 7,
            input: String::new(),
            acc_sync: BitFieldSync::new(RegisterId::Accumulator.label(), acc),
            acc_panel: RegisterPanel::with_value(acc),
            op_sync: BitFieldSync::new(RegisterId::Operand.label(), operand),
            op_panel: RegisterPanel::with_value(operand),
            status: "Ready. Press 'x' to execute, 'c' to start the clock, 'q' to quit.".into(),
            severity: Severity::Normal,
            last_tick: None,
            should_quit: false,
            events,
            epoch: Instant::now(),
        }
    }

    /// Time since the app started, used as the clock's time base.
    pub fn elapsed(&self) -> Duration {
        self.epoch.elapsed()
    }

    /// Push register changes from the processor into the panels.
    pub fn sync_panels(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event.register {
                RegisterId::Accumulator => self.acc_sync.load(event.new, &mut self.acc_panel),
                RegisterId::Operand => self.op_sync.load(event.new, &mut self.op_panel),
            };
        }
    }

    /// Run the selected operation on A and B.
    pub fn execute(&mut self) {
        let out = self.processor.execute(self.opcode);
        if let Some(op) = self.processor.last_operation() {
            let report = explain(&op, &out);
            self.status = report.summary();
            self.severity = report.severity;
        }
    }

    /// Move the last result into A and clear B.
    pub fn use_result(&mut self) {
        match self.processor.use_result_as_accumulator() {
            Some(value) => {
                self.status = format!("Accumulator: result {} moved to A, B cleared", value);
                self.severity = Severity::Warning;
            }
            None => {
                self.status = "Nothing executed yet".into();
            }
        }
        self.sync_panels();
    }

    /// Start or stop the clock.
    pub fn toggle_clock(&mut self) {
        self.toggle_clock_at(self.elapsed());
    }

    pub fn toggle_clock_at(&mut self, now: Duration) {
        if self.clock.is_running() {
            self.clock.stop();
            self.status = format!("Clock stopped after {} ticks", self.clock.ticks());
        } else {
            self.clock.start(now, self.opcode);
            self.status = format!(
                "Clock running: {} every {} ms",
                self.opcode,
                self.clock.interval().as_millis()
            );
        }
        self.severity = Severity::Normal;
    }

    /// Advance the clock; call on every loop iteration.
    pub fn tick(&mut self) {
        self.tick_at(self.elapsed());
    }

    pub fn tick_at(&mut self, now: Duration) {
        if let Some(report) = self.clock.poll(now, &mut self.processor, self.opcode) {
            if let Some(op) = self.processor.last_operation() {
                let explained = explain(&op, &report.output);
                self.status = format!("Tick {}: {}", report.tick, explained.summary());
                self.severity = explained.severity;
            }
            self.last_tick = Some(report);
        }
        self.sync_panels();
    }

    pub fn select_opcode(&mut self, opcode: Opcode) {
        self.opcode = opcode;
        self.status = format!("Selected {}", opcode.description());
        self.severity = Severity::Normal;
    }

    pub fn toggle_view(&mut self) {
        self.view = self.view.toggle();
    }

    /// Switch the edited register, discarding pending input.
    pub fn switch_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Accumulator => Focus::Operand,
            Focus::Operand => Focus::Accumulator,
        };
        self.input.clear();
    }

    pub fn type_char(&mut self, c: char) {
        if c.is_ascii_digit() && self.input.len() < 4 {
            self.input.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    /// Send the pending input to the focused register.
    pub fn commit_input(&mut self) {
        let (sync, panel) = match self.focus {
            Focus::Accumulator => (&self.acc_sync, &mut self.acc_panel),
            Focus::Operand => (&self.op_sync, &mut self.op_panel),
        };

        match sync.text_changed(&self.input, panel) {
            Ok(Some(value)) => {
                panel.text = value.to_string();
                self.write_focused(value);
                self.input.clear();
            }
            Ok(None) => {}
            Err(e) => {
                panel.error = Some(e.to_string());
                self.status = format!("Register {}: {}", sync.name(), e);
                self.severity = Severity::Critical;
            }
        }
        self.sync_panels();
    }

    /// Move the bit cursor one place right (towards the LSB) or left.
    pub fn move_cursor(&mut self, towards_lsb: bool) {
        self.bit_cursor = if towards_lsb {
            self.bit_cursor.saturating_sub(1)
        } else {
            (self.bit_cursor + 1).min(7)
        };
    }

    /// Flip the selected bit of the focused register.
    pub fn toggle_bit(&mut self) {
        let (sync, panel) = match self.focus {
            Focus::Accumulator => (&self.acc_sync, &mut self.acc_panel),
            Focus::Operand => (&self.op_sync, &mut self.op_panel),
        };

        let mut bits = panel.bits;
        bits[self.bit_cursor] = !bits[self.bit_cursor];
        panel.bits = bits;
        if let Some(value) = sync.bits_changed(bits, panel) {
            self.write_focused(value);
        }
        self.sync_panels();
    }

    fn write_focused(&mut self, value: u8) {
        match self.focus.register() {
            RegisterId::Accumulator => self.processor.set_accumulator(value),
            RegisterId::Operand => self.processor.set_operand(value),
        }
    }

    /// Reset registers to their initial values and stop the clock.
    pub fn reset(&mut self) {
        self.clock.stop();
        self.processor.reset();
        self.last_tick = None;
        self.input.clear();
        self.status = "Reset. Ready.".into();
        self.severity = Severity::Normal;
        self.sync_panels();
    }
}

/// Run the interactive simulator.
pub fn run_simulator(config: &SimConfig) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = SimulatorApp::new(config);

    // Main loop
    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('x') => app.execute(),
                        KeyCode::Char('u') => app.use_result(),
                        KeyCode::Char('c') => app.toggle_clock(),
                        KeyCode::Char('s') => app.toggle_view(),
                        KeyCode::Char('r') => app.reset(),
                        KeyCode::Char(' ') => app.toggle_bit(),
                        KeyCode::Char(c) if c.is_ascii_digit() => app.type_char(c),
                        KeyCode::Char(c) => {
                            if let Ok(op) = c.to_string().parse::<Opcode>() {
                                app.select_opcode(op);
                            }
                        }
                        KeyCode::Backspace => app.backspace(),
                        KeyCode::Enter => app.commit_input(),
                        KeyCode::Tab => app.switch_focus(),
                        KeyCode::Left => app.move_cursor(false),
                        KeyCode::Right => app.move_cursor(true),
                        KeyCode::Up => app.select_opcode(app.opcode.prev()),
                        KeyCode::Down => app.select_opcode(app.opcode.next()),
                        _ => {}
                    }
                }
            }
        }

        // Tick for continuous running
        app.tick();

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> SimulatorApp {
        SimulatorApp::new(&SimConfig { seed: Some(3), ..SimConfig::default() })
    }

    #[test]
    fn test_commit_input_updates_bits_and_processor() {
        let mut app = app();
        for c in "170".chars() {
            app.type_char(c);
        }
        app.commit_input();
        assert_eq!(app.processor.accumulator(), 170);
        assert_eq!(app.acc_panel.bits, to_bits(170));
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_out_of_range_input_rejected() {
        let mut app = app();
        for c in "300".chars() {
            app.type_char(c);
        }
        app.commit_input();
        assert_eq!(app.processor.accumulator(), 0);
        assert!(app.acc_panel.error.is_some());
        assert_eq!(app.severity, Severity::Critical);
        assert!(app.status.starts_with("Register A:"));
    }

    #[test]
    fn test_toggle_bit_writes_operand() {
        let mut app = app();
        app.switch_focus();
        app.bit_cursor = 7;
        app.toggle_bit();
        assert_eq!(app.processor.operand(), 128);
        assert_eq!(app.op_panel.text, "128");
    }

    #[test]
    fn test_use_result_refreshes_panels() {
        let mut app = app();
        app.processor.set_accumulator(200);
        app.processor.set_operand(100);
        app.execute();
        app.use_result();
        assert_eq!(app.acc_panel.text, "44");
        assert_eq!(app.op_panel.text, "0");
        assert_eq!(app.op_panel.bits, [false; 8]);
    }

    #[test]
    fn test_clock_ticks_refresh_panels() {
        let mut app = app();
        app.toggle_clock_at(Duration::ZERO);
        app.tick_at(Duration::from_millis(1500));
        let report = app.last_tick.expect("tick fired");
        assert_eq!(app.acc_panel.text, report.output.result.to_string());
        assert_eq!(app.op_panel.bits, to_bits(report.operand));

        app.toggle_clock_at(Duration::from_millis(1600));
        assert!(!app.clock.is_running());
    }
}
