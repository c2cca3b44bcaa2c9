use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use alu8::{
    execute, ClockDriver, ClockScheduler, Opcode, OpcodeSelector, Processor, RegisterId,
    SimConfig, TickReport,
};

const FAST: Duration = Duration::from_millis(5);
const PATIENCE: Duration = Duration::from_secs(5);

fn driver(acc: u8, opcode: Opcode, seed: u64) -> (ClockDriver, mpsc::Receiver<TickReport>) {
    let processor = Arc::new(Mutex::new(Processor::new(acc, 0)));
    let selector = Arc::new(OpcodeSelector::new(opcode));
    let mut driver = ClockDriver::new(ClockScheduler::new(FAST, Some(seed)), processor, selector);

    let (tx, rx) = mpsc::channel();
    assert!(driver.on_pulse(Box::new(move |report| {
        let _ = tx.send(*report);
    })));
    (driver, rx)
}

#[test]
fn driver_ticks_chain_through_accumulator() {
    let (mut driver, rx) = driver(1, Opcode::Add, 42);
    assert!(driver.start());

    let reports: Vec<TickReport> = (0..5).map(|_| rx.recv_timeout(PATIENCE).unwrap()).collect();
    driver.stop();

    let mut acc = 1;
    for (i, report) in reports.iter().enumerate() {
        assert_eq!(report.tick, i as u64 + 1);
        assert_eq!(report.previous_accumulator, acc);
        assert_eq!(report.output, execute(acc, report.operand, Opcode::Add));
        acc = report.output.result;
    }
}

#[test]
fn no_tick_after_stop_returns() {
    let (mut driver, rx) = driver(0, Opcode::Xor, 3);
    assert!(driver.start());
    rx.recv_timeout(PATIENCE).unwrap();
    assert!(driver.stop());

    let ticks = driver.ticks().unwrap();
    let snapshot = driver.with_processor(|cpu| (cpu.accumulator(), cpu.operand()));

    thread::sleep(FAST * 10);
    assert_eq!(driver.ticks(), Some(ticks));
    assert_eq!(driver.with_processor(|cpu| (cpu.accumulator(), cpu.operand())), snapshot);

    // whatever was sent before stop is all there is
    assert!(rx.try_iter().all(|report| report.tick <= ticks));
    assert!(!driver.stop());
}

#[test]
fn restart_continues_tick_count() {
    let (mut driver, rx) = driver(0, Opcode::Or, 9);
    driver.start();
    rx.recv_timeout(PATIENCE).unwrap();
    driver.stop();
    let first = driver.ticks().unwrap();
    rx.try_iter().count();

    assert!(driver.start());
    let report = rx.recv_timeout(PATIENCE).unwrap();
    driver.stop();
    assert_eq!(report.tick, first + 1);
}

#[test]
fn pulse_handler_only_replaced_while_stopped() {
    let (mut driver, _rx) = driver(0, Opcode::Add, 1);
    driver.start();
    assert!(!driver.on_pulse(Box::new(|_| {})));
    driver.stop();
    assert!(driver.on_pulse(Box::new(|_| {})));
}

#[test]
fn selection_change_applies_to_next_tick() {
    let (mut driver, rx) = driver(0, Opcode::Add, 5);
    let selector = driver.selector();
    driver.start();
    rx.recv_timeout(PATIENCE).unwrap();

    selector.set(Opcode::Not);
    // ticks already in flight may still carry ADD
    let report = loop {
        let report = rx.recv_timeout(PATIENCE).unwrap();
        if report.opcode == Opcode::Not {
            break report;
        }
    };
    driver.stop();
    assert_eq!(report.output.result, !report.previous_accumulator);
}

#[test]
fn manual_execute_never_interleaves_with_tick() {
    let (mut driver, rx) = driver(0, Opcode::Add, 11);
    let processor = driver.processor();
    driver.start();

    for _ in 0..50 {
        let mut cpu = processor.lock().unwrap();
        // registers are consistent with the last tick while we hold the lock
        if let Some(out) = cpu.last_output() {
            assert_eq!(cpu.accumulator(), out.result);
        }
        cpu.set_operand(0);
        let out = cpu.execute(Opcode::Add);
        assert_eq!(out.result, cpu.accumulator());
        drop(cpu);
        thread::sleep(Duration::from_millis(1));
    }
    driver.stop();
    assert!(rx.try_iter().count() > 0);
}

#[test]
fn observers_see_clock_writes() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);

    let mut cpu = Processor::new(0, 0);
    cpu.subscribe(Box::new(move |event| sink.lock().unwrap().push(*event)));

    let mut clock = ClockScheduler::new(FAST, Some(2));
    let mut report = clock.tick(&mut cpu, Opcode::Or);
    while report.operand == 0 {
        report = clock.tick(&mut cpu, Opcode::Or);
    }

    let events = events.lock().unwrap();
    assert!(events.iter().any(|e| e.register == RegisterId::Operand && e.new == report.operand));
    assert!(events.iter().any(|e| e.register == RegisterId::Accumulator && e.new == report.output.result));
    assert!(events.iter().all(|e| e.old != e.new));
}

#[test]
fn scheduler_from_config_uses_interval_and_seed() {
    let config = SimConfig::from_json(r#"{ "tick_interval_ms": 250, "seed": 99, "opcode": "SUB" }"#).unwrap();
    let mut a = ClockScheduler::from_config(&config);
    let mut b = ClockScheduler::from_config(&config);
    assert_eq!(a.interval(), Duration::from_millis(250));

    let mut cpu_a = Processor::from_config(&config);
    let mut cpu_b = Processor::from_config(&config);
    a.start(Duration::ZERO, config.opcode);
    let report = a.poll(Duration::from_millis(250), &mut cpu_a, config.opcode).unwrap();
    assert_eq!(report, b.tick(&mut cpu_b, config.opcode));
    assert_eq!(report.opcode, Opcode::Sub);
}

#[test]
fn slow_pulse_handler_keeps_cadence() {
    let interval = Duration::from_millis(50);
    let processor = Arc::new(Mutex::new(Processor::default()));
    let selector = Arc::new(OpcodeSelector::new(Opcode::Add));
    let mut driver = ClockDriver::new(ClockScheduler::new(interval, Some(4)), processor, selector);

    let (tx, rx) = mpsc::channel();
    driver.on_pulse(Box::new(move |_| {
        let _ = tx.send(Instant::now());
        thread::sleep(Duration::from_millis(40));
    }));
    driver.start();
    let stamps: Vec<Instant> = (0..6).map(|_| rx.recv_timeout(PATIENCE).unwrap()).collect();
    driver.stop();

    // five periods; waiting a full interval after each handler would take 450 ms
    let span = stamps[5] - stamps[0];
    assert!(span < Duration::from_millis(350), "span {:?}", span);
    assert!(span >= Duration::from_millis(200), "span {:?}", span);
}

#[test]
fn panicked_clock_thread_keeps_seed() {
    let seed = 21;
    let processor = Arc::new(Mutex::new(Processor::default()));
    let selector = Arc::new(OpcodeSelector::new(Opcode::Add));
    let mut driver = ClockDriver::new(ClockScheduler::new(FAST, Some(seed)), processor, selector);

    let (tx, rx) = mpsc::channel();
    driver.on_pulse(Box::new(move |_| {
        let _ = tx.send(());
        panic!("pulse handler failed");
    }));
    driver.start();
    rx.recv_timeout(PATIENCE).unwrap();
    assert!(driver.stop());
    assert!(!driver.is_running());
    assert_eq!(driver.ticks(), Some(0));

    // the processor lock survives the panic
    driver.with_processor(|cpu| cpu.set_operand(1));

    let (tx, rx) = mpsc::channel();
    assert!(driver.on_pulse(Box::new(move |report| {
        let _ = tx.send(*report);
    })));
    assert!(driver.start());
    let report = rx.recv_timeout(PATIENCE).unwrap();
    driver.stop();

    let expected = ClockScheduler::new(FAST, Some(seed)).tick(&mut Processor::default(), Opcode::Add);
    assert_eq!(report.tick, 1);
    assert_eq!(report.operand, expected.operand);
}
