//! ALU8 Simulator - CLI Entry Point
//!
//! Commands:
//! - `alu8-sim exec <A> <B> <OP>` - Run one ALU operation and explain the flags
//! - `alu8-sim run` - Run the clock headless and print every tick
//! - `alu8-sim tui` - Interactive simulator
//! - `alu8-sim table <OP> <A>` - Sweep B for a fixed A
//! - `alu8-sim test` - Built-in self-test

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use clap::{Parser, Subcommand};
use alu8::logging::{self, LogTarget};
use alu8::register::{format_hex, format_nibbles};
use alu8::{
    explain, ClockDriver, ClockScheduler, Opcode, OpcodeSelector, Operation, Processor, Register,
    SignedView, SimConfig, TickReport,
};

#[derive(Parser)]
#[command(name = "alu8-sim")]
#[command(author = "Yigit")]
#[command(version = "0.1.0")]
#[command(about = "An 8-bit ALU and clock-driven accumulator processor simulator")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log filter directives (e.g. "debug" or "alu8=trace"); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one operation and explain the resulting flags
    Exec {
        /// Operand A (0-255)
        #[arg(value_parser = parse_register)]
        a: u8,
        /// Operand B (0-255, ignored by NOT)
        #[arg(value_parser = parse_register)]
        b: u8,
        /// Operation: ADD, SUB, AND, OR, XOR, NOT or + - & | ^ ~
        op: Opcode,
        /// Show the result as signed two's complement
        #[arg(short, long)]
        signed: bool,
        /// Print the output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the clock without a UI, printing each tick
    Run {
        /// Number of ticks before stopping (default: 8)
        #[arg(short, long, default_value = "8")]
        ticks: u64,
        /// Operation applied on every tick
        #[arg(long)]
        op: Option<Opcode>,
        /// Tick period in milliseconds
        #[arg(short, long)]
        interval_ms: Option<u64>,
        /// Seed for the random operand generator
        #[arg(long)]
        seed: Option<u64>,
        /// Print one JSON object per tick
        #[arg(long)]
        json: bool,
    },
    /// Launch the interactive terminal simulator
    Tui {
        /// Operation selected at start
        #[arg(long)]
        op: Option<Opcode>,
    },
    /// Print the result of OP for a sweep of B values
    Table {
        op: Opcode,
        #[arg(value_parser = parse_register)]
        a: u8,
    },
    /// Run the built-in self-test
    Test,
}

fn parse_register(text: &str) -> Result<u8, String> {
    Register::parse_input(text)
        .map(Register::value)
        .map_err(|e| e.to_string())
}

fn main() {
    let cli = Cli::parse();

    let interactive = matches!(cli.command, Some(Commands::Tui { .. }));
    let target = match (&cli.log_file, interactive) {
        (Some(path), _) => LogTarget::File(path),
        (None, true) => LogTarget::Off,
        (None, false) => LogTarget::Stderr,
    };
    if let Err(e) = logging::init(cli.log_level.as_deref(), target) {
        eprintln!("❌ Failed to open log file: {}", e);
        std::process::exit(1);
    }

    let config = load_config(cli.config.as_deref());

    match cli.command {
        Some(Commands::Exec { a, b, op, signed, json }) => {
            exec_once(a, b, op, signed, json);
        }
        Some(Commands::Run { ticks, op, interval_ms, seed, json }) => {
            let mut config = config;
            if let Some(op) = op {
                config.opcode = op;
            }
            if let Some(ms) = interval_ms {
                config.tick_interval_ms = ms;
            }
            if seed.is_some() {
                config.seed = seed;
            }
            if let Err(e) = config.validate() {
                eprintln!("❌ Invalid settings: {}", e);
                std::process::exit(1);
            }
            run_clock(&config, ticks, json);
        }
        Some(Commands::Tui { op }) => {
            let mut config = config;
            if let Some(op) = op {
                config.opcode = op;
            }
            launch_tui(&config);
        }
        Some(Commands::Table { op, a }) => {
            print_table(op, a);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("ALU8 Simulator v0.1.0");
            println!("An 8-bit ALU with Z/N/C/V flags and a clocked accumulator");
            println!();
            println!("Use --help for available commands");
            println!();
            demo_scenarios();
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> SimConfig {
    let loaded = match path {
        Some(path) => SimConfig::load(path),
        None => Ok(SimConfig::default()),
    };

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = config.apply_env() {
        eprintln!("❌ Invalid environment override: {}", e);
        std::process::exit(1);
    }
    config
}

fn expression(op: &Operation) -> String {
    if op.opcode.is_unary() {
        format!("{}{}", op.opcode.symbol(), op.a)
    } else {
        format!("{} {} {}", op.a, op.opcode.symbol(), op.b)
    }
}

fn exec_once(a: u8, b: u8, opcode: Opcode, signed: bool, json: bool) {
    let op = Operation { a, b, opcode };
    let out = op.run();
    let status = explain(&op, &out);

    if json {
        let doc = serde_json::json!({
            "operation": op,
            "output": out,
            "status": status,
        });
        match serde_json::to_string_pretty(&doc) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("❌ Failed to encode output: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let view = if signed { SignedView::Signed } else { SignedView::Unsigned };
    println!("━━━ {} ━━━", opcode.description());
    println!("{} = {}", expression(&op), view.render_decimal(out.result));
    println!("Hex:   {}", format_hex(out.result));
    println!("Bin:   {}", format_nibbles(out.result));
    println!("Flags: {}", out.flags);
    println!();
    for message in &status.messages {
        println!("  {}", message);
    }
}

fn run_clock(config: &SimConfig, ticks: u64, json: bool) {
    let processor = Arc::new(Mutex::new(Processor::from_config(config)));
    let selector = Arc::new(OpcodeSelector::new(config.opcode));
    let mut driver = ClockDriver::new(ClockScheduler::from_config(config), processor, selector);

    let (tx, rx) = mpsc::channel::<TickReport>();
    driver.on_pulse(Box::new(move |report| {
        // the receiver is gone once enough ticks were printed
        let _ = tx.send(*report);
    }));

    if !json {
        println!("⏱  Clock: {} every {} ms, {} ticks", config.opcode, config.tick_interval_ms, ticks);
        println!();
    }

    driver.start();
    let patience = config.tick_interval() * 4 + Duration::from_secs(1);
    for _ in 0..ticks {
        let report = match rx.recv_timeout(patience) {
            Ok(report) => report,
            Err(e) => {
                eprintln!("❌ Clock stalled: {}", e);
                driver.stop();
                std::process::exit(1);
            }
        };

        if json {
            match serde_json::to_string(&report) {
                Ok(line) => println!("{}", line),
                Err(e) => eprintln!("❌ Failed to encode tick: {}", e),
            }
        } else {
            let op = Operation {
                a: report.previous_accumulator,
                b: report.operand,
                opcode: report.opcode,
            };
            println!(
                "{:>4}: {:<11} = {:>3}  {}  {}",
                report.tick,
                expression(&op),
                report.output.result,
                report.output.flags,
                if report.pulse { "●" } else { "○" },
            );
        }
    }
    driver.stop();

    if !json {
        let (acc, operand) = driver.with_processor(|cpu| (cpu.accumulator(), cpu.operand()));
        println!();
        println!("━━━ Result ━━━");
        println!("Ticks: {}", driver.ticks().unwrap_or(ticks));
        println!("A (accumulator): {:>3}  {}", acc, format_nibbles(acc));
        println!("B (operand):     {:>3}  {}", operand, format_nibbles(operand));
    }
}

#[cfg(feature = "tui")]
fn launch_tui(config: &SimConfig) {
    if let Err(e) = alu8::run_simulator(config) {
        eprintln!("❌ Simulator error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn launch_tui(_config: &SimConfig) {
    eprintln!("❌ This build has no terminal UI (enable the `tui` feature)");
    std::process::exit(1);
}

fn print_table(opcode: Opcode, a: u8) {
    println!("━━━ {} with A = {} ━━━", opcode.description(), a);
    if opcode.is_unary() {
        println!("(B is ignored by NOT)");
    }
    println!();
    println!("  B    result  signed  bin        Z N C V");

    let sweep = (0..=255u8).step_by(17).chain([127, 128, 255]);
    let mut seen = [false; 256];
    for b in sweep {
        if std::mem::replace(&mut seen[b as usize], true) {
            continue;
        }
        let out = Operation { a, b, opcode }.run();
        let lights: Vec<&str> = out.flags.iter().map(|(_, on)| if on { "1" } else { "0" }).collect();
        println!(
            "{:>3}  {:>6}  {:>6}  {}  {}",
            b,
            out.result,
            SignedView::Signed.render_decimal(out.result),
            format_nibbles(out.result),
            lights.join(" "),
        );
    }
}

fn demo_scenarios() {
    println!("━━━ ALU Scenarios ━━━");
    println!();

    let scenarios = [
        ("ADD carry", 200, 100, Opcode::Add),
        ("SUB borrow", 5, 10, Opcode::Sub),
        ("AND to zero", 170, 85, Opcode::And),
        ("XOR all ones", 170, 85, Opcode::Xor),
        ("Signed overflow", 100, 50, Opcode::Add),
    ];

    for (name, a, b, opcode) in scenarios {
        let op = Operation { a, b, opcode };
        let out = op.run();
        println!("{}:", name);
        println!(
            "  {} = {} ({})  {}",
            expression(&op),
            out.result,
            SignedView::Signed.render_decimal(out.result),
            out.flags,
        );
        println!("  {}", explain(&op, &out).summary());
        println!();
    }

    println!("✓ ALU core working!");
}

fn run_self_test() {
    use alu8::alu::FlagSet;
    use alu8::{from_bits, to_bits, execute};

    println!("━━━ ALU8 Simulator Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;

    let mut report = |name: &str, ok: bool, detail: String| {
        if ok {
            println!("{}... ✓", name);
            passed += 1;
        } else {
            println!("{}... ✗ ({})", name, detail);
            failed += 1;
        }
    };

    let flags = |zero, negative, carry, overflow| FlagSet { zero, negative, carry, overflow };
    let scenarios = [
        ("ADD carry (200 + 100)", 200, 100, Opcode::Add, 44, flags(false, false, true, false)),
        ("SUB borrow (5 - 10)", 5, 10, Opcode::Sub, 251, flags(false, true, true, false)),
        ("AND to zero (170 & 85)", 170, 85, Opcode::And, 0, flags(true, false, false, false)),
        ("XOR all ones (170 ^ 85)", 170, 85, Opcode::Xor, 255, flags(false, true, false, false)),
        ("Signed overflow (100 + 50)", 100, 50, Opcode::Add, 150, flags(false, true, false, true)),
    ];
    for (name, a, b, opcode, result, expected) in scenarios {
        let out = execute(a, b, opcode);
        report(
            name,
            out.result == result && out.flags == expected,
            format!("got {} {}", out.result, out.flags),
        );
    }

    // Logic ops never raise C or V
    let mut ok = true;
    for a in (0..=255u8).step_by(5) {
        for opcode in [Opcode::And, Opcode::Or, Opcode::Xor, Opcode::Not] {
            let out = execute(a, a.rotate_left(3), opcode);
            ok &= !out.flags.carry && !out.flags.overflow;
        }
    }
    report("Logic ops clear carry and overflow", ok, "C or V raised".into());

    // Bit array round trip
    let ok = (0..=255u8).all(|v| from_bits(to_bits(v)) == v);
    report("Bit array round trip", ok, "mismatch".into());

    // Use result needs a prior execute
    let mut cpu = Processor::new(7, 9);
    let before = cpu.use_result_as_accumulator();
    cpu.execute(Opcode::Add);
    let after = cpu.use_result_as_accumulator();
    report(
        "Use result as accumulator",
        before.is_none() && after == Some(16) && cpu.accumulator() == 16 && cpu.operand() == 0,
        format!("A={} B={}", cpu.accumulator(), cpu.operand()),
    );

    // Clock lifecycle
    let mut clock = ClockScheduler::new(Duration::from_millis(1500), Some(1));
    let mut cpu = Processor::default();
    let first = clock.start(Duration::ZERO, Opcode::Add);
    let second = clock.start(Duration::ZERO, Opcode::Add);
    let early = clock.poll(Duration::from_millis(1499), &mut cpu, Opcode::Add).is_none();
    let due = clock.poll(Duration::from_millis(1500), &mut cpu, Opcode::Add).is_some();
    let stopped = clock.stop() && !clock.stop();
    let silent = clock.poll(Duration::from_secs(60), &mut cpu, Opcode::Add).is_none();
    report(
        "Clock start/poll/stop",
        first && !second && early && due && stopped && silent,
        format!("ticks={}", clock.ticks()),
    );

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}
