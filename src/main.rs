//! Nibble Emulator - CLI Entry Point
//!
//! Commands:
//! - `nibble-emu run <program>` - Run a program file or ASM source
//! - `nibble-emu debug <program>` - Interactive debugger
//! - `nibble-emu exec <opcode> <operand1> <operand2>...` - Execute binary triples directly
//! - `nibble-emu asm <source>` - Assemble to a program file
//! - `nibble-emu disasm <program>` - Disassemble a program file
//! - `nibble-emu test` - Built-in self-test

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nibble::{Instruction, Machine, RunConfig, Runner, Snapshot};
use nibble::asm::disasm::{format_instruction, split_fields};

#[derive(Parser)]
#[command(name = "nibble-emu")]
#[command(version)]
#[command(about = "An emulator of a minimal 4-bit accumulator-style processor")]
struct Cli {
    /// Log engine activity to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until cancelled (Ctrl-C) or the cycle limit
    Run {
        /// Path to the program file or ASM source (.asm)
        program: PathBuf,
        /// JSON file with run settings
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Stop after this many cycles
        #[arg(short, long)]
        max_cycles: Option<u64>,
        /// Pause between cycles in milliseconds (default: 200)
        #[arg(short, long)]
        delay_ms: Option<u64>,
        /// Start from the current clock instead of 0
        #[arg(long)]
        no_rewind: bool,
        /// Print one line per cycle
        #[arg(short, long)]
        trace: bool,
        /// Redraw the full machine state every cycle
        #[arg(short, long)]
        watch: bool,
        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive debugger
    Debug {
        /// Path to the program file or ASM source (.asm)
        program: PathBuf,
        /// Pause between cycles while running, in milliseconds
        #[arg(short, long, default_value = "200")]
        delay_ms: u64,
    },
    /// Execute binary triples directly, bypassing program memory
    Exec {
        /// Groups of OPCODE (3-bit) INPUT1 (4-bit) INPUT2 (4-bit)
        #[arg(required = true, num_args = 3..)]
        fields: Vec<String>,
        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Assemble source to a program file
    Asm {
        /// Path to the source file
        source: PathBuf,
        /// Output program file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Disassemble a program file to readable text
    Disasm {
        /// Path to the program file
        program: PathBuf,
    },
    /// Run the built-in self-test
    Test,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Some(Commands::Run { program, config, max_cycles, delay_ms, no_rewind, trace, watch, json }) => {
            run_program(RunArgs { program, config, max_cycles, delay_ms, no_rewind, trace, watch, json })
        }
        Some(Commands::Debug { program, delay_ms }) => debug_program(&program, delay_ms),
        Some(Commands::Exec { fields, json }) => exec_triples(&fields, json),
        Some(Commands::Asm { source, output }) => assemble_file(&source, output),
        Some(Commands::Disasm { program }) => disassemble_file(&program),
        Some(Commands::Test) => run_self_test(),
        None => {
            println!("Nibble Emulator v{}", env!("CARGO_PKG_VERSION"));
            println!("A 4-bit accumulator-style processor");
            println!();
            println!("Use --help for available commands");
            println!();
            print_state(&Machine::new().snapshot());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("❌ {}", message);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load a program: assemble `.asm` sources, parse anything else as a
/// program file.
fn read_program(path: &PathBuf) -> Result<Vec<Instruction>, String> {
    let is_asm = path.extension().is_some_and(|ext| ext == "asm");
    let instructions = if is_asm {
        let source = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read file: {}", e))?;
        let instrs = nibble::assemble(&source)
            .map_err(|e| format!("Assembly error: {}", e))?;
        println!("📝 Assembled {} instructions", instrs.len());
        instrs
    } else {
        let program = nibble::load_program_file(path)
            .map_err(|e| format!("Failed to load program: {}", e))?;
        println!("📂 Loaded {} instructions", program.len());
        program.instructions
    };

    if instructions.is_empty() {
        return Err("No instructions to execute".into());
    }
    Ok(instructions)
}

struct RunArgs {
    program: PathBuf,
    config: Option<PathBuf>,
    max_cycles: Option<u64>,
    delay_ms: Option<u64>,
    no_rewind: bool,
    trace: bool,
    watch: bool,
    json: bool,
}

fn run_program(args: RunArgs) -> Result<(), String> {
    println!("🔧 Running: {}", args.program.display());

    let mut config = match &args.config {
        Some(path) => RunConfig::from_json_file(path)
            .map_err(|e| format!("Failed to load config: {}", e))?,
        None => RunConfig::default(),
    };
    if args.max_cycles.is_some() {
        config.max_cycles = args.max_cycles;
    }
    if let Some(delay) = args.delay_ms {
        config.cycle_delay_ms = delay;
    }
    if args.no_rewind {
        config.rewind = false;
    }

    let instructions = read_program(&args.program)?;
    let mut machine = Machine::new();
    machine.load(&instructions).map_err(|e| format!("Failed to load program: {}", e))?;

    println!();
    println!("━━━ Execution ━━━");

    let runner = Runner::new(config);
    let summary = runner.run_with(&mut machine, |cycle, m| {
        if args.watch {
            // clear screen, cursor home
            print!("\x1b[2J\x1b[H");
            println!("Total cycles: {}", m.cycles());
            print_state(&m.snapshot());
        } else if args.trace {
            let fault = cycle.fault.as_ref().map(|e| format!("  ⚠ {}", e)).unwrap_or_default();
            println!(
                "{:02}: {:<20} R0={} CLK={}{}",
                cycle.address,
                format_instruction(&cycle.instruction),
                m.registers().values()[0],
                m.clock().value(),
                fault
            );
        }
        ControlFlow::Continue(())
    });

    println!();
    println!("━━━ Result ━━━");
    println!("Cycles: {} ({} faulted), stopped: {:?}", summary.cycles, summary.faults, summary.reason);
    let snapshot = machine.snapshot();
    if args.json {
        print_json(&snapshot)?;
    } else {
        print_state(&snapshot);
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn debug_program(path: &PathBuf, delay_ms: u64) -> Result<(), String> {
    println!("🔍 Loading: {}", path.display());
    let instructions = read_program(path)?;

    println!("🚀 Launching debugger...");
    nibble::run_debugger(instructions, std::time::Duration::from_millis(delay_ms))
        .map_err(|e| format!("Debugger error: {}", e))
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &PathBuf, _delay_ms: u64) -> Result<(), String> {
    Err("the debugger requires the `tui` feature".into())
}

fn exec_triples(fields: &[String], json: bool) -> Result<(), String> {
    if fields.len() % 3 != 0 {
        return Err("Invalid input. Format: OPCODE (3-bit) INPUT1 (4-bit) INPUT2 (4-bit)".into());
    }

    let mut machine = Machine::new();
    for chunk in fields.chunks(3) {
        let text = chunk.join(" ");
        let instr = nibble::parse_triple(&text).map_err(|e| format!("{}: {}", text, e))?;
        let cycle = machine.step_direct(instr);
        match &cycle.fault {
            Some(e) => println!("{}  {:<20} ⚠ {}", text, format_instruction(&instr), e),
            None if cycle.jumped => println!("{}  {:<20} → CLK={}", text, format_instruction(&instr), machine.clock().value()),
            None => println!("{}  {}", text, format_instruction(&instr)),
        }
    }

    println!();
    if json {
        print_json(&machine.snapshot())
    } else {
        print_state(&machine.snapshot());
        Ok(())
    }
}

fn assemble_file(source_path: &PathBuf, output: Option<PathBuf>) -> Result<(), String> {
    let out_path = output.unwrap_or_else(|| source_path.with_extension("nib"));
    println!("📝 Assembling: {} → {}", source_path.display(), out_path.display());

    let source = std::fs::read_to_string(source_path)
        .map_err(|e| format!("Failed to read file: {}", e))?;
    let instructions = nibble::assemble(&source)
        .map_err(|e| format!("Assembly error: {}", e))?;
    println!("✓ Assembled {} instructions", instructions.len());

    let program = nibble::ProgramFile::from_instructions(&instructions);
    nibble::save_program_file(&out_path, &program)
        .map_err(|e| format!("Failed to save program: {}", e))?;
    println!("✓ Saved to {}", out_path.display());
    Ok(())
}

fn disassemble_file(path: &PathBuf) -> Result<(), String> {
    println!("📖 Disassembling: {}", path.display());
    println!();

    let program = nibble::load_program_file(path)
        .map_err(|e| format!("Failed to load program: {}", e))?;
    let words: Vec<_> = program.instructions.iter().map(nibble::cpu::decode::encode).collect();
    println!("{}", nibble::disassemble(&words));
    Ok(())
}

/// Render the machine as the register / program table.
fn print_state(snapshot: &Snapshot) {
    println!("--------Registers---------Program------------------------");
    for (i, word) in snapshot.program.iter().enumerate() {
        let reg = match snapshot.registers.get(i) {
            Some(value) => format!("R{:<3} {}", i, value),
            None => format!("CLK  {}", snapshot.clock),
        };
        println!("| {} | P{:<2} {} |", reg, i, split_fields(word));
    }
    println!("---------------------------------------------------------");
    if let Some(last) = snapshot.last_instruction {
        println!("Last: {}", format_instruction(&last));
    }
}

fn print_json(snapshot: &Snapshot) -> Result<(), String> {
    let json = serde_json::to_string_pretty(snapshot).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn run_self_test() -> Result<(), String> {
    use nibble::{to_bits, from_bits, Opcode, StopReason};

    println!("━━━ Nibble Emulator Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;
    let mut check = |name: &str, ok: bool| {
        if ok {
            println!("{}... ✓", name);
            passed += 1;
        } else {
            println!("{}... ✗", name);
            failed += 1;
        }
    };

    let ins = |op: Opcode, a: u8, b: u8| Instruction { opcode: op, operand1: a, operand2: b };

    // Bit conversion roundtrip
    check(
        "Bit conversion roundtrip",
        (0..16).all(|n| to_bits(n, 4).map(|b| from_bits(&b)) == Ok(n)),
    );

    // 4-bit add/sub wrap
    let mut ok = true;
    for a in 0..16u8 {
        for b in 0..16u8 {
            let mut m = Machine::new();
            ok &= m.execute(ins(Opcode::Immd, 1, a)).is_ok();
            ok &= m.execute(ins(Opcode::Immd, 2, b)).is_ok();
            ok &= m.execute(ins(Opcode::Add, 1, 2)).is_ok();
            ok &= m.registers().values()[0].to_u8() == (a + b) % 16;
            ok &= m.execute(ins(Opcode::Sub, 1, 2)).is_ok();
            ok &= m.registers().values()[0].to_u8() == a.wrapping_sub(b) % 16;
        }
    }
    check("ADD/SUB modulo 16", ok);

    // Jump if zero
    let mut m = Machine::new();
    let jumped = m.execute(ins(Opcode::JumpIfZero, 0b0110, 3));
    check("JMP_IF_ZERO sets clock", jumped == Ok(true) && m.clock().value().to_u8() == 6);

    // Out-of-range register is a no-op
    let mut m = Machine::new();
    let before = m.snapshot();
    let result = m.execute(ins(Opcode::Mov, 1, 15));
    check("Register 15 rejected", result.is_err() && m.snapshot() == before);

    // End-to-end program
    let mut m = Machine::new();
    let loaded = m.load(&[ins(Opcode::Immd, 1, 5), ins(Opcode::Immd, 2, 3), ins(Opcode::Add, 1, 2)]);
    let summary = Runner::new(RunConfig { cycle_delay_ms: 0, max_cycles: Some(3), rewind: true })
        .run(&mut m);
    check(
        "IMMD/IMMD/ADD program",
        loaded.is_ok()
            && summary.reason == StopReason::CycleLimit
            && m.registers().values()[0].to_u8() == 8,
    );

    // Clock wraps
    let mut m = Machine::new();
    for _ in 0..16 {
        m.step();
    }
    check("Clock wraps 15 → 0", m.clock().value().is_zero());

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
        Ok(())
    } else {
        Err(format!("{} self-test(s) failed", failed))
    }
}
