//! Headless 65xx runner.
//!
//! Loads a binary image into flat RAM and runs it until BRK, a breakpoint,
//! STP/JAM, a jump-to-self trap or a cycle limit. Useful with
//! functional-test ROMs and with `RUST_LOG=trace` for instruction traces.

use std::path::PathBuf;
use std::process;

use cpu_65xx::{Cpu65xx, CpuConfig, CpuMode, StepResult};
use emu_core::{Observable, SimpleBus};
use log::info;

// ---------------------------------------------------------------------------
// CLI argument parsing
// ---------------------------------------------------------------------------

struct CliArgs {
    image: Option<PathBuf>,
    mode: CpuMode,
    load_at: u32,
    start: Option<u32>,
    max_cycles: u64,
    trace: bool,
    breakpoints: Vec<u32>,
    stop_on_brk: bool,
}

/// Parse `$C000`, `0xC000` or decimal.
fn parse_number(s: &str) -> Option<u32> {
    if let Some(hex) = s.strip_prefix('$').or_else(|| s.strip_prefix("0x")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

fn parse_mode(s: &str) -> Option<CpuMode> {
    match s.to_ascii_lowercase().as_str() {
        "6502" | "nmos" => Some(CpuMode::Nmos6502),
        "65c02" | "cmos" => Some(CpuMode::Cmos65C02),
        "65c816" | "65816" | "816" => Some(CpuMode::W65C816),
        _ => None,
    }
}

fn number_arg(args: &[String], i: usize, name: &str) -> u32 {
    match args.get(i).and_then(|s| parse_number(s)) {
        Some(n) => n,
        None => {
            eprintln!("{name} needs a number ($hex, 0xhex or decimal)");
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        image: None,
        mode: CpuMode::Nmos6502,
        load_at: 0,
        start: None,
        max_cycles: 100_000_000,
        trace: false,
        breakpoints: Vec::new(),
        stop_on_brk: true,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--mode" => {
                i += 1;
                match args.get(i).and_then(|s| parse_mode(s)) {
                    Some(mode) => cli.mode = mode,
                    None => {
                        eprintln!("--mode must be 6502, 65c02 or 65c816");
                        process::exit(1);
                    }
                }
            }
            "--load" => {
                i += 1;
                cli.load_at = number_arg(&args, i, "--load");
            }
            "--start" => {
                i += 1;
                cli.start = Some(number_arg(&args, i, "--start"));
            }
            "--cycles" => {
                i += 1;
                cli.max_cycles = u64::from(number_arg(&args, i, "--cycles"));
            }
            "--break" => {
                i += 1;
                cli.breakpoints.push(number_arg(&args, i, "--break"));
            }
            "--trace" => cli.trace = true,
            "--run-through-brk" => cli.stop_on_brk = false,
            "--help" | "-h" => {
                eprintln!("Usage: run65 [OPTIONS] <image>");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --mode <cpu>         6502, 65c02 or 65c816 [default: 6502]");
                eprintln!("  --load <addr>        Load address of the image [default: 0]");
                eprintln!("  --start <addr>       Start address (default: reset vector)");
                eprintln!("  --cycles <n>         Cycle limit [default: 100000000]");
                eprintln!("  --break <addr>       Stop before executing <addr> (repeatable)");
                eprintln!("  --trace              Log every instruction at trace level");
                eprintln!("  --run-through-brk    Execute BRK instead of stopping");
                process::exit(0);
            }
            other if other.starts_with("--") => {
                eprintln!("Unknown argument: {other}");
                process::exit(1);
            }
            path => cli.image = Some(PathBuf::from(path)),
        }
        i += 1;
    }

    cli
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    let cli = parse_args();

    let Some(path) = cli.image.as_ref() else {
        eprintln!("No image given; see --help");
        process::exit(1);
    };
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Failed to read {}: {e}", path.display());
            process::exit(1);
        }
    };

    let mut bus = if cli.mode == CpuMode::W65C816 {
        SimpleBus::with_size(0x100_0000)
    } else {
        SimpleBus::new()
    };
    bus.load(cli.load_at, &data);

    let config = CpuConfig {
        stop_on_brk: cli.stop_on_brk,
        ..CpuConfig::for_mode(cli.mode)
    };
    let mut cpu = match Cpu65xx::with_config(config) {
        Ok(cpu) => cpu,
        Err(e) => {
            eprintln!("Bad configuration: {e}");
            process::exit(1);
        }
    };
    cpu.set_trace(cli.trace);
    for &address in &cli.breakpoints {
        cpu.set_breakpoint(address);
    }

    match cli.start {
        Some(start) => cpu.set_pc(start),
        None => cpu.reset(),
    }
    info!(
        "{} bytes at ${:06X}, {} starting at ${:06X}",
        data.len(),
        cli.load_at,
        cli.mode,
        cpu.pc()
    );

    let outcome = run(&mut cpu, &mut bus, cli.max_cycles);
    println!("{outcome}");
    for path in ["pc", "a", "x", "y", "s", "p", "cycle"] {
        if let Some(value) = cpu.query(path) {
            println!("{path:>6} = {value}");
        }
    }
}

fn run(cpu: &mut Cpu65xx, bus: &mut SimpleBus, max_cycles: u64) -> String {
    let mut idle_at = None;
    for _ in 0..max_cycles {
        let result = cpu.advance(bus);
        bus.tick(result == StepResult::Held);
        match result {
            StepResult::Cycle => {
                // Functional-test ROMs signal pass/fail by jumping to self.
                let block_move = cpu.mode() == CpuMode::W65C816 && matches!(cpu.opcode(), 0x44 | 0x54);
                if !cpu.is_instruction_in_progress()
                    && cpu.pc() == cpu.instruction_pc()
                    && !block_move
                {
                    return format!("trapped at ${:06X}", cpu.pc());
                }
            }
            StepResult::Held => {}
            StepResult::Idle => {
                if cpu.is_halted() {
                    return format!("halted at ${:06X}", cpu.instruction_pc());
                }
                // WAI with nothing to wake it.
                let pc = cpu.instruction_pc();
                if idle_at.replace(pc) == Some(pc) {
                    return format!("waiting for interrupt at ${pc:06X}");
                }
            }
            StepResult::Breakpoint { address } => return format!("breakpoint at ${address:06X}"),
            StepResult::StepStop { address, .. } => return format!("step stop at ${address:06X}"),
            StepResult::BrkStop { address } => return format!("BRK at ${address:06X}"),
            StepResult::IllegalOpcode { address, opcode } => {
                return format!("unsupported opcode ${opcode:02X} at ${address:06X}");
            }
        }
    }
    format!("cycle limit reached at ${:06X}", cpu.pc())
}
