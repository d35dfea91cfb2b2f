use std::fs;
use std::process::ExitCode;

use clap::Parser;

use rv32i_toolchain::hart::memory::{Memory, DEFAULT_MEMORY_SIZE};
use rv32i_toolchain::hart::Hart;
use rv32i_toolchain::hex::parse;

/// Run a hex object listing on the RV32I instruction-set simulator.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the input hex object listing
    input: String,

    /// Maximum number of instructions to execute before giving up
    #[arg(long, default_value_t = 10_000)]
    max_cycles: u64,

    /// Print one line per retired instruction
    #[arg(long)]
    trace: bool,
}

fn run(args: Args) -> Result<(), String> {
    let text = fs::read_to_string(&args.input).map_err(|e| format!("{}: {e}", args.input))?;
    let words = parse(&text).map_err(|e| e.to_string())?;
    let mut hart = Hart::new(words, Memory::new(DEFAULT_MEMORY_SIZE)).with_trace(args.trace);
    let cycles = hart.run(args.max_cycles).map_err(|e| e.to_string())?;
    let a0 = hart.register(10);
    let mem0 = hart.mem.read_word(0).unwrap_or(0);
    println!(
        "cycles={cycles} halted={} pc=0x{:08x} a0={a0} mem0={mem0}",
        hart.halted(),
        hart.pc(),
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("iss: {e}");
            ExitCode::FAILURE
        }
    }
}
