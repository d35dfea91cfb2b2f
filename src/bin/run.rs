use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use rv32i_toolchain::assembler::assemble;
use rv32i_toolchain::hart::memory::{Memory, DEFAULT_MEMORY_SIZE};
use rv32i_toolchain::hart::Hart;
use rv32i_toolchain::hex::render;
use rv32i_toolchain::lowering::lower;

/// Compile the scripting subset to RV32I assembly, assemble it, and
/// run it on the simulator, reporting the generated artifact paths.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the input source file (the scripting subset)
    input: String,

    /// Directory to write program.s and program.hex into
    #[arg(long, default_value = "build")]
    outdir: String,

    /// Maximum number of instructions to execute before giving up
    #[arg(long, default_value_t = 10_000)]
    max_cycles: u64,
}

fn run(args: Args) -> Result<(), String> {
    let source = fs::read_to_string(&args.input).map_err(|e| format!("{}: {e}", args.input))?;

    let outdir = PathBuf::from(&args.outdir);
    fs::create_dir_all(&outdir).map_err(|e| format!("{}: {e}", outdir.display()))?;
    let asm_path = outdir.join("program.s");
    let hex_path = outdir.join("program.hex");

    let asm_text = lower(&source).map_err(|e| e.to_string())?;
    fs::write(&asm_path, &asm_text).map_err(|e| format!("{}: {e}", asm_path.display()))?;

    let words = assemble(&asm_text).map_err(|e| e.to_string())?;
    fs::write(&hex_path, render(&words)).map_err(|e| format!("{}: {e}", hex_path.display()))?;

    let mut hart = Hart::new(words, Memory::new(DEFAULT_MEMORY_SIZE));
    let cycles = hart.run(args.max_cycles).map_err(|e| e.to_string())?;
    println!(
        "cycles={cycles} halted={} pc=0x{:08x} a0={}",
        hart.halted(),
        hart.pc(),
        hart.register(10),
    );
    println!("ASM: {}", asm_path.display());
    println!("HEX: {}", hex_path.display());
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("run: {e}");
            ExitCode::FAILURE
        }
    }
}
