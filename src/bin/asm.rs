use std::fs;
use std::process::ExitCode;

use clap::Parser;

use rv32i_toolchain::assembler::assemble;
use rv32i_toolchain::hex::render;

/// Assemble RV32I assembly text into the hex object format.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the input assembly source file
    input: String,

    /// Path to write the hex object listing to
    #[arg(short, long)]
    output: String,
}

fn run(args: Args) -> Result<(), String> {
    let source = fs::read_to_string(&args.input).map_err(|e| format!("{}: {e}", args.input))?;
    let words = assemble(&source).map_err(|e| e.to_string())?;
    fs::write(&args.output, render(&words)).map_err(|e| format!("{}: {e}", args.output))?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("asm: {e}");
            ExitCode::FAILURE
        }
    }
}
