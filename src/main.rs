use std::{fs, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use log::info;

use mxrv::arch::{DEFAULT_MAX_ITERATIONS, DEFAULT_MEMORY_SIZE};
use mxrv::{assemble_program, ControlRegister, Core, RunOutcome};

#[derive(Debug, Parser)]
#[command(name = "mxrv", version, about = "Assembler and simulator for the matrix RISC-V core")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Assembles a source file into a binary image
    Asm { input: PathBuf, output: PathBuf },

    /// Runs a binary image until `halt` or the iteration limit
    Run {
        image: PathBuf,

        #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
        max_iterations: usize,

        /// Initial program counter
        #[arg(long, default_value_t = 0, value_parser = parse_u32)]
        start: u32,

        /// Initial stack pointer
        #[arg(long, default_value_t = DEFAULT_MEMORY_SIZE as u32, value_parser = parse_u32)]
        sp: u32,
    },
}

fn parse_u32(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address {s}: {e}"))
}

fn assemble_file(input: PathBuf, output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let src = fs::read_to_string(&input)?;
    let program = assemble_program(&src)?;
    let image = program.image();
    fs::write(&output, &image)?;
    info!(
        "{}: {} instructions, {} data bytes, {} byte image",
        output.display(),
        program.text.len(),
        program.data.len(),
        image.len()
    );
    Ok(())
}

fn run_image(
    image: PathBuf,
    max_iterations: usize,
    cr: ControlRegister,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(&image)?;
    let mut core = Core::new(&bytes, cr);
    let outcome = core.run(max_iterations)?;
    match outcome {
        RunOutcome::Halted => println!("halted after {} cycles", core.cycles()),
        RunOutcome::IterationLimitReached => {
            println!("iteration limit reached after {} cycles", core.cycles())
        }
    }
    println!("pc = 0x{:08x}", core.pc());
    for (i, &v) in core.scalar_regs().iter().enumerate() {
        if v != 0 {
            println!("x{i:<2} = {v} (0x{:08x})", v as u32);
        }
    }
    for (i, tile) in core.matrix_regs().iter().enumerate() {
        if *tile != Default::default() {
            println!("m{i:<2} = {:?}", tile.to_f32());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Asm { input, output } => assemble_file(input, output),
        Command::Run { image, max_iterations, start, sp } => {
            run_image(image, max_iterations, ControlRegister::new(start, sp))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
