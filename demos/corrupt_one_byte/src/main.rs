use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser)]
#[command(name = "corrupt-one-byte")]
struct Cli {
    /// File to corrupt in place, typically a Capsule's cam_latents.bin.
    file: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match corrupt_one_byte::corrupt_one_byte(&cli.file) {
        Ok(offset) => {
            println!("Corrupted 1 byte at offset {offset} in {}", cli.file.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("FATAL: {e}");
            ExitCode::FAILURE
        }
    }
}
