use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Generate synthetic Capsule directories for exercising the compiler
/// and verifier without checked-in binary fixtures.
#[derive(Parser)]
#[command(name = "axm-sim")]
struct Cli {
    /// Directory to write the capsule-<id> directory into.
    out_dir: PathBuf,

    /// Fire a wheel_slip event at the session midpoint, followed by a
    /// recovery_action a few frames later, and trigger residual recording.
    #[arg(long)]
    crash: bool,

    /// Number of latent/residual frames to emit.
    #[arg(long, default_value_t = 100)]
    frames: u32,

    /// Seed for the deterministic pseudo-random frame filler.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match axm_sim::generate_session(&cli.out_dir, cli.crash, cli.frames, cli.seed) {
        Ok(path) => {
            println!("generated: {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("FATAL: {e}");
            ExitCode::FAILURE
        }
    }
}
