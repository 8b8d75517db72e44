use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use axm_verify::verify_shard;

/// Verify a Shard directory against a governance trust store.
#[derive(Parser)]
#[command(name = "axm-verify")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Verify a single Shard directory.
    Shard {
        /// Path to the Shard directory.
        path: PathBuf,
        /// Repo root to load governance/trust_store.json from.
        /// Auto-discovered by walking parents when omitted.
        #[arg(long)]
        repo_root: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let Command::Shard { path, repo_root } = cli.command;
    let result = verify_shard(&path, repo_root);

    match serde_json::to_string(&result) {
        Ok(line) => println!("{line}"),
        Err(e) => log::error!("failed to serialize verify result: {e}"),
    }

    // Exit 0 regardless of PASS/FAIL: callers inspect `status` in the
    // printed JSON, not the process exit code.
    ExitCode::SUCCESS
}
