//! Thin CLI frontend for the Capsule-to-Shard compiler (SPEC_FULL.md §6).
//!
//! Exit 0 on success, 1 on any failure with a single-line
//! `FATAL: <reason>` message — no stack traces, matching the
//! court-grade "fail closed" behavior of the reference compiler.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use axm_compile::manifest::{canonical_publisher_key, signing_key_from_hex, GOLD_TIMESTAMP};

#[derive(Parser)]
#[command(name = "axm-compile", about = "Compile a Capsule into a signed Shard")]
struct Cli {
    /// Path to the Capsule directory.
    capsule: PathBuf,
    /// Path to write the Shard directory.
    out: PathBuf,
    /// Use the canonical test key and fixed timestamp for a reproducible gold shard.
    #[arg(long)]
    gold: bool,
    /// Override the publisher signing key (32-byte hex seed).
    #[arg(long)]
    signing_key_hex: Option<String>,
    /// Override the manifest's `created` timestamp (ISO-8601, second precision).
    #[arg(long)]
    timestamp: Option<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let (signing_key, timestamp) = if cli.gold {
        (Some(canonical_publisher_key()), Some(GOLD_TIMESTAMP.to_string()))
    } else {
        let key = match cli.signing_key_hex.as_deref() {
            Some(hex_seed) => match signing_key_from_hex(hex_seed) {
                Ok(k) => Some(k),
                Err(e) => {
                    println!("FATAL: {e}");
                    return ExitCode::FAILURE;
                }
            },
            None => None,
        };
        (key, cli.timestamp)
    };

    match axm_compile::compile_capsule(&cli.capsule, &cli.out, signing_key, timestamp) {
        Ok(report) => {
            println!("PASS: Shard generated at {}", cli.out.display());
            println!("  Entities: {}", report.entity_count);
            println!("  Claims: {}", report.claim_count);
            println!("  Spans: {}", report.span_count);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("FATAL: {e}");
            ExitCode::FAILURE
        }
    }
}
