use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use axm_query_demo::ShardView;

/// Search a compiled Shard's claim graph via DuckDB.
#[derive(Parser)]
#[command(name = "axm-query-demo")]
struct Cli {
    /// Path to the Shard directory.
    shard: PathBuf,
    /// Substring to search for across subject, object, and predicate.
    term: String,
    #[arg(long, default_value_t = 20)]
    limit: i32,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let view = match ShardView::mount(&cli.shard) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("FATAL: {e}");
            return ExitCode::FAILURE;
        }
    };

    match view.search(&cli.term, cli.limit) {
        Ok(rows) => {
            for row in &rows {
                println!("{}", serde_json::to_string(row).unwrap());
            }
            log::info!("{} claims matched", rows.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("FATAL: {e}");
            ExitCode::FAILURE
        }
    }
}
