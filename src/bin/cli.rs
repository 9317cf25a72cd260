//! EmberKV CLI
//!
//! Command-line interface operating directly on a local data directory.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use emberkv::checkpoint::CheckpointOutcome;
use emberkv::wal::WalRecovery;
use emberkv::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// EmberKV CLI
#[derive(Parser, Debug)]
#[command(name = "emberkv-cli")]
#[command(about = "CLI for the EmberKV key-value store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./emberkv_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Fold the unmerged log into the snapshot
    Checkpoint,

    /// Print every live key and value
    Dump,

    /// Print the raw log records
    Log,

    /// Report log statistics without repairing anything
    Verify,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,emberkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> emberkv::Result<()> {
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .background_checkpoint(false)
        .build();

    // Verify must not touch the files, so it skips opening the engine.
    if let Commands::Verify = args.command {
        let result = WalRecovery::verify(&config.log_path)?;
        println!("records:    {}", result.entries_recovered);
        println!("malformed:  {}", result.entries_corrupted);
        println!(
            "last seq:   {}",
            result
                .last_sequence
                .map_or_else(|| "-".to_string(), |s| s.to_string())
        );
        println!("torn tail:  {} bytes", result.truncated_bytes);
        return Ok(());
    }

    let engine = Engine::open(config)?;

    match args.command {
        Commands::Get { key } => match engine.get(&key) {
            Some(value) => println!("{}", value),
            None => {
                eprintln!("(not found)");
                engine.close()?;
                process::exit(2);
            }
        },
        Commands::Put { key, value } => {
            engine.put(&key, &value)?;
            println!("OK");
        }
        Commands::Del { key } => {
            engine.delete(&key)?;
            println!("OK");
        }
        Commands::Checkpoint => match engine.checkpoint()? {
            CheckpointOutcome::Completed(stats) => println!(
                "checkpointed through {} ({} records, {} keys in snapshot)",
                stats.high_water, stats.records_folded, stats.snapshot_entries
            ),
            CheckpointOutcome::Skipped { .. } => println!("nothing to checkpoint"),
        },
        Commands::Dump => {
            for (key, value) in engine.entries() {
                println!("{} {}", key, value);
            }
        }
        Commands::Log => {
            for record in engine.log_records()? {
                println!("{}", record);
            }
        }
        Commands::Verify => unreachable!("handled before the engine is opened"),
    }

    engine.close()
}
