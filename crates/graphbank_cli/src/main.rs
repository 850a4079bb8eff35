//! GraphBank CLI
//!
//! Command-line demo for the transactional toggle workflow.
//!
//! # Commands
//!
//! - `toggle` - Run read-decide-write toggle cycles against an in-process store
//! - `schema` - Print the account schema declaration
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// GraphBank command-line demo.
#[derive(Parser)]
#[command(name = "graphbank")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Store endpoint (advisory; the demo store runs in-process)
    #[arg(global = true, short, long, default_value = "http://localhost:9080")]
    endpoint: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run toggle cycles: create the record when absent, delete it when present
    Toggle {
        /// Name to match and to give a created record
        #[arg(short, long)]
        name: String,

        /// Balance for a created record
        #[arg(short, long, default_value = "0")]
        balance: i64,

        /// Type tag attached to a created record
        #[arg(short, long, default_value = "user")]
        type_tag: String,

        /// Number of cycles to run
        #[arg(short, long, default_value = "1")]
        runs: u32,
    },

    /// Print the account schema declaration
    Schema,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Toggle {
            name,
            balance,
            type_tag,
            runs,
        } => {
            commands::toggle::run(&cli.endpoint, &name, balance, &type_tag, runs)?;
        }
        Commands::Schema => {
            commands::schema::run();
        }
        Commands::Version => {
            println!("GraphBank CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
