use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use utilmint::commands::{self, period::Usage};
use utilmint::{config, telemetry, AccountName};

#[derive(Parser)]
#[command(name = "utilmint")]
#[command(about = "Usage accounting and utilization-driven inflation", long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.utilmint/config.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Account sending the request (default: the account the request names, or the admin)
    #[arg(long = "as", global = true, value_name = "ACCOUNT")]
    caller: Option<AccountName>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config if needed and record epoch 0
    Init {
        /// Start of epoch 0: seconds or YYYY-MM-DDTHH:MM:SS (default: today, UTC)
        #[arg(long, value_parser = commands::parse_timestamp)]
        start: Option<u32>,
    },

    /// Manage authorized usage sources
    Source {
        #[command(subcommand)]
        action: SourceAction,
    },

    /// Submit aggregate usage for a completed epoch
    Report {
        /// Reporting source
        #[arg(long)]
        source: AccountName,

        /// Processing units consumed during the epoch
        #[arg(long)]
        processing: u64,

        /// Bandwidth consumed during the epoch, in 8-byte words
        #[arg(long)]
        bandwidth: u64,

        /// Epoch start (default: the epoch after the latest)
        #[arg(long, value_parser = commands::parse_timestamp)]
        timestamp: Option<u32>,
    },

    /// Record a participant's usage within the reported epoch
    Allocate {
        /// Reporting source
        #[arg(long)]
        source: AccountName,

        /// Participant receiving the rebate
        #[arg(long)]
        participant: AccountName,

        #[arg(long, default_value_t = 0)]
        processing: u64,

        #[arg(long, default_value_t = 0)]
        bandwidth: u64,

        /// Epoch start (default: the reported epoch)
        #[arg(long, value_parser = commands::parse_timestamp)]
        timestamp: Option<u32>,
    },

    /// Close the reported epoch and mint its pools
    Close {
        /// Reporting source
        #[arg(long)]
        source: AccountName,

        /// Epoch start (default: the reported epoch)
        #[arg(long, value_parser = commands::parse_timestamp)]
        timestamp: Option<u32>,
    },

    /// Withdraw a participant's accrued rebate
    Claim {
        participant: AccountName,
    },

    /// Pause or resume the engine and set the averaging window
    SetConfig {
        /// true to pause, false to resume
        #[arg(long)]
        paused: Option<bool>,

        /// Moving-average window in epochs (1-19)
        #[arg(long)]
        drag_limit: Option<u32>,
    },

    /// Show engine status
    Status {
        /// Print Prometheus metrics instead
        #[arg(long)]
        metrics: bool,
    },

    /// Show recent usage snapshots
    History {
        /// Number of epochs to show
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Execute a JSON batch of requests (`-` reads stdin)
    Apply {
        requests: String,

        /// Continue after a rejected request
        #[arg(long)]
        keep_going: bool,
    },
}

#[derive(Subcommand)]
enum SourceAction {
    /// Authorize an account to submit reports
    Add { account: AccountName },

    /// Revoke an account's authorization
    Remove { account: AccountName },

    /// Check whether an account is authorized
    Check { account: AccountName },

    /// List authorized sources
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing(cli.verbose)?;

    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(config::default_config_path);
    let caller = cli.caller.as_ref();

    match cli.command {
        Commands::Init { start } => commands::init::run(&config_path, caller, start),
        Commands::Source { action } => match action {
            SourceAction::Add { account } => commands::source::add(&config_path, caller, account),
            SourceAction::Remove { account } => {
                commands::source::remove(&config_path, caller, account)
            }
            SourceAction::Check { account } => {
                commands::source::check(&config_path, caller, &account)
            }
            SourceAction::List => commands::source::list(&config_path),
        },
        Commands::Report {
            source,
            processing,
            bandwidth,
            timestamp,
        } => commands::period::report(
            &config_path,
            caller,
            source,
            Usage {
                processing_units: processing,
                bandwidth_units: bandwidth,
                timestamp,
            },
        ),
        Commands::Allocate {
            source,
            participant,
            processing,
            bandwidth,
            timestamp,
        } => commands::period::allocate(
            &config_path,
            caller,
            source,
            participant,
            Usage {
                processing_units: processing,
                bandwidth_units: bandwidth,
                timestamp,
            },
        ),
        Commands::Close { source, timestamp } => {
            commands::period::close(&config_path, caller, source, timestamp)
        }
        Commands::Claim { participant } => commands::period::claim(&config_path, caller, participant),
        Commands::SetConfig { paused, drag_limit } => {
            commands::period::set_config(&config_path, caller, paused, drag_limit)
        }
        Commands::Status { metrics } => commands::status::run(&config_path, metrics),
        Commands::History { limit, json } => commands::history::run(&config_path, limit, json),
        Commands::Apply {
            requests,
            keep_going,
        } => commands::apply::run(&config_path, caller, &requests, keep_going),
    }
}
