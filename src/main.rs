use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use fxcache::cli::bench::BenchOptions;
use fxcache::cli::update::FollowUp;
use fxcache::core::StoreStrategy;
use fxcache::core::log::init_logging;
use rust_decimal::Decimal;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Rate store strategy, overrides the configuration
    #[arg(short, long, global = true, value_enum)]
    strategy: Option<Strategy>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    /// Reader/writer lock with a bounded wait
    Locked,
    /// Concurrent map, readers never wait
    SynchronizedMap,
}

impl From<Strategy> for StoreStrategy {
    fn from(strategy: Strategy) -> StoreStrategy {
        match strategy {
            Strategy::Locked => StoreStrategy::Locked,
            Strategy::SynchronizedMap => StoreStrategy::SynchronizedMap,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the rate table
    Rates {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Convert an amount between two currencies
    Convert {
        #[arg(allow_hyphen_values = true)]
        amount: Decimal,
        from: String,
        to: String,
    },
    /// Replace a rate, then show the table
    Update {
        code: String,
        rate: Decimal,
        /// Amount to convert after the update
        #[arg(long, requires_all = ["from", "to"])]
        amount: Option<Decimal>,
        #[arg(long, requires = "amount")]
        from: Option<String>,
        #[arg(long, requires = "amount")]
        to: Option<String>,
    },
    /// Measure concurrent conversions while rates are refreshed
    Bench {
        /// Concurrent reader tasks
        #[arg(long, default_value_t = BenchOptions::default().readers)]
        readers: usize,
        /// Conversions per reader
        #[arg(long, default_value_t = BenchOptions::default().requests)]
        requests: usize,
        /// Rate refreshes during the run
        #[arg(long, default_value_t = BenchOptions::default().writes)]
        writes: usize,
    },
}

impl From<Commands> for fxcache::AppCommand {
    fn from(cmd: Commands) -> fxcache::AppCommand {
        match cmd {
            Commands::Rates { json } => fxcache::AppCommand::Rates { json },
            Commands::Convert { amount, from, to } => {
                fxcache::AppCommand::Convert { amount, from, to }
            }
            Commands::Update {
                code,
                rate,
                amount,
                from,
                to,
            } => {
                let follow_up = match (amount, from, to) {
                    (Some(amount), Some(from), Some(to)) => Some(FollowUp { amount, from, to }),
                    _ => None,
                };
                fxcache::AppCommand::Update {
                    code,
                    rate,
                    follow_up,
                }
            }
            Commands::Bench {
                readers,
                requests,
                writes,
            } => fxcache::AppCommand::Bench(BenchOptions {
                readers,
                requests,
                writes,
            }),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let result = match cli.command {
        Some(Commands::Setup) => fxcache::cli::setup::setup(),
        Some(cmd) => {
            fxcache::run_command(
                cmd.into(),
                cli.config_path.as_deref(),
                cli.strategy.map(StoreStrategy::from),
            )
            .await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
