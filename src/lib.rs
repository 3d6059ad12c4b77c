pub mod cli;
pub mod core;
pub mod store;

use crate::cli::bench::BenchOptions;
use crate::cli::update::FollowUp;
use crate::core::{ConversionService, StoreStrategy, config::AppConfig};
use anyhow::Result;
use rust_decimal::Decimal;
use tracing::{debug, info};

pub enum AppCommand {
    Rates {
        json: bool,
    },
    Convert {
        amount: Decimal,
        from: String,
        to: String,
    },
    Update {
        code: String,
        rate: Decimal,
        follow_up: Option<FollowUp>,
    },
    Bench(BenchOptions),
}

/// Runs `command` against a store seeded from the configuration.
///
/// `strategy` overrides the strategy named in the configuration. For `Bench`, no
/// override means every strategy is measured.
pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    strategy: Option<StoreStrategy>,
) -> Result<()> {
    info!("fxcache starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Rates { json } => {
            let service = conversion_service(&config, strategy)?;
            cli::rates::run(service.store().as_ref(), json).await
        }
        AppCommand::Convert { amount, from, to } => {
            let service = conversion_service(&config, strategy)?;
            cli::convert::run(&service, amount, &from, &to).await
        }
        AppCommand::Update {
            code,
            rate,
            follow_up,
        } => {
            let service = conversion_service(&config, strategy)?;
            cli::update::run(&service, &code, rate, follow_up).await
        }
        AppCommand::Bench(options) => {
            let strategies = match strategy {
                Some(s) => vec![s],
                None => vec![StoreStrategy::Locked, StoreStrategy::SynchronizedMap],
            };
            cli::bench::run(&config, &strategies, options).await?;
            Ok(())
        }
    }
}

fn conversion_service(
    config: &AppConfig,
    strategy: Option<StoreStrategy>,
) -> Result<ConversionService> {
    let strategy = strategy.unwrap_or(config.store.strategy);
    Ok(ConversionService::new(store::build_store(config, strategy)?))
}
