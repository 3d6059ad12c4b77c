//! Concurrent read/refresh workload against each store strategy.

use super::ui;
use crate::core::config::AppConfig;
use crate::core::{ConversionService, CurrencyCode, RateError, RateStore, StoreStrategy};
use crate::store::build_store;
use anyhow::{Context, Result};
use comfy_table::Cell;
use futures::future::join_all;
use indicatif::ProgressBar;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchOptions {
    /// Concurrent reader tasks
    pub readers: usize,
    /// Conversions issued by each reader
    pub requests: usize,
    /// Rate refreshes issued by the single writer
    pub writes: usize,
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self {
            readers: 8,
            requests: 10_000,
            writes: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Tally {
    conversions: u64,
    timeouts: u64,
    failures: u64,
}

impl Tally {
    fn record<T>(&mut self, result: &Result<T, RateError>) {
        match result {
            Ok(_) => self.conversions += 1,
            Err(RateError::Timeout { .. }) => self.timeouts += 1,
            Err(e) => {
                debug!(error = %e, "Conversion failed");
                self.failures += 1;
            }
        }
    }

    fn merge(&mut self, other: &Tally) {
        self.conversions += other.conversions;
        self.timeouts += other.timeouts;
        self.failures += other.failures;
    }
}

#[derive(Debug, Clone)]
pub struct BenchReport {
    pub strategy: StoreStrategy,
    pub conversions: u64,
    pub timeouts: u64,
    pub failures: u64,
    pub writes: u64,
    pub write_timeouts: u64,
    pub elapsed: Duration,
}

impl BenchReport {
    /// Successful conversions per second.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.conversions as f64 / secs
        } else {
            0.0
        }
    }
}

/// Every ordered currency pair of the seeded table, identity pairs included.
fn currency_pairs(codes: &[CurrencyCode]) -> Vec<(CurrencyCode, CurrencyCode)> {
    codes
        .iter()
        .flat_map(|from| codes.iter().map(move |to| (from.clone(), to.clone())))
        .collect()
}

async fn read_load(
    service: ConversionService,
    pairs: Arc<Vec<(CurrencyCode, CurrencyCode)>>,
    offset: usize,
    requests: usize,
    progress: ProgressBar,
) -> Tally {
    let mut tally = Tally::default();
    for i in 0..requests {
        let (from, to) = &pairs[(offset + i) % pairs.len()];
        let result = service.convert(Decimal::ONE_HUNDRED, from, to).await;
        tally.record(&result);
        progress.inc(1);
        if i % 64 == 0 {
            tokio::task::yield_now().await;
        }
    }
    tally
}

/// Alternates each non-base rate between its seed value and a nudged value.
async fn write_load(
    store: Arc<dyn RateStore>,
    seed: Vec<(CurrencyCode, Decimal)>,
    writes: usize,
) -> (u64, u64) {
    let nudge = Decimal::new(10001, 4);
    let (mut done, mut timeouts) = (0, 0);
    for i in 0..writes {
        let Some((code, rate)) = seed.get(i % seed.len().max(1)) else {
            break;
        };
        let rate = if (i / seed.len()) % 2 == 0 {
            rate.checked_mul(nudge).unwrap_or(*rate)
        } else {
            *rate
        };
        match store.put(code.clone(), rate).await {
            Ok(()) => done += 1,
            Err(RateError::Timeout { .. }) => timeouts += 1,
            Err(e) => warn!(error = %e, "Rate refresh rejected"),
        }
        tokio::task::yield_now().await;
    }
    (done, timeouts)
}

/// Runs the workload against a freshly seeded store of the given strategy.
pub async fn run_strategy(
    config: &AppConfig,
    strategy: StoreStrategy,
    options: BenchOptions,
    progress: &ProgressBar,
) -> Result<BenchReport> {
    let store = build_store(config, strategy)?;
    let service = ConversionService::new(Arc::clone(&store));

    let codes: Vec<CurrencyCode> = store
        .entries()
        .await?
        .into_iter()
        .map(|entry| entry.code)
        .collect();
    let pairs = Arc::new(currency_pairs(&codes));
    let seed: Vec<_> = config
        .seed()
        .into_iter()
        .filter(|(code, _)| code != store.base())
        .collect();

    progress.set_message(strategy.to_string());
    let start = Instant::now();

    let writer = tokio::spawn(write_load(Arc::clone(&store), seed, options.writes));
    let readers: Vec<_> = (0..options.readers)
        .map(|offset| {
            tokio::spawn(read_load(
                service.clone(),
                Arc::clone(&pairs),
                offset,
                options.requests,
                progress.clone(),
            ))
        })
        .collect();

    let mut tally = Tally::default();
    for reader in join_all(readers).await {
        tally.merge(&reader.context("Reader task panicked")?);
    }
    let (writes, write_timeouts) = writer.await.context("Writer task panicked")?;
    let elapsed = start.elapsed();

    let report = BenchReport {
        strategy,
        conversions: tally.conversions,
        timeouts: tally.timeouts,
        failures: tally.failures,
        writes,
        write_timeouts,
        elapsed,
    };
    info!(
        %strategy,
        conversions = report.conversions,
        timeouts = report.timeouts,
        ?elapsed,
        "Benchmark finished"
    );
    Ok(report)
}

pub fn display_as_table(reports: &[BenchReport]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Strategy"),
        ui::header_cell("Conversions"),
        ui::header_cell("Timeouts"),
        ui::header_cell("Failures"),
        ui::header_cell("Writes"),
        ui::header_cell("Write timeouts"),
        ui::header_cell("Elapsed"),
        ui::header_cell("Conversions/s"),
    ]);

    for report in reports {
        table.add_row(vec![
            Cell::new(report.strategy),
            ui::number_cell(report.conversions),
            ui::failure_cell(report.timeouts),
            ui::failure_cell(report.failures),
            ui::number_cell(report.writes),
            ui::failure_cell(report.write_timeouts),
            ui::number_cell(format!("{:.2?}", report.elapsed)),
            ui::number_cell(format!("{:.0}", report.throughput())),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Rate store benchmark", ui::StyleType::Title),
        table
    )
}

/// Progress bar length; saturates instead of wrapping for absurd flag values.
fn total_requests(options: BenchOptions, strategies: usize) -> u64 {
    (options.readers as u64)
        .saturating_mul(options.requests as u64)
        .saturating_mul(strategies as u64)
}

pub async fn run(
    config: &AppConfig,
    strategies: &[StoreStrategy],
    options: BenchOptions,
) -> Result<Vec<BenchReport>> {
    let progress = ui::new_progress_bar(total_requests(options, strategies.len()));

    let mut reports = Vec::with_capacity(strategies.len());
    for &strategy in strategies {
        reports.push(run_strategy(config, strategy, options, &progress).await?);
    }
    progress.finish_and_clear();

    println!("{}", display_as_table(&reports));
    Ok(reports)
}
