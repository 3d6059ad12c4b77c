pub mod concurrent;
pub mod locked;

use crate::core::config::AppConfig;
use crate::core::rates::{RateStore, StoreStrategy};
use anyhow::{Context, Result};
use concurrent::ConcurrentRateStore;
use locked::LockedRateStore;
use std::sync::Arc;
use tracing::debug;

/// Builds and seeds the rate store selected by `strategy`.
pub fn build_store(config: &AppConfig, strategy: StoreStrategy) -> Result<Arc<dyn RateStore>> {
    debug!(%strategy, base = %config.base_currency, "Building rate store");
    let base = config.base_currency.clone();
    let seed = config.seed();

    let store: Arc<dyn RateStore> = match strategy {
        StoreStrategy::Locked => Arc::new(
            LockedRateStore::new(base, seed, config.store.lock_timeout())
                .context("Failed to seed locked rate store")?,
        ),
        StoreStrategy::SynchronizedMap => Arc::new(
            ConcurrentRateStore::new(base, seed)
                .context("Failed to seed synchronized-map rate store")?,
        ),
    };
    Ok(store)
}
