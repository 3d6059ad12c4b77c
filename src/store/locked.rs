use crate::core::currency::{CurrencyCode, RateEntry};
use crate::core::error::{Access, RateError, RateResult};
use crate::core::rates::{RateStore, StoreStrategy, seed_table, sorted_entries, validate_rate};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::time::timeout;
use tracing::debug;

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(100);

/// Rate table guarded by an explicit reader/writer lock.
///
/// Readers share the lock, writers take it exclusively. Acquisition is bounded by
/// `lock_timeout`; waiting longer fails with [`RateError::Timeout`]. The lock is
/// fair, so a `get` queued after a `put` always sees the written value.
pub struct LockedRateStore {
    base: CurrencyCode,
    rates: RwLock<HashMap<CurrencyCode, RateEntry>>,
    lock_timeout: Duration,
}

impl LockedRateStore {
    pub fn new<I>(base: CurrencyCode, seed: I, lock_timeout: Duration) -> RateResult<Self>
    where
        I: IntoIterator<Item = (CurrencyCode, Decimal)>,
    {
        let table = seed_table(&base, seed)?;
        debug!(base = %base, entries = table.len(), ?lock_timeout, "Seeded locked rate store");
        Ok(Self {
            base,
            rates: RwLock::new(table),
            lock_timeout,
        })
    }

    async fn read(&self) -> RateResult<RwLockReadGuard<'_, HashMap<CurrencyCode, RateEntry>>> {
        timeout(self.lock_timeout, self.rates.read())
            .await
            .map_err(|_| self.timed_out(Access::Shared))
    }

    async fn write(&self) -> RateResult<RwLockWriteGuard<'_, HashMap<CurrencyCode, RateEntry>>> {
        timeout(self.lock_timeout, self.rates.write())
            .await
            .map_err(|_| self.timed_out(Access::Exclusive))
    }

    fn timed_out(&self, access: Access) -> RateError {
        debug!(%access, waited = ?self.lock_timeout, "Rate table lock timed out");
        RateError::Timeout {
            access,
            waited: self.lock_timeout,
        }
    }
}

#[async_trait]
impl RateStore for LockedRateStore {
    async fn get(&self, code: &CurrencyCode) -> RateResult<Decimal> {
        let rates = self.read().await?;
        match rates.get(code) {
            Some(entry) => {
                debug!("Rate HIT for {}", code);
                Ok(entry.rate)
            }
            None => {
                debug!("Rate MISS for {}", code);
                Err(RateError::NotFound(code.clone()))
            }
        }
    }

    async fn put(&self, code: CurrencyCode, rate: Decimal) -> RateResult<()> {
        validate_rate(&self.base, &code, rate)?;
        let entry = RateEntry::new(code.clone(), rate);

        let mut rates = self.write().await?;
        debug!("Rate PUT for {}: {}", code, rate);
        rates.insert(code, entry);
        Ok(())
    }

    async fn entries(&self) -> RateResult<Vec<RateEntry>> {
        let rates = self.read().await?;
        Ok(sorted_entries(rates.values().cloned().collect()))
    }

    fn base(&self) -> &CurrencyCode {
        &self.base
    }

    fn strategy(&self) -> StoreStrategy {
        StoreStrategy::Locked
    }
}
