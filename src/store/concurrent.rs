use crate::core::currency::{CurrencyCode, RateEntry};
use crate::core::error::{RateError, RateResult};
use crate::core::rates::{RateStore, StoreStrategy, seed_table, sorted_entries, validate_rate};
use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::debug;

/// Rate table backed by a sharded concurrent map.
///
/// There is no caller-visible locking and no timeout. Entries are swapped whole,
/// so a reader sees either the previous or the new entry.
pub struct ConcurrentRateStore {
    base: CurrencyCode,
    rates: DashMap<CurrencyCode, RateEntry>,
}

impl ConcurrentRateStore {
    pub fn new<I>(base: CurrencyCode, seed: I) -> RateResult<Self>
    where
        I: IntoIterator<Item = (CurrencyCode, Decimal)>,
    {
        let rates: DashMap<_, _> = seed_table(&base, seed)?.into_iter().collect();
        debug!(base = %base, entries = rates.len(), "Seeded concurrent rate store");
        Ok(Self { base, rates })
    }
}

#[async_trait]
impl RateStore for ConcurrentRateStore {
    async fn get(&self, code: &CurrencyCode) -> RateResult<Decimal> {
        match self.rates.get(code) {
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
        debug!("Rate PUT for {}: {}", code, rate);
        self.rates.insert(code.clone(), RateEntry::new(code, rate));
        Ok(())
    }

    async fn entries(&self) -> RateResult<Vec<RateEntry>> {
        let entries = self
            .rates
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        Ok(sorted_entries(entries))
    }

    fn base(&self) -> &CurrencyCode {
        &self.base
    }

    fn strategy(&self) -> StoreStrategy {
        StoreStrategy::SynchronizedMap
    }
}
