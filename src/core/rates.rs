//! Rate table abstractions

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;

use super::currency::{CurrencyCode, RateEntry};
use super::error::{RateError, RateResult};

/// Synchronization strategy backing a [`RateStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreStrategy {
    /// Explicit shared/exclusive locking with a bounded wait.
    #[default]
    Locked,
    /// Internally synchronized concurrent map, no caller-visible locking.
    SynchronizedMap,
}

impl Display for StoreStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreStrategy::Locked => f.write_str("locked"),
            StoreStrategy::SynchronizedMap => f.write_str("synchronized-map"),
        }
    }
}

/// A currency -> rate table shared by concurrent readers and occasional writers.
///
/// Every rate is expressed relative to [`RateStore::base`], whose rate is always one.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// Returns the current rate for `code`.
    async fn get(&self, code: &CurrencyCode) -> RateResult<Decimal>;

    /// Inserts or replaces the rate for `code`.
    async fn put(&self, code: CurrencyCode, rate: Decimal) -> RateResult<()>;

    /// Point-in-time listing of the table, sorted by code.
    async fn entries(&self) -> RateResult<Vec<RateEntry>>;

    fn base(&self) -> &CurrencyCode;

    fn strategy(&self) -> StoreStrategy;
}

/// Checks a rate against the table invariants before it is stored.
pub fn validate_rate(base: &CurrencyCode, code: &CurrencyCode, rate: Decimal) -> RateResult<()> {
    if rate <= Decimal::ZERO {
        return Err(RateError::InvalidRate {
            code: code.clone(),
            rate,
            reason: "rates must be strictly positive",
        });
    }
    if code == base && rate != Decimal::ONE {
        return Err(RateError::InvalidRate {
            code: code.clone(),
            rate,
            reason: "the base currency rate is fixed at 1",
        });
    }
    Ok(())
}

/// Builds the initial table from a seed list. The base currency is always present.
pub fn seed_table<I>(base: &CurrencyCode, seed: I) -> RateResult<HashMap<CurrencyCode, RateEntry>>
where
    I: IntoIterator<Item = (CurrencyCode, Decimal)>,
{
    let mut table = HashMap::new();
    table.insert(base.clone(), RateEntry::new(base.clone(), Decimal::ONE));
    for (code, rate) in seed {
        validate_rate(base, &code, rate)?;
        table.insert(code.clone(), RateEntry::new(code, rate));
    }
    Ok(table)
}

pub(crate) fn sorted_entries(mut entries: Vec<RateEntry>) -> Vec<RateEntry> {
    entries.sort_by(|a, b| a.code.cmp(&b.code));
    entries
}
