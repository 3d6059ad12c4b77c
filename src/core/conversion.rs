//! Amount conversion through the base currency

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::currency::CurrencyCode;
use super::error::{RateError, RateResult};
use super::rates::RateStore;

/// Converts amounts between currencies using the rates held by a [`RateStore`].
///
/// Nothing is cached: each conversion re-reads both rates, so a `put` is visible
/// to the very next call.
#[derive(Clone)]
pub struct ConversionService {
    store: Arc<dyn RateStore>,
}

impl ConversionService {
    pub fn new(store: Arc<dyn RateStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn RateStore> {
        &self.store
    }

    /// Converts `amount` from `from` into `to`.
    ///
    /// Rates are units of base per unit of currency, so the amount is first taken
    /// into the base currency (`amount * rate(from)`), then out of it (`/ rate(to)`).
    /// The `from` rate is read first, so its failure is the one reported when both
    /// codes are unknown. Equal rates return `amount` untouched.
    #[instrument(skip(self), fields(strategy = %self.store.strategy()))]
    pub async fn convert(
        &self,
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> RateResult<Decimal> {
        let from_rate = self.store.get(from).await?;
        let to_rate = self.store.get(to).await?;
        if from_rate == to_rate {
            debug!("Equal rates, amount unchanged");
            return Ok(amount);
        }

        let overflow = || RateError::Overflow {
            amount,
            from: from.clone(),
            to: to.clone(),
        };
        let converted = from_rate
            .checked_mul(amount)
            .and_then(|base_amount| base_amount.checked_div(to_rate))
            .ok_or_else(overflow)?;

        debug!(%converted, "Converted amount");
        Ok(converted)
    }

    /// Host-facing conversion where any argument may be missing.
    ///
    /// A missing argument yields `Ok(None)`; lookup failures are errors, never `None`.
    pub async fn get_converted_amount(
        &self,
        amount: Option<Decimal>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> RateResult<Option<Decimal>> {
        let (Some(amount), Some(from), Some(to)) = (amount, from, to) else {
            debug!("Missing argument, no result");
            return Ok(None);
        };

        let from: CurrencyCode = from.parse()?;
        let to: CurrencyCode = to.parse()?;
        self.convert(amount, &from, &to).await.map(Some)
    }
}
