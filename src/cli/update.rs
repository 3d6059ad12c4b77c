use super::{convert, rates};
use crate::core::{ConversionService, CurrencyCode};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::info;

/// A conversion to run once the rate has been replaced.
pub struct FollowUp {
    pub amount: Decimal,
    pub from: String,
    pub to: String,
}

pub async fn run(
    service: &ConversionService,
    code: &str,
    rate: Decimal,
    follow_up: Option<FollowUp>,
) -> Result<()> {
    let code: CurrencyCode = code.parse()?;
    service
        .store()
        .put(code.clone(), rate)
        .await
        .with_context(|| format!("Failed to update rate for {code}"))?;
    info!(%code, %rate, "Rate updated");

    rates::run(service.store().as_ref(), false).await?;

    if let Some(FollowUp { amount, from, to }) = follow_up {
        println!();
        convert::run(service, amount, &from, &to).await?;
    }
    Ok(())
}
