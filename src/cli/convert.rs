use super::ui;
use crate::core::ConversionService;
use anyhow::Result;
use rust_decimal::Decimal;

/// One-line summary of a conversion, `NULL` when there is no result.
pub fn format_conversion(amount: Decimal, from: &str, to: &str, result: Option<Decimal>) -> String {
    let converted = match result {
        Some(v) => ui::style_text(&v.normalize().to_string(), ui::StyleType::Value),
        None => ui::style_text("NULL", ui::StyleType::Error),
    };
    format!(
        "{} {} = {} {}",
        amount,
        from.to_ascii_uppercase(),
        converted,
        to.to_ascii_uppercase()
    )
}

pub async fn run(service: &ConversionService, amount: Decimal, from: &str, to: &str) -> Result<()> {
    let result = service
        .get_converted_amount(Some(amount), Some(from), Some(to))
        .await?;
    println!("{}", format_conversion(amount, from, to, result));
    Ok(())
}
