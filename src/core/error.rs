use rust_decimal::Decimal;
use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;

use super::currency::CurrencyCode;

/// Kind of access requested on a locked rate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Shared,
    Exclusive,
}

impl Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Access::Shared => f.write_str("shared"),
            Access::Exclusive => f.write_str("exclusive"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateError {
    #[error("No rate available for currency {0}")]
    NotFound(CurrencyCode),
    #[error("Timed out after {waited:?} waiting for {access} access to the rate table")]
    Timeout { access: Access, waited: Duration },
    #[error("Invalid currency code: {0:?}")]
    InvalidCode(String),
    #[error("Invalid rate {rate} for {code}: {reason}")]
    InvalidRate {
        code: CurrencyCode,
        rate: Decimal,
        reason: &'static str,
    },
    #[error("Decimal overflow converting {amount} from {from} to {to}")]
    Overflow {
        amount: Decimal,
        from: CurrencyCode,
        to: CurrencyCode,
    },
}

pub type RateResult<T> = Result<T, RateError>;
