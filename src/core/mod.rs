//! Core business logic abstractions

pub mod config;
pub mod conversion;
pub mod currency;
pub mod error;
pub mod log;
pub mod rates;

// Re-export main types for cleaner imports
pub use conversion::ConversionService;
pub use currency::{CurrencyCode, RateEntry};
pub use error::{Access, RateError, RateResult};
pub use rates::{RateStore, StoreStrategy};
