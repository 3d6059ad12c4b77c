//! The same contract checked against every rate store strategy.

use fxcache::core::{ConversionService, CurrencyCode, RateError, RateStore, StoreStrategy};
use fxcache::store::concurrent::ConcurrentRateStore;
use fxcache::store::locked::{DEFAULT_LOCK_TIMEOUT, LockedRateStore};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;

const STRATEGIES: [StoreStrategy; 2] = [StoreStrategy::Locked, StoreStrategy::SynchronizedMap];

fn code(s: &str) -> CurrencyCode {
    s.parse().unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn seed() -> Vec<(CurrencyCode, Decimal)> {
    vec![
        (code("USD"), dec("1.63380")),
        (code("EUR"), dec("1.17")),
        (code("JPY"), dec("189.52")),
        (code("CHF"), dec("1.1234567")),
    ]
}

fn new_store(strategy: StoreStrategy, lock_timeout: Duration) -> Arc<dyn RateStore> {
    match strategy {
        StoreStrategy::Locked => {
            Arc::new(LockedRateStore::new(code("GBP"), seed(), lock_timeout).unwrap())
        }
        StoreStrategy::SynchronizedMap => {
            Arc::new(ConcurrentRateStore::new(code("GBP"), seed()).unwrap())
        }
    }
}

fn new_service(strategy: StoreStrategy) -> ConversionService {
    ConversionService::new(new_store(strategy, DEFAULT_LOCK_TIMEOUT))
}

#[test_log::test(tokio::test)]
async fn test_seeded_rates_are_returned() {
    for strategy in STRATEGIES {
        let store = new_store(strategy, DEFAULT_LOCK_TIMEOUT);
        assert_eq!(store.strategy(), strategy);

        assert_eq!(store.get(&code("GBP")).await, Ok(Decimal::ONE));
        for (currency, rate) in seed() {
            assert_eq!(store.get(&currency).await, Ok(rate), "{strategy}: {currency}");
        }
        assert_eq!(store.entries().await.unwrap().len(), 5);
    }
}

#[test_log::test(tokio::test)]
async fn test_put_replaces_and_inserts() {
    for strategy in STRATEGIES {
        let store = new_store(strategy, DEFAULT_LOCK_TIMEOUT);

        store.put(code("USD"), dec("1.25")).await.unwrap();
        store.put(code("AUD"), dec("1.95")).await.unwrap();
        assert_eq!(store.get(&code("USD")).await, Ok(dec("1.25")));
        assert_eq!(store.get(&code("AUD")).await, Ok(dec("1.95")));

        let entry = store
            .entries()
            .await
            .unwrap()
            .into_iter()
            .find(|e| e.code == code("USD"))
            .unwrap();
        assert_eq!(entry.rate, dec("1.25"));
    }
}

#[test_log::test(tokio::test)]
async fn test_invariant_violations_leave_table_unchanged() {
    for strategy in STRATEGIES {
        let store = new_store(strategy, DEFAULT_LOCK_TIMEOUT);

        for (currency, rate) in [("GBP", "1.5"), ("USD", "0"), ("EUR", "-1.17")] {
            let result = store.put(code(currency), dec(rate)).await;
            assert!(
                matches!(result, Err(RateError::InvalidRate { .. })),
                "{strategy}: put({currency}, {rate}) gave {result:?}"
            );
        }
        assert_eq!(store.get(&code("GBP")).await, Ok(Decimal::ONE));
        assert_eq!(store.get(&code("USD")).await, Ok(dec("1.63380")));
        assert_eq!(store.get(&code("EUR")).await, Ok(dec("1.17")));
    }
}

#[test_log::test(tokio::test)]
async fn test_same_currency_round_trip_is_exact() {
    for strategy in STRATEGIES {
        let service = new_service(strategy);
        let amounts = [
            "1",
            "0.01",
            "1234567.891",
            "-42.5",
            "0",
            "7922816251426433759354395033",
            "79228162514264337593543950335",
            "-0.0000000000000000000000000001",
        ];
        for amount in amounts {
            for currency in ["GBP", "USD", "EUR", "JPY", "CHF"] {
                let result = service
                    .convert(dec(amount), &code(currency), &code(currency))
                    .await
                    .unwrap();
                assert_eq!(result, dec(amount), "{strategy}: {amount} {currency}");
            }
        }
    }
}

#[test_log::test(tokio::test)]
async fn test_conversion_matches_rate_ratio() {
    for strategy in STRATEGIES {
        let service = new_service(strategy);
        let rates: Vec<(CurrencyCode, Decimal)> = seed()
            .into_iter()
            .chain([(code("GBP"), Decimal::ONE)])
            .collect();

        for (from, from_rate) in &rates {
            for (to, to_rate) in &rates {
                let amount = dec("250.75");
                let result = service.convert(amount, from, to).await.unwrap();
                assert_eq!(result, amount * *from_rate / *to_rate, "{strategy}: {from}->{to}");

                // Back again, exact up to the table's precision
                let back = service.convert(result, to, from).await.unwrap();
                assert_eq!(back.round_dp(12), amount, "{strategy}: {to}->{from}");
            }
        }
    }
}

#[test_log::test(tokio::test)]
async fn test_missing_arguments_return_no_result() {
    for strategy in STRATEGIES {
        let service = new_service(strategy);

        let none_amount = service
            .get_converted_amount(None, Some("GBP"), Some("USD"))
            .await;
        let none_from = service
            .get_converted_amount(Some(Decimal::ONE), None, Some("USD"))
            .await;
        let none_to = service
            .get_converted_amount(Some(Decimal::ONE), Some("GBP"), None)
            .await;
        assert_eq!(none_amount, Ok(None));
        assert_eq!(none_from, Ok(None));
        assert_eq!(none_to, Ok(None));

        let converted = service
            .get_converted_amount(Some(dec("16.338")), Some("GBP"), Some("USD"))
            .await;
        assert_eq!(converted, Ok(Some(dec("10"))));
    }
}

#[test_log::test(tokio::test)]
async fn test_unknown_currency_is_not_found() {
    for strategy in STRATEGIES {
        let service = new_service(strategy);

        let result = service
            .get_converted_amount(Some(Decimal::ONE), Some("GBP"), Some("XYZ"))
            .await;
        assert_eq!(result, Err(RateError::NotFound(code("XYZ"))));

        let result = service
            .get_converted_amount(Some(Decimal::ONE), Some("QQQ"), Some("XYZ"))
            .await;
        assert_eq!(result, Err(RateError::NotFound(code("QQQ"))));
    }
}

#[test_log::test(tokio::test)]
async fn test_update_visible_to_next_conversion() {
    for strategy in STRATEGIES {
        let service = new_service(strategy);

        let before = service
            .convert(Decimal::TEN, &code("EUR"), &code("GBP"))
            .await
            .unwrap();
        assert_eq!(before, dec("11.7"));

        service.store().put(code("EUR"), dec("1.2")).await.unwrap();
        let after = service
            .convert(Decimal::TEN, &code("EUR"), &code("GBP"))
            .await
            .unwrap();
        assert_eq!(after, dec("12"));
    }
}

/// Readers hammer one entry while a single `put` replaces it. Every observed value
/// must be the old or the new one, and every read that starts after the `put`
/// returned must see the new value.
async fn readers_during_single_put(strategy: StoreStrategy) {
    const READERS: usize = 16;

    let old = dec("1.63380");
    let new = dec("1.70015");
    // A bound no test machine should hit, so only torn reads could fail the run
    let store = new_store(strategy, Duration::from_secs(5));
    let written = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let store = Arc::clone(&store);
            let written = Arc::clone(&written);
            tokio::spawn(async move {
                let mut reads_after_put = 0;
                for _ in 0..2_000 {
                    let put_done = written.load(Ordering::SeqCst);
                    let rate = store.get(&code("USD")).await.unwrap();
                    assert!(rate == old || rate == new, "torn read: {rate}");
                    if put_done {
                        assert_eq!(rate, new, "stale read after put completed");
                        reads_after_put += 1;
                    }
                    tokio::task::yield_now().await;
                }
                reads_after_put
            })
        })
        .collect();

    tokio::task::yield_now().await;
    store.put(code("USD"), new).await.unwrap();
    written.store(true, Ordering::SeqCst);

    let mut reads_after_put = 0;
    for reader in readers {
        reads_after_put += reader.await.unwrap();
    }
    info!(%strategy, reads_after_put, "Concurrent readers finished");
    assert_eq!(store.get(&code("USD")).await, Ok(new));
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_locked_readers_during_single_put() {
    readers_during_single_put(StoreStrategy::Locked).await;
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_synchronized_map_readers_during_single_put() {
    readers_during_single_put(StoreStrategy::SynchronizedMap).await;
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_locked_store_serves_readers_between_writes() {
    let store = Arc::new(
        LockedRateStore::new(code("GBP"), seed(), Duration::from_millis(100)).unwrap(),
    );
    let service = ConversionService::new(store.clone());

    // Back-to-back puts from several tasks never hold the lock for 100ms
    let writers: Vec<_> = (0..4)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                for n in 0..200u32 {
                    let rate = Decimal::new(16338 + i64::from(n % 7) + i, 4);
                    store.put(code("USD"), rate).await.unwrap();
                }
            })
        })
        .collect();

    for _ in 0..200 {
        let result = service.convert(Decimal::ONE, &code("GBP"), &code("USD")).await;
        assert!(result.is_ok(), "unexpected failure: {result:?}");
    }
    for writer in writers {
        writer.await.unwrap();
    }
}
