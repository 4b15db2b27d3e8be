use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use common::{Candle, MarketGateway, OrderResult, OrderSide, Position, Quote, Result};

/// Rate-limit decorator enforcing a global minimum spacing between outbound
/// gateway calls.
///
/// The broker throttles at the wire level, so all calls share one pacing
/// state regardless of caller. Calls are delayed, never dropped.
pub struct Throttled<G> {
    inner: G,
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl<G: MarketGateway> Throttled<G> {
    pub fn new(inner: G, min_interval: Duration) -> Self {
        Self {
            inner,
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Sleep until the minimum spacing since the previous call has elapsed,
    /// then claim the slot. Holding the lock across the sleep serializes
    /// concurrent callers.
    async fn pace(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl<G: MarketGateway> MarketGateway for Throttled<G> {
    async fn is_connected(&self) -> bool {
        self.pace().await;
        self.inner.is_connected().await
    }

    async fn quote(&self, code: &str) -> Result<Quote> {
        self.pace().await;
        self.inner.quote(code).await
    }

    async fn daily_candles(&self, code: &str, count: usize) -> Result<Vec<Candle>> {
        self.pace().await;
        self.inner.daily_candles(code, count).await
    }

    async fn cash_available(&self) -> Result<i64> {
        self.pace().await;
        self.inner.cash_available().await
    }

    async fn holdings(&self) -> Result<Vec<Position>> {
        self.pace().await;
        self.inner.holdings().await
    }

    async fn submit_order(
        &self,
        side: OrderSide,
        code: &str,
        qty: i64,
        price: i64,
    ) -> Result<OrderResult> {
        self.pace().await;
        self.inner.submit_order(side, code, qty, price).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGateway {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketGateway for CountingGateway {
        async fn is_connected(&self) -> bool {
            true
        }

        async fn quote(&self, code: &str) -> Result<Quote> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Quote {
                code: code.to_string(),
                name: String::new(),
                price: 100,
                open: 100,
                high: 100,
                low: 100,
                volume: 0,
                timestamp: Utc::now(),
            })
        }

        async fn daily_candles(&self, _code: &str, _count: usize) -> Result<Vec<Candle>> {
            Ok(Vec::new())
        }

        async fn cash_available(&self) -> Result<i64> {
            Ok(0)
        }

        async fn holdings(&self) -> Result<Vec<Position>> {
            Ok(Vec::new())
        }

        async fn submit_order(
            &self,
            _side: OrderSide,
            _code: &str,
            _qty: i64,
            _price: i64,
        ) -> Result<OrderResult> {
            Ok(OrderResult::Accepted)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_calls_are_spaced_by_the_minimum_interval() {
        let gw = Throttled::new(
            CountingGateway {
                calls: AtomicUsize::new(0),
            },
            Duration::from_millis(200),
        );

        let started = Instant::now();
        gw.quote("005930").await.unwrap();
        gw.quote("005930").await.unwrap();
        gw.quote("005930").await.unwrap();

        // First call is immediate; the next two wait 200ms each.
        assert!(started.elapsed() >= Duration::from_millis(400));
        assert_eq!(gw.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_out_calls_are_not_delayed() {
        let gw = Throttled::new(
            CountingGateway {
                calls: AtomicUsize::new(0),
            },
            Duration::from_millis(200),
        );

        gw.quote("005930").await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        let started = Instant::now();
        gw.quote("005930").await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(10));
    }
}
