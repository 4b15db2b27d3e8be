use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use common::{
    Candle, MarketGateway, OrderResult, OrderSide, Position, Quote, Result,
};

/// Simulated account layer for paper trading.
///
/// Market data (quotes, candles, connectivity) is delegated to the inner
/// gateway; cash, holdings, and fills are simulated locally. Slippage in
/// basis points is applied against the trader on market fills.
pub struct PaperGateway<G> {
    inner: G,
    cash: RwLock<i64>,
    holdings: RwLock<HashMap<String, Position>>,
    slippage_bps: i64,
}

impl<G: MarketGateway> PaperGateway<G> {
    pub fn new(inner: G, initial_cash: i64, slippage_bps: i64) -> Self {
        info!(cash = initial_cash, slippage_bps, "paper account initialized");
        Self {
            inner,
            cash: RwLock::new(initial_cash),
            holdings: RwLock::new(HashMap::new()),
            slippage_bps,
        }
    }

    /// Fill price for an order: the limit price when given, otherwise the
    /// latest traded price with slippage against the trader.
    async fn fill_price(&self, side: OrderSide, code: &str, price: i64) -> Result<i64> {
        if price > 0 {
            return Ok(price);
        }
        let quote = self.inner.quote(code).await?;
        let slip = quote.price * self.slippage_bps / 10_000;
        Ok(match side {
            OrderSide::Buy => quote.price + slip,
            OrderSide::Sell => (quote.price - slip).max(1),
        })
    }
}

#[async_trait]
impl<G: MarketGateway> MarketGateway for PaperGateway<G> {
    async fn is_connected(&self) -> bool {
        self.inner.is_connected().await
    }

    async fn quote(&self, code: &str) -> Result<Quote> {
        self.inner.quote(code).await
    }

    async fn daily_candles(&self, code: &str, count: usize) -> Result<Vec<Candle>> {
        self.inner.daily_candles(code, count).await
    }

    async fn cash_available(&self) -> Result<i64> {
        Ok(*self.cash.read().await)
    }

    async fn holdings(&self) -> Result<Vec<Position>> {
        Ok(self.holdings.read().await.values().cloned().collect())
    }

    async fn submit_order(
        &self,
        side: OrderSide,
        code: &str,
        qty: i64,
        price: i64,
    ) -> Result<OrderResult> {
        if qty <= 0 {
            return Ok(OrderResult::Rejected("quantity must be positive".into()));
        }
        let fill = self.fill_price(side, code, price).await?;
        let notional = fill * qty;
        debug!(code, %side, qty, fill, "simulating fill");

        match side {
            OrderSide::Buy => {
                let mut cash = self.cash.write().await;
                if *cash < notional {
                    return Ok(OrderResult::Rejected(format!(
                        "insufficient simulated cash ({} < {notional})",
                        *cash
                    )));
                }
                *cash -= notional;

                let name = self
                    .inner
                    .quote(code)
                    .await
                    .map(|q| q.name)
                    .unwrap_or_default();
                self.holdings.write().await.insert(
                    code.to_string(),
                    Position {
                        code: code.to_string(),
                        name,
                        quantity: qty,
                        buy_price: fill,
                    },
                );
            }
            OrderSide::Sell => {
                let mut holdings = self.holdings.write().await;
                let Some(position) = holdings.remove(code) else {
                    return Ok(OrderResult::Rejected(format!(
                        "no simulated position in {code}"
                    )));
                };
                // Full exits only; credit whatever was actually held.
                *self.cash.write().await += fill * position.quantity;
            }
        }

        Ok(OrderResult::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    /// Inner gateway serving a fixed quote; the account side is what's
    /// under test here.
    struct FixedQuotes {
        price: i64,
    }

    #[async_trait]
    impl MarketGateway for FixedQuotes {
        async fn is_connected(&self) -> bool {
            true
        }

        async fn quote(&self, code: &str) -> Result<Quote> {
            Ok(Quote {
                code: code.to_string(),
                name: "Test Stock".into(),
                price: self.price,
                open: self.price,
                high: self.price,
                low: self.price,
                volume: 100,
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

    fn paper(price: i64, cash: i64) -> PaperGateway<FixedQuotes> {
        PaperGateway::new(FixedQuotes { price }, cash, 0)
    }

    #[tokio::test]
    async fn buy_debits_cash_and_records_position() {
        let gw = paper(1_000, 100_000);
        let result = gw.submit_order(OrderSide::Buy, "005930", 10, 1_000).await.unwrap();

        assert_eq!(result, OrderResult::Accepted);
        assert_eq!(gw.cash_available().await.unwrap(), 90_000);
        let holdings = gw.holdings().await.unwrap();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].quantity, 10);
        assert_eq!(holdings[0].buy_price, 1_000);
    }

    #[tokio::test]
    async fn sell_removes_position_and_credits_cash() {
        let gw = paper(1_000, 100_000);
        gw.submit_order(OrderSide::Buy, "005930", 10, 1_000).await.unwrap();
        let result = gw.submit_order(OrderSide::Sell, "005930", 10, 1_100).await.unwrap();

        assert_eq!(result, OrderResult::Accepted);
        assert!(gw.holdings().await.unwrap().is_empty());
        assert_eq!(gw.cash_available().await.unwrap(), 101_000);
    }

    #[tokio::test]
    async fn buy_beyond_cash_is_rejected_without_state_change() {
        let gw = paper(1_000, 5_000);
        let result = gw.submit_order(OrderSide::Buy, "005930", 10, 1_000).await.unwrap();

        assert!(matches!(result, OrderResult::Rejected(_)));
        assert_eq!(gw.cash_available().await.unwrap(), 5_000);
        assert!(gw.holdings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sell_without_position_is_rejected() {
        let gw = paper(1_000, 5_000);
        let result = gw.submit_order(OrderSide::Sell, "005930", 1, 0).await.unwrap();
        assert!(matches!(result, OrderResult::Rejected(_)));
    }

    #[tokio::test]
    async fn market_buy_fills_at_quote_with_slippage() {
        let gw = PaperGateway::new(FixedQuotes { price: 10_000 }, 1_000_000, 10);
        gw.submit_order(OrderSide::Buy, "005930", 1, 0).await.unwrap();

        let holdings = gw.holdings().await.unwrap();
        // 10 bps on 10_000 = 10 won against the buyer
        assert_eq!(holdings[0].buy_price, 10_010);
    }
}
