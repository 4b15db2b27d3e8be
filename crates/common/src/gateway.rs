use async_trait::async_trait;

use crate::{Candle, OrderResult, OrderSide, Position, Quote, Result};

/// Abstraction over the market data / account gateway.
///
/// `BridgeClient` implements this against the local broker bridge for live
/// trading; `PaperGateway` wraps any implementation and simulates the account
/// side. The gateway may be rate-limited — callers must not assume an
/// unlimited call rate, and the engine wraps every instance in a pacing
/// decorator.
#[async_trait]
pub trait MarketGateway: Send + Sync {
    /// Whether an authenticated broker session is live.
    async fn is_connected(&self) -> bool;

    /// Latest snapshot for one instrument.
    async fn quote(&self, code: &str) -> Result<Quote>;

    /// Up to `count` daily candles, newest first.
    async fn daily_candles(&self, code: &str, count: usize) -> Result<Vec<Candle>>;

    /// Cash available for new orders, in the smallest currency unit.
    async fn cash_available(&self) -> Result<i64>;

    /// Broker-reported holdings, the authoritative position source at
    /// session start.
    async fn holdings(&self) -> Result<Vec<Position>>;

    /// Submit an order. `price == 0` requests a market order.
    ///
    /// `Ok(OrderResult::Rejected(_))` means the broker declined the order;
    /// transport failures surface as `Err`.
    async fn submit_order(
        &self,
        side: OrderSide,
        code: &str,
        qty: i64,
        price: i64,
    ) -> Result<OrderResult>;
}
