use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::sync::{mpsc, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use common::{
    Candle, ConditionEvent, ControllerCommand, ControllerState, Error, MarketGateway,
    MarketHours, OrderResult, OrderSide, Quote, Result, TradeEvent, TradeSignal,
};
use risk::{PositionLedger, RiskSizer};
use strategy::{EvalContext, SessionConfig, Strategy, StrategyKind};

use crate::clock::Clock;

/// Daily candles fetched per instrument. Raised when the configured
/// long moving-average window needs more history.
const DEFAULT_CANDLE_DEPTH: usize = 30;

/// The scheduling and orchestration loop.
///
/// One task owns all mutable trading state: the ledger, the candle cache,
/// and the strategy's private state. Tick-driven evaluation, condition-feed
/// buys, and the daily reset all arrive through the same `select!`, so they
/// can never interleave over the ledger.
pub struct TradingController {
    gateway: Arc<dyn MarketGateway>,
    strategy: Box<dyn Strategy>,
    sizer: RiskSizer,
    ledger: PositionLedger,
    watchlist: Vec<String>,
    hours: MarketHours,
    /// Fixed share count for condition-feed buys; `None` disables the path.
    condition_qty: Option<i64>,
    candle_depth: usize,
    candle_cache: HashMap<String, Vec<Candle>>,
    clock: Arc<dyn Clock>,
    state: Arc<RwLock<ControllerState>>,
    event_tx: mpsc::Sender<TradeEvent>,
    tick_interval: Duration,
}

impl TradingController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gateway: Arc<dyn MarketGateway>,
        strategy: Box<dyn Strategy>,
        session: &SessionConfig,
        clock: Arc<dyn Clock>,
        state: Arc<RwLock<ControllerState>>,
        event_tx: mpsc::Sender<TradeEvent>,
        tick_interval: Duration,
    ) -> Self {
        let params = &session.params;
        Self {
            gateway,
            strategy,
            sizer: RiskSizer::new(params.invest_ratio, params.max_positions),
            ledger: PositionLedger::new(),
            watchlist: session.watchlist.clone(),
            hours: session.hours(),
            condition_qty: (session.strategy == StrategyKind::Condition)
                .then_some(params.condition_qty),
            candle_depth: DEFAULT_CANDLE_DEPTH.max(params.long_period + 1),
            candle_cache: HashMap::new(),
            clock,
            state,
            event_tx,
            tick_interval,
        }
    }

    /// Run the controller loop. Call from `tokio::spawn`.
    ///
    /// Ticks fire on a fixed period with `MissedTickBehavior::Skip`: a tick
    /// due while the previous one is still executing is skipped, never run
    /// concurrently.
    pub async fn run(
        mut self,
        mut command_rx: mpsc::Receiver<ControllerCommand>,
        mut condition_rx: mpsc::Receiver<ConditionEvent>,
    ) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut condition_open = true;

        info!("controller initialized in stopped state, waiting for start command");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if *self.state.read().await == ControllerState::Running {
                        self.tick().await;
                    }
                }

                cmd = command_rx.recv() => match cmd {
                    Some(ControllerCommand::Start) => {
                        if *self.state.read().await == ControllerState::Running {
                            info!("controller already running");
                        } else if let Err(e) = self.start().await {
                            error!(error = %e, "failed to start trading session");
                            self.emit(TradeEvent::SessionStartFailed {
                                error: e.to_string(),
                            });
                        }
                    }
                    Some(ControllerCommand::Stop) => self.stop().await,
                    Some(ControllerCommand::ResetDaily) => self.reset_daily(),
                    None => {
                        warn!("command channel closed — controller shutting down");
                        break;
                    }
                },

                ev = condition_rx.recv(), if condition_open => match ev {
                    Some(ev) => self.on_condition(ev).await,
                    None => condition_open = false,
                },
            }
        }
    }

    /// Begin a trading session: validate the gateway session, warm the candle
    /// cache, and reconcile positions with broker-reported holdings.
    pub async fn start(&mut self) -> Result<()> {
        if !self.gateway.is_connected().await {
            return Err(Error::NotConnected);
        }

        self.load_candles().await;

        let holdings = self.gateway.holdings().await?;
        self.ledger.load_from_gateway(holdings);

        *self.state.write().await = ControllerState::Running;
        info!(
            strategy = self.strategy.name(),
            watchlist = self.watchlist.len(),
            positions = self.ledger.open_count(),
            "trading session started"
        );
        self.emit(TradeEvent::SessionStarted {
            strategy: self.strategy.name().to_string(),
            watchlist_len: self.watchlist.len(),
        });
        Ok(())
    }

    /// Halt ticking. Broker-side orders and the in-memory ledger are left
    /// untouched; positions remain visible until the process exits.
    pub async fn stop(&mut self) {
        *self.state.write().await = ControllerState::Stopped;
        info!("trading session stopped");
        self.emit(TradeEvent::SessionStopped);
    }

    /// Clear all per-trading-day state: the bought-today guard, the candle
    /// cache, and strategy daily state (breakout targets). Runs on the same
    /// task as ticks, so it can never interleave with one.
    pub fn reset_daily(&mut self) {
        self.ledger.reset_daily();
        self.candle_cache.clear();
        self.strategy.reset_daily();
        info!("daily state reset");
        self.emit(TradeEvent::DailyReset);
    }

    /// One evaluation pass over the watchlist, in list order.
    ///
    /// No gateway traffic happens outside market hours; the window is
    /// re-checked on every tick. A failure for one instrument is contained:
    /// logged, emitted, and the pass continues with the next code.
    pub async fn tick(&mut self) {
        let now = self.clock.now();
        if !self.hours.is_open(now.time()) {
            return;
        }

        for code in self.watchlist.clone() {
            if let Err(e) = self.evaluate(&code, now).await {
                warn!(code, error = %e, "instrument evaluation failed");
                self.emit(TradeEvent::TickError {
                    code,
                    error: e.to_string(),
                });
            }
        }
    }

    /// Handle one screening-feed event. Entries trigger an immediate
    /// fixed-size buy when condition auto-buy is configured; exits are only
    /// reported.
    pub async fn on_condition(&mut self, event: ConditionEvent) {
        match event {
            ConditionEvent::Entered { code } => {
                let Some(qty) = self.condition_qty else {
                    info!(code, "condition entry observed (auto-buy disabled)");
                    return;
                };
                if *self.state.read().await != ControllerState::Running {
                    return;
                }
                if !self.hours.is_open(self.clock.now().time()) {
                    debug!(code, "condition entry outside market hours, ignored");
                    return;
                }
                if self.ledger.bought_today(&code) || self.ledger.is_held(&code) {
                    return;
                }
                if !self.sizer.can_open(self.ledger.open_count()) {
                    debug!(code, "position cap reached, condition entry ignored");
                    return;
                }
                if let Err(e) = self.condition_buy(&code, qty).await {
                    warn!(code, error = %e, "condition buy failed");
                    self.emit(TradeEvent::TickError {
                        code,
                        error: e.to_string(),
                    });
                }
            }
            ConditionEvent::Exited { code } => {
                // Exits never auto-sell; positions unwind via the tick path.
                info!(code, "condition exit observed");
                self.emit(TradeEvent::ConditionExited { code });
            }
        }
    }

    /// Current ledger view, for status reporting.
    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    async fn evaluate(&mut self, code: &str, now: NaiveDateTime) -> Result<()> {
        let quote = self.gateway.quote(code).await?;
        if quote.price <= 0 {
            debug!(code, price = quote.price, "non-positive quote, skipping");
            return Ok(());
        }

        // Ledger membership decides which side runs; never both.
        if self.ledger.is_held(code) {
            self.evaluate_sell(code, &quote, now).await
        } else {
            self.evaluate_buy(code, &quote, now).await
        }
    }

    async fn evaluate_buy(&mut self, code: &str, quote: &Quote, now: NaiveDateTime) -> Result<()> {
        if self.ledger.bought_today(code) {
            return Ok(());
        }
        // Cheaper short-circuit: the cap check precedes the strategy call.
        if !self.sizer.can_open(self.ledger.open_count()) {
            debug!(code, "position cap reached, buy evaluation skipped");
            return Ok(());
        }

        self.ensure_candles(code).await?;
        let reason = {
            let ctx = EvalContext {
                code,
                quote,
                candles: self
                    .candle_cache
                    .get(code)
                    .map(|c| c.as_slice())
                    .unwrap_or(&[]),
                now: now.time(),
                today: now.date(),
            };
            self.strategy.evaluate_buy(&ctx)
        };
        let Some(reason) = reason else {
            return Ok(());
        };

        let cash = self.gateway.cash_available().await?;
        let qty = self.sizer.order_qty(cash, quote.price);
        if qty <= 0 {
            // A sizing no-op, not a failure: the opportunity is skipped.
            warn!(code, name = %quote.name, cash, price = quote.price, "buy sized to zero");
            self.emit(TradeEvent::SizingSkipped {
                code: code.to_string(),
                name: quote.name.clone(),
            });
            return Ok(());
        }

        self.submit_buy(code, &quote.name, qty, quote.price, reason)
            .await
    }

    async fn evaluate_sell(&mut self, code: &str, quote: &Quote, now: NaiveDateTime) -> Result<()> {
        let Some(position) = self.ledger.get(code).cloned() else {
            return Ok(());
        };

        // Candles are best-effort on the sell side: exits driven by price or
        // the clock must not be blocked by a failed history fetch.
        if let Err(e) = self.ensure_candles(code).await {
            debug!(code, error = %e, "candle fetch failed during sell evaluation");
        }

        let reason = {
            let ctx = EvalContext {
                code,
                quote,
                candles: self
                    .candle_cache
                    .get(code)
                    .map(|c| c.as_slice())
                    .unwrap_or(&[]),
                now: now.time(),
                today: now.date(),
            };
            self.strategy.evaluate_sell(&ctx, &position)
        };

        // Past the cutoff every open position is force-closed, whatever the
        // strategy said. A strategy-specific reason wins when both apply.
        let reason = reason.or_else(|| {
            self.hours
                .past_liquidation(now.time())
                .then(|| "end-of-day liquidation".to_string())
        });
        let Some(reason) = reason else {
            return Ok(());
        };

        match self
            .gateway
            .submit_order(OrderSide::Sell, code, position.quantity, 0)
            .await?
        {
            OrderResult::Accepted => {
                self.ledger.record_sell(code);
                let signal = TradeSignal {
                    side: OrderSide::Sell,
                    code: code.to_string(),
                    name: position.name.clone(),
                    qty: position.quantity,
                    price: quote.price,
                    reason,
                };
                info!(code, name = %signal.name, qty = signal.qty, price = signal.price,
                      reason = %signal.reason, "sell executed");
                self.emit(TradeEvent::Trade(signal));
            }
            OrderResult::Rejected(r) => {
                warn!(code, reason = %r, "sell order rejected");
                self.emit(TradeEvent::OrderRejected {
                    code: code.to_string(),
                    name: position.name.clone(),
                    reason: r,
                });
            }
        }
        Ok(())
    }

    async fn condition_buy(&mut self, code: &str, qty: i64) -> Result<()> {
        let quote = self.gateway.quote(code).await?;
        if quote.price <= 0 {
            return Err(Error::DataUnavailable(format!(
                "no usable quote for {code}"
            )));
        }
        self.submit_buy(
            code,
            &quote.name,
            qty,
            quote.price,
            "screening condition entry".to_string(),
        )
        .await
    }

    /// Submit a market buy; only a confirmed acceptance mutates the ledger.
    async fn submit_buy(
        &mut self,
        code: &str,
        name: &str,
        qty: i64,
        price: i64,
        reason: String,
    ) -> Result<()> {
        match self
            .gateway
            .submit_order(OrderSide::Buy, code, qty, 0)
            .await?
        {
            OrderResult::Accepted => {
                self.ledger.record_buy(code, name, qty, price);
                let signal = TradeSignal {
                    side: OrderSide::Buy,
                    code: code.to_string(),
                    name: name.to_string(),
                    qty,
                    price,
                    reason,
                };
                info!(code, name, qty, price, reason = %signal.reason, "buy executed");
                self.emit(TradeEvent::Trade(signal));
            }
            OrderResult::Rejected(r) => {
                warn!(code, name, reason = %r, "buy order rejected");
                self.emit(TradeEvent::OrderRejected {
                    code: code.to_string(),
                    name: name.to_string(),
                    reason: r,
                });
            }
        }
        Ok(())
    }

    async fn load_candles(&mut self) {
        for code in self.watchlist.clone() {
            if let Err(e) = self.ensure_candles(&code).await {
                warn!(code, error = %e, "failed to load daily candles");
                self.emit(TradeEvent::TickError {
                    code,
                    error: e.to_string(),
                });
            }
        }
    }

    /// Fetch and cache candles for `code`, sorted newest-first by date —
    /// an explicit ordering, never the gateway's positional one.
    async fn ensure_candles(&mut self, code: &str) -> Result<()> {
        if self.candle_cache.contains_key(code) {
            return Ok(());
        }
        let mut candles = self.gateway.daily_candles(code, self.candle_depth).await?;
        candles.sort_by(|a, b| b.date.cmp(&a.date));
        self.candle_cache.insert(code.to_string(), candles);
        Ok(())
    }

    /// Best-effort notification. `try_send` keeps a full or closed sink from
    /// ever blocking or failing a tick.
    fn emit(&self, event: TradeEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            warn!(error = %e, "notification event dropped");
        }
    }
}
