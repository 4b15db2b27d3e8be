use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time price snapshot for one instrument.
///
/// All monetary fields are integers in the smallest currency unit; Korean
/// equities quote in whole won, so no fixed-point type is needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub code: String,
    pub name: String,
    /// Latest traded price.
    pub price: i64,
    /// Today's session open. `0` when the gateway cannot supply it; consumers
    /// fall back to the first observed price.
    pub open: i64,
    pub high: i64,
    pub low: i64,
    pub volume: i64,
    pub timestamp: DateTime<Utc>,
}

/// One daily OHLCV bar. Gateways deliver these newest-first, but consumers
/// must order by `date` explicitly rather than by position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: i64,
    pub high: i64,
    pub low: i64,
    pub close: i64,
    pub volume: i64,
}

/// Side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Gateway verdict on a submitted order. A `Rejected` result must leave all
/// trading state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderResult {
    Accepted,
    Rejected(String),
}

/// A currently held instrument. Exists only while quantity > 0; the ledger
/// keeps at most one per code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub code: String,
    pub name: String,
    pub quantity: i64,
    pub buy_price: i64,
}

/// The decision unit the controller emits toward execution and notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSignal {
    pub side: OrderSide,
    pub code: String,
    pub name: String,
    pub qty: i64,
    pub price: i64,
    pub reason: String,
}

/// Whether orders go to the real broker bridge or a local simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    Live,
    Paper,
}

impl std::fmt::Display for TradingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradingMode::Live => write!(f, "live"),
            TradingMode::Paper => write!(f, "paper"),
        }
    }
}

/// Current state of the trading controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ControllerState {
    #[default]
    Stopped,
    Running,
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerState::Stopped => write!(f, "stopped"),
            ControllerState::Running => write!(f, "running"),
        }
    }
}

/// Commands sent to the controller via its command channel.
#[derive(Debug, Clone)]
pub enum ControllerCommand {
    Start,
    Stop,
    ResetDaily,
}

/// Membership event from the external screening feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ConditionEvent {
    Entered { code: String },
    Exited { code: String },
}

/// Events emitted by the controller toward the notification sinks.
/// Delivery is best-effort and must never block a tick.
#[derive(Debug, Clone)]
pub enum TradeEvent {
    SessionStarted {
        strategy: String,
        watchlist_len: usize,
    },
    SessionStartFailed {
        error: String,
    },
    SessionStopped,
    DailyReset,
    Trade(TradeSignal),
    OrderRejected {
        code: String,
        name: String,
        reason: String,
    },
    SizingSkipped {
        code: String,
        name: String,
    },
    TickError {
        code: String,
        error: String,
    },
    ConditionExited {
        code: String,
    },
}
