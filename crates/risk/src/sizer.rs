use serde::{Deserialize, Serialize};

/// Order sizing and the concurrent-position cap.
///
/// Applied by the controller before any buy reaches the gateway; strategies
/// never size their own orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSizer {
    /// Fraction of available cash committed per buy, in (0, 1].
    pub invest_ratio: f64,
    /// Maximum number of simultaneously held instruments.
    pub max_positions: usize,
}

impl RiskSizer {
    pub fn new(invest_ratio: f64, max_positions: usize) -> Self {
        Self {
            invest_ratio,
            max_positions,
        }
    }

    /// Shares to buy: `floor(cash * invest_ratio / price)`.
    ///
    /// A result of 0 is a sizing no-op, not an error — the caller skips the
    /// order and emits a warning.
    pub fn order_qty(&self, cash_available: i64, price: i64) -> i64 {
        if price <= 0 || cash_available <= 0 {
            return 0;
        }
        let budget = (cash_available as f64 * self.invest_ratio) as i64;
        budget / price
    }

    /// Whether a new position may be opened given the current held count.
    pub fn can_open(&self, held_count: usize) -> bool {
        held_count < self.max_positions
    }
}
