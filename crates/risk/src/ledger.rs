use std::collections::{HashMap, HashSet};

use tracing::info;

use common::Position;

/// In-memory record of held positions and the bought-today guard.
///
/// Mutations happen only after the gateway confirms an order — never
/// optimistically. One position per code, full exits only.
#[derive(Debug, Default)]
pub struct PositionLedger {
    positions: HashMap<String, Position>,
    bought_today: HashSet<String>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a confirmed buy: inserts the position and marks the code as
    /// bought today, blocking further buy evaluation until the daily reset.
    pub fn record_buy(&mut self, code: &str, name: &str, qty: i64, price: i64) {
        self.positions.insert(
            code.to_string(),
            Position {
                code: code.to_string(),
                name: name.to_string(),
                quantity: qty,
                buy_price: price,
            },
        );
        self.bought_today.insert(code.to_string());
        info!(code, qty, price, "position opened");
    }

    /// Record a confirmed full exit. The code stays in the bought-today set
    /// so a closed instrument is not re-entered the same day.
    pub fn record_sell(&mut self, code: &str) -> Option<Position> {
        let removed = self.positions.remove(code);
        if let Some(p) = &removed {
            info!(code, qty = p.quantity, "position closed");
        }
        removed
    }

    /// Replace all positions with the gateway-reported truth. Used only at
    /// session start.
    pub fn load_from_gateway(&mut self, holdings: Vec<Position>) {
        self.positions = holdings
            .into_iter()
            .filter(|p| p.quantity > 0)
            .map(|p| (p.code.clone(), p))
            .collect();
        info!(count = self.positions.len(), "holdings reconciled from gateway");
    }

    /// Clear the bought-today guard. Positions persist across the reset.
    pub fn reset_daily(&mut self) {
        self.bought_today.clear();
    }

    pub fn is_held(&self, code: &str) -> bool {
        self.positions.contains_key(code)
    }

    pub fn bought_today(&self, code: &str) -> bool {
        self.bought_today.contains(code)
    }

    pub fn get(&self, code: &str) -> Option<&Position> {
        self.positions.get(code)
    }

    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_marks_held_and_bought_today() {
        let mut ledger = PositionLedger::new();
        ledger.record_buy("005930", "Samsung Electronics", 10, 70_000);

        assert!(ledger.is_held("005930"));
        assert!(ledger.bought_today("005930"));
        assert_eq!(ledger.open_count(), 1);
        assert_eq!(ledger.get("005930").unwrap().quantity, 10);
    }

    #[test]
    fn rebuy_of_same_code_never_duplicates() {
        let mut ledger = PositionLedger::new();
        ledger.record_buy("005930", "Samsung Electronics", 10, 70_000);
        ledger.record_buy("005930", "Samsung Electronics", 5, 71_000);
        assert_eq!(ledger.open_count(), 1);
    }

    #[test]
    fn sell_removes_position_but_keeps_daily_guard() {
        let mut ledger = PositionLedger::new();
        ledger.record_buy("005930", "Samsung Electronics", 10, 70_000);
        let removed = ledger.record_sell("005930").unwrap();

        assert_eq!(removed.quantity, 10);
        assert!(!ledger.is_held("005930"));
        assert!(ledger.bought_today("005930"));
    }

    #[test]
    fn reset_daily_clears_guard_only() {
        let mut ledger = PositionLedger::new();
        ledger.record_buy("005930", "Samsung Electronics", 10, 70_000);
        ledger.reset_daily();

        assert!(!ledger.bought_today("005930"));
        assert!(ledger.is_held("005930"));
    }

    #[test]
    fn load_from_gateway_replaces_wholesale_and_drops_empty() {
        let mut ledger = PositionLedger::new();
        ledger.record_buy("005930", "Samsung Electronics", 10, 70_000);

        ledger.load_from_gateway(vec![
            Position {
                code: "000660".into(),
                name: "SK hynix".into(),
                quantity: 3,
                buy_price: 130_000,
            },
            Position {
                code: "035720".into(),
                name: "Kakao".into(),
                quantity: 0,
                buy_price: 40_000,
            },
        ]);

        assert!(!ledger.is_held("005930"));
        assert!(ledger.is_held("000660"));
        assert!(!ledger.is_held("035720"));
        assert_eq!(ledger.open_count(), 1);
    }
}
