use proptest::prelude::*;
use risk::{PositionLedger, RiskSizer};

proptest! {
    /// The sized order never spends more than the configured fraction of cash.
    #[test]
    fn order_never_exceeds_budget(
        cash in 0i64..10_000_000_000,
        price in 1i64..10_000_000,
        ratio in 0.01f64..1.0f64,
    ) {
        let sizer = RiskSizer::new(ratio, 5);
        let qty = sizer.order_qty(cash, price);

        prop_assert!(qty >= 0);
        // Integer floor: cost stays within the f64-truncated budget.
        prop_assert!(qty * price <= (cash as f64 * ratio) as i64);
    }

    /// Sizing is a no-op exactly when one more share is unaffordable.
    #[test]
    fn zero_qty_iff_price_above_budget(
        cash in 1i64..1_000_000_000,
        price in 1i64..10_000_000,
        ratio in 0.01f64..1.0f64,
    ) {
        let sizer = RiskSizer::new(ratio, 5);
        let qty = sizer.order_qty(cash, price);
        let budget = (cash as f64 * ratio) as i64;

        prop_assert_eq!(qty == 0, budget < price);
    }

    /// Any interleaving of confirmed buys and sells keeps the ledger within
    /// the position cap and free of duplicate codes, when every buy is gated
    /// by `can_open` the way the controller gates it.
    #[test]
    fn ledger_respects_cap_under_random_trade_sequences(
        ops in prop::collection::vec((0u8..2, 0usize..8), 1..64),
        max_positions in 1usize..6,
    ) {
        let sizer = RiskSizer::new(0.1, max_positions);
        let mut ledger = PositionLedger::new();

        for (op, idx) in ops {
            let code = format!("{idx:06}");
            if op == 0 {
                if sizer.can_open(ledger.open_count()) && !ledger.is_held(&code) {
                    ledger.record_buy(&code, "stock", 1, 1000);
                }
            } else {
                ledger.record_sell(&code);
            }
            prop_assert!(ledger.open_count() <= max_positions);
        }
    }
}
