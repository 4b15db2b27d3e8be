use common::Position;

use crate::{EvalContext, Strategy};

/// Percentage take-profit / stop-loss exits. Buy-inert: entries come from an
/// operator or another session, this strategy only manages the way out.
pub struct PercentageExit {
    take_profit_pct: f64,
    stop_loss_pct: f64,
}

impl PercentageExit {
    pub fn new(take_profit_pct: f64, stop_loss_pct: f64) -> Self {
        Self {
            take_profit_pct,
            stop_loss_pct,
        }
    }
}

impl Strategy for PercentageExit {
    fn name(&self) -> &str {
        "percentage exit"
    }

    fn evaluate_buy(&mut self, _ctx: &EvalContext<'_>) -> Option<String> {
        None
    }

    fn evaluate_sell(&mut self, ctx: &EvalContext<'_>, position: &Position) -> Option<String> {
        if position.buy_price <= 0 {
            return None;
        }

        let rate =
            (ctx.quote.price - position.buy_price) as f64 / position.buy_price as f64 * 100.0;

        // Both boundaries are inclusive.
        if rate >= self.take_profit_pct {
            Some(format!(
                "take profit ({rate:.1}% >= {:.1}%)",
                self.take_profit_pct
            ))
        } else if rate <= self.stop_loss_pct {
            Some(format!(
                "stop loss ({rate:.1}% <= {:.1}%)",
                self.stop_loss_pct
            ))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use common::Quote;

    fn quote(price: i64) -> Quote {
        Quote {
            code: "005930".into(),
            name: "Samsung Electronics".into(),
            price,
            open: price,
            high: price,
            low: price,
            volume: 100,
            timestamp: Utc::now(),
        }
    }

    fn ctx<'a>(q: &'a Quote) -> EvalContext<'a> {
        EvalContext {
            code: "005930",
            quote: q,
            candles: &[],
            now: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            today: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        }
    }

    fn held_at(buy_price: i64) -> Position {
        Position {
            code: "005930".into(),
            name: "Samsung Electronics".into(),
            quantity: 10,
            buy_price,
        }
    }

    #[test]
    fn never_signals_buy() {
        let mut s = PercentageExit::new(5.0, -3.0);
        let q = quote(1);
        assert!(s.evaluate_buy(&ctx(&q)).is_none());
    }

    #[test]
    fn take_profit_boundary_is_inclusive() {
        let mut s = PercentageExit::new(5.0, -3.0);
        let pos = held_at(10_000);

        let q = quote(10_500); // exactly +5.0%
        let reason = s.evaluate_sell(&ctx(&q), &pos).unwrap();
        assert!(reason.contains("5.0% >= 5.0%"), "reason: {reason}");

        let q = quote(10_499); // +4.99%
        assert!(s.evaluate_sell(&ctx(&q), &pos).is_none());
    }

    #[test]
    fn stop_loss_boundary_is_inclusive() {
        let mut s = PercentageExit::new(5.0, -3.0);
        let pos = held_at(10_000);

        let q = quote(9_700); // exactly -3.0%
        let reason = s.evaluate_sell(&ctx(&q), &pos).unwrap();
        assert!(reason.contains("stop loss"), "reason: {reason}");

        let q = quote(9_701);
        assert!(s.evaluate_sell(&ctx(&q), &pos).is_none());
    }

    #[test]
    fn invalid_buy_price_never_sells() {
        let mut s = PercentageExit::new(5.0, -3.0);
        let pos = held_at(0);
        let q = quote(10_500);
        assert!(s.evaluate_sell(&ctx(&q), &pos).is_none());
    }
}
