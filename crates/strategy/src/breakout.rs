use std::collections::HashMap;

use chrono::NaiveTime;
use tracing::{debug, info};

use common::{Candle, Position};

use crate::{EvalContext, Strategy};

/// Per-code breakout state for one trading day.
///
/// `target` is armed exactly once, from the first observed quote of the day,
/// and never recomputed until the next daily reset.
#[derive(Debug, Clone)]
struct TargetPriceEntry {
    range: i64,
    target: Option<i64>,
}

/// Volatility breakout (Larry Williams).
///
/// Buy when the price breaks above `session_open + prev_range * k`; liquidate
/// unconditionally once the end-of-day cutoff is reached.
pub struct VolatilityBreakout {
    k: f64,
    cutoff: NaiveTime,
    targets: HashMap<String, TargetPriceEntry>,
}

impl VolatilityBreakout {
    pub fn new(k: f64, cutoff: NaiveTime) -> Self {
        Self {
            k,
            cutoff,
            targets: HashMap::new(),
        }
    }

    /// Most recent fully-closed candle dated before today. Candles arrive
    /// newest-first but selection is by date, not position.
    fn prev_candle<'a>(ctx: &EvalContext<'a>) -> Option<&'a Candle> {
        ctx.candles
            .iter()
            .filter(|c| c.date < ctx.today)
            .max_by_key(|c| c.date)
    }
}

impl Strategy for VolatilityBreakout {
    fn name(&self) -> &str {
        "volatility breakout"
    }

    fn evaluate_buy(&mut self, ctx: &EvalContext<'_>) -> Option<String> {
        if !self.targets.contains_key(ctx.code) {
            let prev = Self::prev_candle(ctx)?;
            let range = prev.high - prev.low;
            debug!(code = ctx.code, range, prev_date = %prev.date, "previous-day range computed");
            self.targets.insert(
                ctx.code.to_string(),
                TargetPriceEntry {
                    range,
                    target: None,
                },
            );
        }

        let entry = self.targets.get_mut(ctx.code)?;
        if entry.target.is_none() {
            // The session open is preferred; the first observed price is a
            // fallback when the gateway cannot supply the open.
            let open = if ctx.quote.open > 0 {
                ctx.quote.open
            } else {
                ctx.quote.price
            };
            let target = open + (entry.range as f64 * self.k) as i64;
            entry.target = Some(target);
            info!(code = ctx.code, target, open, "breakout target armed");
            // Arming and trading are separate observations.
            return None;
        }

        let target = entry.target?;
        if ctx.quote.price >= target {
            Some(format!("target breakout ({} >= {})", ctx.quote.price, target))
        } else {
            None
        }
    }

    fn evaluate_sell(&mut self, ctx: &EvalContext<'_>, _position: &Position) -> Option<String> {
        // Hard exit at the cutoff regardless of profit or loss.
        if ctx.now >= self.cutoff {
            Some("end-of-day liquidation".to_string())
        } else {
            None
        }
    }

    fn reset_daily(&mut self) {
        self.targets.clear();
    }
}
