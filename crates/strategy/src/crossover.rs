use std::collections::HashMap;

use tracing::debug;

use common::{Candle, Position};

use crate::{EvalContext, Strategy};

/// Market regime derived from comparing two moving averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Regime {
    Bullish,
    Bearish,
}

/// Moving-average crossover.
///
/// Buys exactly on the golden cross (bearish regime flipping bullish) and
/// sells exactly on the dead cross, never while a regime merely persists.
/// Regimes survive the daily reset; only the flip matters.
pub struct MovingAverageCrossover {
    short: usize,
    long: usize,
    regimes: HashMap<String, Regime>,
}

impl MovingAverageCrossover {
    pub fn new(short: usize, long: usize) -> Self {
        assert!(
            short > 0 && short < long,
            "crossover periods must satisfy 0 < short < long"
        );
        Self {
            short,
            long,
            regimes: HashMap::new(),
        }
    }

    /// Simple arithmetic mean of the `n` most recent closes.
    fn sma(candles: &[Candle], n: usize) -> f64 {
        candles[..n].iter().map(|c| c.close as f64).sum::<f64>() / n as f64
    }

    /// Update the stored regime for `code` and report the transition.
    /// Returns `None` (and leaves the regime untouched) with insufficient
    /// history, so the edge is still detected once enough candles exist.
    fn observe(&mut self, code: &str, candles: &[Candle]) -> Option<Transition> {
        if candles.len() < self.long {
            return None;
        }
        let short_ma = Self::sma(candles, self.short);
        let long_ma = Self::sma(candles, self.long);
        let current = if short_ma > long_ma {
            Regime::Bullish
        } else {
            Regime::Bearish
        };
        let previous = self.regimes.insert(code.to_string(), current);
        debug!(code, ?previous, ?current, short_ma, long_ma, "regime observed");
        Some(Transition {
            previous,
            current,
            short_ma,
            long_ma,
        })
    }
}

struct Transition {
    previous: Option<Regime>,
    current: Regime,
    short_ma: f64,
    long_ma: f64,
}

impl Strategy for MovingAverageCrossover {
    fn name(&self) -> &str {
        "moving-average crossover"
    }

    fn evaluate_buy(&mut self, ctx: &EvalContext<'_>) -> Option<String> {
        let t = self.observe(ctx.code, ctx.candles)?;
        if t.previous == Some(Regime::Bearish) && t.current == Regime::Bullish {
            Some(format!(
                "golden cross (MA{} {:.0} > MA{} {:.0})",
                self.short, t.short_ma, self.long, t.long_ma
            ))
        } else {
            None
        }
    }

    fn evaluate_sell(&mut self, ctx: &EvalContext<'_>, _position: &Position) -> Option<String> {
        let t = self.observe(ctx.code, ctx.candles)?;
        if t.previous == Some(Regime::Bullish) && t.current == Regime::Bearish {
            Some(format!(
                "dead cross (MA{} {:.0} <= MA{} {:.0})",
                self.short, t.short_ma, self.long, t.long_ma
            ))
        } else {
            None
        }
    }
}
