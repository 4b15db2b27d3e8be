pub mod breakout;
pub mod condition;
pub mod config;
pub mod crossover;
pub mod percentage;

pub use config::{SessionConfig, StrategyKind, StrategyParams};

use chrono::{NaiveDate, NaiveTime};

use common::{Candle, Position, Quote};

use crate::breakout::VolatilityBreakout;
use crate::condition::ConditionTriggered;
use crate::crossover::MovingAverageCrossover;
use crate::percentage::PercentageExit;

/// Everything a strategy may look at when evaluating one instrument.
pub struct EvalContext<'a> {
    pub code: &'a str,
    pub quote: &'a Quote,
    /// Daily candles, newest first (sorted by date by the controller).
    pub candles: &'a [Candle],
    /// Local exchange time of this evaluation.
    pub now: NaiveTime,
    pub today: NaiveDate,
}

/// Pure decision logic for one instrument at a time.
///
/// The controller decides which method runs: `evaluate_buy` only for codes
/// with no open position that were not bought today, `evaluate_sell` only for
/// held codes. Strategies own per-instrument auxiliary state privately
/// (breakout targets, crossover regimes) and mutate it as a side effect of
/// evaluation; sizing and order submission stay with the controller.
pub trait Strategy: Send {
    /// Human-readable strategy name, used in logs and notifications.
    fn name(&self) -> &str;

    /// Decide whether to buy. Returns a human-readable reason when firing.
    fn evaluate_buy(&mut self, ctx: &EvalContext<'_>) -> Option<String>;

    /// Decide whether to exit the given position.
    fn evaluate_sell(&mut self, ctx: &EvalContext<'_>, position: &Position) -> Option<String>;

    /// Clear per-trading-day state. Called once before each session's first
    /// tick. State that outlives a day (e.g. crossover regimes) stays.
    fn reset_daily(&mut self) {}
}

/// Build the configured strategy variant. The set is closed — session config
/// selects one of the four kinds, there is no open-ended registration.
pub fn build(cfg: &SessionConfig) -> Box<dyn Strategy> {
    let p = &cfg.params;
    match cfg.strategy {
        StrategyKind::Volatility => Box::new(VolatilityBreakout::new(
            p.k_value,
            cfg.hours().liquidation,
        )),
        StrategyKind::Crossover => Box::new(MovingAverageCrossover::new(
            p.short_period,
            p.long_period,
        )),
        StrategyKind::Percentage => Box::new(PercentageExit::new(
            p.take_profit_pct,
            p.stop_loss_pct,
        )),
        StrategyKind::Condition => Box::new(ConditionTriggered::new()),
    }
}
