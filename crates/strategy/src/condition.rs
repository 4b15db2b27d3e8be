use common::Position;

use crate::{EvalContext, Strategy};

/// Condition-triggered trading is purely event-reactive: buys happen on the
/// controller's screening-feed path, never from polling. Under the tick loop
/// this variant is inert on both sides.
pub struct ConditionTriggered;

impl ConditionTriggered {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConditionTriggered {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for ConditionTriggered {
    fn name(&self) -> &str {
        "condition triggered"
    }

    fn evaluate_buy(&mut self, _ctx: &EvalContext<'_>) -> Option<String> {
        None
    }

    fn evaluate_sell(&mut self, _ctx: &EvalContext<'_>, _position: &Position) -> Option<String> {
        None
    }
}
