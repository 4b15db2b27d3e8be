use teloxide::prelude::*;
use tokio::sync::mpsc;
use tracing::warn;

use common::{OrderSide, TradeEvent};

/// Forward controller events to every configured chat until the event
/// channel closes. Call this inside a `tokio::spawn`.
pub async fn run_notifier(bot: Bot, chat_ids: Vec<ChatId>, mut event_rx: mpsc::Receiver<TradeEvent>) {
    while let Some(event) = event_rx.recv().await {
        let text = format_event(&event);
        for &chat_id in &chat_ids {
            if let Err(e) = bot.send_message(chat_id, &text).await {
                warn!(chat_id = ?chat_id, error = %e, "Failed to send Telegram notification");
            }
        }
    }
}

fn format_event(event: &TradeEvent) -> String {
    match event {
        TradeEvent::SessionStarted {
            strategy,
            watchlist_len,
        } => format!(
            "Trading session started\nStrategy: {strategy}\nWatchlist: {watchlist_len} instruments"
        ),
        TradeEvent::SessionStartFailed { error } => {
            format!("Failed to start trading session: {error}")
        }
        TradeEvent::SessionStopped => "Trading session stopped.".to_string(),
        TradeEvent::DailyReset => "Daily state reset.".to_string(),
        TradeEvent::Trade(sig) => {
            let verb = match sig.side {
                OrderSide::Buy => "Bought",
                OrderSide::Sell => "Sold",
            };
            format!(
                "{verb} {} ({}) x{} @ {}\nReason: {}",
                sig.name, sig.code, sig.qty, sig.price, sig.reason
            )
        }
        TradeEvent::OrderRejected { code, name, reason } => {
            format!("Order rejected for {name} ({code}): {reason}")
        }
        TradeEvent::SizingSkipped { code, name } => {
            format!("Signal on {name} ({code}) skipped: budget below one share")
        }
        TradeEvent::TickError { code, error } => {
            format!("Evaluation error on {code}: {error}")
        }
        TradeEvent::ConditionExited { code } => {
            format!("{code} left the screening condition")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::TradeSignal;

    #[test]
    fn trade_messages_name_the_side_and_reason() {
        let msg = format_event(&TradeEvent::Trade(TradeSignal {
            side: OrderSide::Buy,
            code: "005930".into(),
            name: "Samsung Electronics".into(),
            qty: 10,
            price: 70_000,
            reason: "breakout above 69500".into(),
        }));
        assert!(msg.starts_with("Bought Samsung Electronics (005930) x10 @ 70000"));
        assert!(msg.contains("breakout above 69500"));
    }

    #[test]
    fn rejections_carry_the_broker_reason() {
        let msg = format_event(&TradeEvent::OrderRejected {
            code: "000660".into(),
            name: "SK hynix".into(),
            reason: "insufficient margin".into(),
        });
        assert!(msg.contains("SK hynix (000660)"));
        assert!(msg.contains("insufficient margin"));
    }
}
