//! Telegram surface: operator commands in, trade notifications out.

pub mod commands;
pub mod notifier;

pub use commands::{start_bot, BotDeps};
pub use notifier::run_notifier;
