use std::sync::Arc;

use teloxide::{dispatching::UpdateHandler, prelude::*, utils::command::BotCommands};
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};

use common::{ControllerCommand, ControllerState, TradingMode};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Dependencies injected into every handler via `dptree`.
#[derive(Clone)]
pub struct BotDeps {
    pub command_tx: mpsc::Sender<ControllerCommand>,
    pub controller_state: Arc<RwLock<ControllerState>>,
    pub trading_mode: TradingMode,
    pub strategy_name: String,
    pub allowed_user_ids: Arc<Vec<i64>>,
}

/// Telegram bot commands exposed to the operator.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "KrxBot commands:")]
pub enum Command {
    #[command(description = "Start the trading session")]
    Start,
    #[command(description = "Stop the trading session")]
    Stop,
    #[command(description = "Show controller status")]
    Status,
    #[command(description = "Clear per-day trading state")]
    ResetDaily,
}

/// Start the Telegram bot in long-polling mode.
pub async fn start_bot(token: String, deps: BotDeps) {
    let bot = Bot::new(token);
    let deps = Arc::new(deps);

    info!("Telegram bot starting (long-polling)");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![deps])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(handle_start))
        .branch(case![Command::Stop].endpoint(handle_stop))
        .branch(case![Command::Status].endpoint(handle_status))
        .branch(case![Command::ResetDaily].endpoint(handle_reset_daily));

    Update::filter_message()
        .filter_map(|msg: Message| msg.from().map(|u| u.id))
        .filter_async(auth_filter)
        .branch(command_handler)
}

/// Silently drop messages from users not in the allowed list.
async fn auth_filter(user_id: UserId, deps: Arc<BotDeps>) -> bool {
    let uid = user_id.0 as i64;
    let allowed = deps.allowed_user_ids.contains(&uid);
    if !allowed {
        warn!(user_id = uid, "Unauthorized Telegram access attempt");
    }
    allowed
}

async fn handle_start(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let state = *deps.controller_state.read().await;
    if state == ControllerState::Running {
        bot.send_message(msg.chat.id, "Session is already running.")
            .await?;
    } else {
        let _ = deps.command_tx.send(ControllerCommand::Start).await;
        bot.send_message(msg.chat.id, "Starting trading session\u{2026}")
            .await?;
    }
    Ok(())
}

async fn handle_stop(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let state = *deps.controller_state.read().await;
    if state == ControllerState::Stopped {
        bot.send_message(msg.chat.id, "Session is already stopped.")
            .await?;
    } else {
        let _ = deps.command_tx.send(ControllerCommand::Stop).await;
        bot.send_message(msg.chat.id, "Session stopped. Open positions are kept.")
            .await?;
    }
    Ok(())
}

async fn handle_status(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let state = *deps.controller_state.read().await;
    let text = format!(
        "KrxBot Status\n\
         Session: {state}\n\
         Mode: {}\n\
         Strategy: {}",
        deps.trading_mode, deps.strategy_name
    );
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn handle_reset_daily(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let _ = deps.command_tx.send(ControllerCommand::ResetDaily).await;
    bot.send_message(msg.chat.id, "Daily state reset.").await?;
    Ok(())
}
