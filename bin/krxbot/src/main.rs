use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Local, NaiveTime};
use tokio::sync::{mpsc, RwLock};
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::{Config, ConditionEvent, ControllerCommand, ControllerState, TradeEvent, TradingMode};
use engine::{BridgeClient, ConditionStream, SystemClock, Throttled, TradingController};
use paper::PaperGateway;
use telegram_notify::{run_notifier, start_bot, BotDeps};

/// Daily reset fires well before the 09:00 open.
const RESET_TIME: (u32, u32) = (8, 30);

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(mode = %cfg.trading_mode, "KrxBot starting");

    let session = strategy::SessionConfig::load(&cfg.session_config_path)
        .unwrap_or_else(|e| panic!("Failed to load session config: {e}"));
    let strategy = strategy::build(&session);
    let strategy_name = strategy.name().to_string();
    info!(
        strategy = %strategy_name,
        watchlist = session.watchlist.len(),
        "Session config loaded"
    );

    // ── Gateway (injected based on TRADING_MODE) ──────────────────────────────
    let bridge = BridgeClient::new(&cfg.bridge_url, &cfg.bridge_secret);
    let min_interval = Duration::from_millis(cfg.gateway_min_interval_ms);
    let gateway: Arc<dyn common::MarketGateway> = match cfg.trading_mode {
        TradingMode::Live => {
            info!("Live trading mode — orders go to the broker bridge");
            Arc::new(Throttled::new(bridge, min_interval))
        }
        TradingMode::Paper => {
            info!(
                cash = cfg.paper_cash,
                slippage_bps = cfg.paper_slippage_bps,
                "Paper trading mode — simulated account over live market data"
            );
            Arc::new(Throttled::new(
                PaperGateway::new(bridge, cfg.paper_cash, cfg.paper_slippage_bps),
                min_interval,
            ))
        }
    };

    // ── Shared state and channels ─────────────────────────────────────────────
    let controller_state = Arc::new(RwLock::new(ControllerState::Stopped));
    let (command_tx, command_rx) = mpsc::channel::<ControllerCommand>(32);
    let (condition_tx, condition_rx) = mpsc::channel::<ConditionEvent>(128);
    let (event_tx, event_rx) = mpsc::channel::<TradeEvent>(256);

    // ── Controller ────────────────────────────────────────────────────────────
    let controller = TradingController::new(
        gateway,
        strategy,
        &session,
        Arc::new(SystemClock),
        controller_state.clone(),
        event_tx,
        Duration::from_secs(cfg.tick_interval_secs),
    );
    tokio::spawn(controller.run(command_rx, condition_rx));

    // ── Condition feed ────────────────────────────────────────────────────────
    if let Some(ws_url) = cfg.bridge_ws_url.clone() {
        tokio::spawn(ConditionStream::new(ws_url, condition_tx).run());
    } else {
        info!("BRIDGE_WS_URL not set — condition feed disabled");
        drop(condition_tx);
    }

    // ── Telegram ──────────────────────────────────────────────────────────────
    let chat_ids: Vec<teloxide::types::ChatId> = cfg
        .telegram_chat_ids
        .iter()
        .map(|&id| teloxide::types::ChatId(id))
        .collect();
    let notify_bot = teloxide::Bot::new(cfg.telegram_token.clone());
    tokio::spawn(run_notifier(notify_bot, chat_ids, event_rx));

    let bot_deps = BotDeps {
        command_tx: command_tx.clone(),
        controller_state: controller_state.clone(),
        trading_mode: cfg.trading_mode,
        strategy_name,
        allowed_user_ids: Arc::new(cfg.telegram_chat_ids.clone()),
    };
    tokio::spawn(start_bot(cfg.telegram_token.clone(), bot_deps));

    // ── Daily reset scheduler ─────────────────────────────────────────────────
    tokio::spawn(daily_reset_loop(command_tx));

    info!("All subsystems started. Waiting for shutdown signal.");
    tokio::signal::ctrl_c().await.unwrap();
    info!("Shutdown signal received. Exiting.");
}

/// Send a `ResetDaily` command every day before the market opens.
async fn daily_reset_loop(command_tx: mpsc::Sender<ControllerCommand>) {
    let reset_at = NaiveTime::from_hms_opt(RESET_TIME.0, RESET_TIME.1, 0).unwrap();
    loop {
        let now = Local::now().naive_local();
        let mut next = now.date().and_time(reset_at);
        if next <= now {
            next += ChronoDuration::days(1);
        }
        let wait = (next - now)
            .to_std()
            .unwrap_or(Duration::from_secs(60));
        tokio::time::sleep(wait).await;

        info!("Pre-open daily reset");
        if command_tx.send(ControllerCommand::ResetDaily).await.is_err() {
            return;
        }
    }
}
