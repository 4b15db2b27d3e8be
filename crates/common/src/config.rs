use crate::TradingMode;

/// All configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Broker bridge
    pub bridge_url: String,
    pub bridge_secret: String,
    /// WebSocket endpoint of the bridge's screening-condition feed, if any.
    pub bridge_ws_url: Option<String>,

    // Telegram
    pub telegram_token: String,
    pub telegram_chat_ids: Vec<i64>,

    // Trading
    pub trading_mode: TradingMode,
    /// Seconds between evaluation ticks.
    pub tick_interval_secs: u64,
    /// Global minimum spacing between outbound gateway calls, in milliseconds.
    /// The broker allows five requests per second.
    pub gateway_min_interval_ms: u64,
    /// Simulated starting cash for paper mode, in won.
    pub paper_cash: i64,
    /// Simulated market-order slippage for paper mode, in basis points.
    pub paper_slippage_bps: i64,

    // Session config file path
    pub session_config_path: String,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let trading_mode = match required_env("TRADING_MODE").to_lowercase().as_str() {
            "paper" => TradingMode::Paper,
            "live" => TradingMode::Live,
            other => panic!("ERROR: TRADING_MODE must be 'paper' or 'live', got: '{other}'"),
        };

        let telegram_chat_ids = required_env("TELEGRAM_CHAT_IDS")
            .split(',')
            .map(|s| {
                s.trim().parse::<i64>().unwrap_or_else(|_| {
                    panic!("TELEGRAM_CHAT_IDS contains non-numeric ID: '{}'", s.trim())
                })
            })
            .collect();

        Config {
            bridge_url: required_env("BRIDGE_URL"),
            bridge_secret: required_env("BRIDGE_SECRET"),
            bridge_ws_url: optional_env("BRIDGE_WS_URL"),
            telegram_token: required_env("TELEGRAM_TOKEN"),
            telegram_chat_ids,
            trading_mode,
            tick_interval_secs: optional_env("TICK_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            gateway_min_interval_ms: optional_env("GATEWAY_MIN_INTERVAL_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(200),
            paper_cash: optional_env("PAPER_CASH")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000_000),
            paper_slippage_bps: optional_env("PAPER_SLIPPAGE_BPS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            session_config_path: optional_env("SESSION_CONFIG_PATH")
                .unwrap_or_else(|| "config/session.toml".to_string()),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
