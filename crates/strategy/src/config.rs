use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use common::{Error, MarketHours, Result};

/// Strategy variant selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Volatility breakout (Larry Williams): buy on target-price breakout,
    /// liquidate at end of day.
    Volatility,
    /// Moving-average crossover: buy on golden cross, sell on dead cross.
    Crossover,
    /// Take-profit / stop-loss percentage exits; never buys.
    Percentage,
    /// Buys driven by the external screening-condition feed.
    Condition,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::Volatility => write!(f, "volatility breakout"),
            StrategyKind::Crossover => write!(f, "moving-average crossover"),
            StrategyKind::Percentage => write!(f, "percentage exit"),
            StrategyKind::Condition => write!(f, "condition triggered"),
        }
    }
}

/// Per-session trading configuration (TOML).
///
/// Example `config/session.toml`:
/// ```toml
/// strategy = "volatility"
/// watchlist = ["005930", "000660", "035720"]
///
/// [params]
/// invest_ratio = 0.1
/// max_positions = 5
/// take_profit_pct = 5.0
/// stop_loss_pct = -3.0
/// k_value = 0.5
/// short_period = 5
/// long_period = 20
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub strategy: StrategyKind,
    /// Instrument codes evaluated in this order every tick.
    pub watchlist: Vec<String>,
    #[serde(default)]
    pub params: StrategyParams,
    /// Optional market-hours overrides as "HH:MM" strings.
    #[serde(default)]
    pub market_open: Option<String>,
    #[serde(default)]
    pub market_close: Option<String>,
    #[serde(default)]
    pub liquidation_cutoff: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyParams {
    /// Fraction of available cash committed per buy.
    pub invest_ratio: f64,
    /// Concurrent holding cap.
    pub max_positions: usize,
    /// Take-profit threshold in percent (e.g. 5.0).
    pub take_profit_pct: f64,
    /// Stop-loss threshold in percent, configured negative (e.g. -3.0).
    pub stop_loss_pct: f64,
    /// Breakout range multiplier.
    pub k_value: f64,
    /// Short moving-average window, in candles.
    pub short_period: usize,
    /// Long moving-average window, in candles.
    pub long_period: usize,
    /// Fixed share count for condition-triggered buys.
    pub condition_qty: i64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            invest_ratio: 0.1,
            max_positions: 5,
            take_profit_pct: 5.0,
            stop_loss_pct: -3.0,
            k_value: 0.5,
            short_period: 5,
            long_period: 20,
            condition_qty: 1,
        }
    }
}

impl SessionConfig {
    /// Load and validate from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read '{path}': {e}")))?;
        let cfg: SessionConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse '{path}': {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.params;
        if self.watchlist.is_empty() && self.strategy != StrategyKind::Condition {
            return Err(Error::Config("watchlist is empty".into()));
        }
        if !(p.invest_ratio > 0.0 && p.invest_ratio <= 1.0) {
            return Err(Error::Config(format!(
                "invest_ratio must be in (0, 1], got {}",
                p.invest_ratio
            )));
        }
        if p.max_positions == 0 {
            return Err(Error::Config("max_positions must be >= 1".into()));
        }
        if p.stop_loss_pct > 0.0 {
            return Err(Error::Config(format!(
                "stop_loss_pct must be <= 0, got {}",
                p.stop_loss_pct
            )));
        }
        if p.short_period == 0 || p.short_period >= p.long_period {
            return Err(Error::Config(format!(
                "moving-average periods must satisfy 0 < short < long, got {}/{}",
                p.short_period, p.long_period
            )));
        }
        if p.condition_qty <= 0 {
            return Err(Error::Config("condition_qty must be >= 1".into()));
        }
        self.hours_checked()?;
        Ok(())
    }

    /// Market hours for this session, with KRX defaults.
    /// Call after `validate()`; invalid overrides fall back to defaults.
    pub fn hours(&self) -> MarketHours {
        self.hours_checked().unwrap_or_default()
    }

    fn hours_checked(&self) -> Result<MarketHours> {
        let defaults = MarketHours::default();
        Ok(MarketHours {
            open: parse_hhmm(self.market_open.as_deref(), defaults.open)?,
            close: parse_hhmm(self.market_close.as_deref(), defaults.close)?,
            liquidation: parse_hhmm(self.liquidation_cutoff.as_deref(), defaults.liquidation)?,
        })
    }
}

fn parse_hhmm(value: Option<&str>, default: NaiveTime) -> Result<NaiveTime> {
    match value {
        None => Ok(default),
        Some(s) => NaiveTime::parse_from_str(s, "%H:%M")
            .map_err(|_| Error::Config(format!("invalid time '{s}', expected HH:MM"))),
    }
}
