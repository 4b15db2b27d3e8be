use chrono::NaiveTime;

/// Trading-session time window, in local exchange time.
///
/// `liquidation` is the earlier cutoff after which open positions are
/// force-closed regardless of strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub liquidation: NaiveTime,
}

impl Default for MarketHours {
    /// KRX regular session: 09:00–15:20, forced liquidation from 15:15.
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            close: NaiveTime::from_hms_opt(15, 20, 0).unwrap(),
            liquidation: NaiveTime::from_hms_opt(15, 15, 0).unwrap(),
        }
    }
}

impl MarketHours {
    /// Whether the market is open at `now`. Both bounds inclusive.
    pub fn is_open(&self, now: NaiveTime) -> bool {
        self.open <= now && now <= self.close
    }

    /// Whether the end-of-day liquidation window has begun.
    pub fn past_liquidation(&self, now: NaiveTime) -> bool {
        now >= self.liquidation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn open_window_is_inclusive_on_both_ends() {
        let hours = MarketHours::default();
        assert!(hours.is_open(t(9, 0)));
        assert!(hours.is_open(t(15, 20)));
        assert!(!hours.is_open(t(8, 59)));
        assert!(!hours.is_open(t(15, 21)));
    }

    #[test]
    fn liquidation_begins_at_cutoff() {
        let hours = MarketHours::default();
        assert!(!hours.past_liquidation(t(15, 14)));
        assert!(hours.past_liquidation(t(15, 15)));
        assert!(hours.past_liquidation(t(15, 19)));
    }
}
