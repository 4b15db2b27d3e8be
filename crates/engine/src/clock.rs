use chrono::NaiveDateTime;

/// Source of local exchange time.
///
/// Market-hours gating and the end-of-day cutoff depend on wall-clock time;
/// injecting it keeps the controller testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Production clock: the host's local time, assumed to be exchange time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}
