pub mod bridge;
pub mod clock;
pub mod controller;
pub mod throttle;

pub use bridge::{BridgeClient, ConditionStream};
pub use clock::{Clock, SystemClock};
pub use controller::TradingController;
pub use throttle::Throttled;
