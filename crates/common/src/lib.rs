pub mod config;
pub mod error;
pub mod gateway;
pub mod hours;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use gateway::MarketGateway;
pub use hours::MarketHours;
pub use types::*;
