//! Client for the local broker bridge: REST for quotes, account state and
//! orders, WebSocket for the screening-condition feed.

mod rest;
mod stream;

pub use rest::BridgeClient;
pub use stream::ConditionStream;
