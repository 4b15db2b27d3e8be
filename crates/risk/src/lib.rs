pub mod ledger;
pub mod sizer;

pub use ledger::PositionLedger;
pub use sizer::RiskSizer;
