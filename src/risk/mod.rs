// Order sizing from account balances and risk parameters
pub mod position_sizer;

pub use position_sizer::PositionSizer;
