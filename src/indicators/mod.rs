// Technical indicator plumbing shared by the strategies

pub mod moving_average;
pub mod rsi;
pub mod window;

pub use moving_average::calculate_sma;
pub use rsi::rsi_from_averages;
pub use window::PriceWindow;
