//! Rolling technical indicators over a close-price series.
//!
//! Every function returns a vector aligned with its input. Positions without
//! enough history (or, for forward quantities, without enough future) hold
//! `f64::NAN`.

pub mod returns;

pub mod trend {
    pub mod ma;
}

pub mod oscillator {
    pub mod rsi;
}

pub mod volatility {
    pub mod volatility;
}

pub use oscillator::rsi::{RSI_FLAT, rolling_rsi};
pub use returns::{forward_pct_change, pct_change};
pub use trend::ma::moving_average;
pub use volatility::volatility::rolling_std;
