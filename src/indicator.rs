//! Technical indicator calculators.
//!
//! Each calculator is a pure function of a close-price slice in ascending
//! chronological order and produces output aligned index-for-index with its
//! input. Warm-up handling differs per indicator and is documented on each:
//! RSI pads with a neutral value, Bollinger marks warm-up indices undefined,
//! MACD is defined from index 0.

pub mod bollinger;
pub mod ma;
pub mod macd;
pub mod rsi;
