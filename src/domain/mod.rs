//! Core domain types and logic.

pub mod asset;
pub mod candle;
pub mod error;
pub mod fluctuations;
pub mod optimizer;
pub mod portfolio;
pub mod position;
pub mod session;
pub mod split;
pub mod stats;
pub mod strategy;
pub mod timeframe;
