//! Core domain types and logic.

pub mod ohlcv;
pub mod price_series;
pub mod error;
pub mod indicator;
pub mod market_filter;
pub mod order;
pub mod order_book;
pub mod trade;
pub mod portfolio;
pub mod execution;
pub mod config;
pub mod engine;
pub mod trend_engine;
pub mod metrics;
pub mod sweep;
pub mod backtest;
