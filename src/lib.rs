//! laddertrader — bar-by-bar backtester for a ladder DCA strategy and a
//! directional-pulse trend strategy.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod logging;
