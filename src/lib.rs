//! marketscore: market strength scoring and buy/sell pick selection over a
//! directory of per-symbol price CSV files.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
pub mod logging;
