//! Core domain types and logic.

pub mod series;
pub mod normalizer;
pub mod column_resolver;
pub mod window;
pub mod tick;
pub mod market_strength;
pub mod picks;
pub mod strength_level;
pub mod config_validation;
pub mod error;
