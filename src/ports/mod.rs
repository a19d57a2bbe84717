//! Port traits at the I/O seams of the engine.

pub mod config_port;
pub mod history_port;
pub mod symbol_source;
