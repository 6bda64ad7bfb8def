//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads and writes the client's TOML configuration
//! in the platform-appropriate directory and validates it once at startup.

pub mod config;
