//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads and writes the host's TOML configuration
//! in the platform-appropriate directory, supplies defaults on first run,
//! and validates the loaded values once before the rest of the system sees
//! them.

pub mod config;
