//! Configuration module for mcpaint
//!
//! Provides types and parsing for the `mcpaint.toml` palette configuration.

pub mod loader;
pub mod schema;

pub use loader::{default_config, find_config, load_config, parse_config, ConfigError};
pub use schema::*;
