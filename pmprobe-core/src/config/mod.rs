//! Probe configuration
//!
//! Types plus a small parser for the `pmprobe.toml` subset the firmware
//! embeds at build time.

pub mod parser;
pub mod types;

pub use parser::{parse_config, ParseError};
pub use types::*;
