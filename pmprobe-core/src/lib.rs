//! Board-agnostic core logic for the PMBus probe firmware
//!
//! This crate contains everything that talks to a PMBus device but does
//! not depend on a particular microcontroller:
//!
//! - Transaction engine (plain, block, PEC and paged transfers)
//! - Retry policy and device session
//! - Register value dispatch (linear11, linear16, status, blocks)
//! - Probe configuration and its minimal TOML parser
//! - Line-oriented console

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod console;
pub mod device;
pub mod error;
pub mod monitor;
pub mod retry;
pub mod session;

#[cfg(test)]
mod testing;

pub use device::{Payload, PmbusDevice, RawReading, MAX_BLOCK_LEN, MAX_READ_LEN};
pub use error::PmbusError;
pub use monitor::DecodedValue;
pub use retry::{FixedRetry, NoRetry, RetryPolicy};
pub use session::Session;
