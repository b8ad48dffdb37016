//! pmprobe Hardware Abstraction Layer
//!
//! This crate defines the bus transport the PMBus transaction engine talks
//! to. The engine never constructs a bus itself; it is handed anything that
//! implements [`I2cBus`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  pmprobe-core (transaction engine)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pmprobe-hal (this crate - I2cBus)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  HalBus over  │       │  test doubles │
//! │ embedded-hal  │       │  (MockBus)    │
//! └───────────────┘       └───────────────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod i2c;

pub use i2c::{BusError, HalBus, I2cBus, ScanResult, MAX_SCAN_RESULTS};
