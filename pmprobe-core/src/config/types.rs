//! Configuration type definitions
//!
//! These types represent the probe configuration read from `pmprobe.toml`.

use crate::retry::FixedRetry;
use crate::session::Session;

/// I2C bus settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusConfig {
    /// SCL frequency in Hz
    pub frequency_hz: u32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 50_000,
        }
    }
}

/// Serial console settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConsoleConfig {
    pub baudrate: u32,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self { baudrate: 115_200 }
    }
}

/// Addresses known at start-up
///
/// Either may be left unset and configured later from the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
    /// PMBus device address (7-bit)
    pub address: Option<u8>,
    /// Companion EEPROM address (7-bit)
    pub eeprom: Option<u8>,
}

impl DeviceConfig {
    /// Session for the configured PMBus address
    pub fn session(&self) -> Option<Session> {
        self.address.and_then(Session::new)
    }
}

/// Retry settings for plain reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RetryConfig {
    pub attempts: u8,
    pub delay_ms: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let d = FixedRetry::PMBUS_DEFAULT;
        Self {
            attempts: d.attempts,
            delay_ms: d.delay_ms,
        }
    }
}

impl From<RetryConfig> for FixedRetry {
    fn from(c: RetryConfig) -> Self {
        FixedRetry::new(c.attempts, c.delay_ms)
    }
}

/// Complete probe configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProbeConfig {
    pub bus: BusConfig,
    pub console: ConsoleConfig,
    pub device: DeviceConfig,
    pub retry: RetryConfig,
}
