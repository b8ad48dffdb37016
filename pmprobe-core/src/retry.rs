//! Retry policies for plain reads

/// How many times a read is attempted and how long to wait in between
pub trait RetryPolicy {
    /// Total attempts, including the first (at least 1)
    fn attempts(&self) -> u8;

    /// Delay before attempt `attempt + 1`, given the 1-based failed attempt
    fn backoff_ms(&self, attempt: u8) -> u32;
}

/// Fixed number of attempts with a fixed delay between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FixedRetry {
    pub attempts: u8,
    pub delay_ms: u32,
}

impl FixedRetry {
    /// Three attempts, 10 ms apart
    pub const PMBUS_DEFAULT: Self = Self {
        attempts: 3,
        delay_ms: 10,
    };

    pub const fn new(attempts: u8, delay_ms: u32) -> Self {
        Self { attempts, delay_ms }
    }
}

impl Default for FixedRetry {
    fn default() -> Self {
        Self::PMBUS_DEFAULT
    }
}

impl RetryPolicy for FixedRetry {
    fn attempts(&self) -> u8 {
        self.attempts.max(1)
    }

    fn backoff_ms(&self, _attempt: u8) -> u32 {
        self.delay_ms
    }
}

/// Single attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn attempts(&self) -> u8 {
        1
    }

    fn backoff_ms(&self, _attempt: u8) -> u32 {
        0
    }
}
