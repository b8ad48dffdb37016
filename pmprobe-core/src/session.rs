//! Device session

/// Highest valid 7-bit address
pub const MAX_ADDRESS: u8 = 0x7F;

/// The device a transaction engine talks to
///
/// Chosen once, before the first transaction; the engine never changes it
/// behind the caller's back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Session {
    address: u8,
}

impl Session {
    /// Session for a 7-bit address, or `None` if it does not fit 7 bits
    pub const fn new(address: u8) -> Option<Self> {
        if address > MAX_ADDRESS {
            None
        } else {
            Some(Self { address })
        }
    }

    /// 7-bit device address
    pub const fn address(&self) -> u8 {
        self.address
    }
}
