//! Transaction errors

use core::fmt;

use pmprobe_hal::BusError;

/// Failure of a PMBus transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PmbusError {
    /// The bus transfer itself failed
    Transport(BusError),
    /// Reply checksum did not match; the data was discarded
    PecMismatch { expected: u8, received: u8 },
    /// Payload or requested read is longer than allowed
    LengthViolation { len: usize, max: usize },
    /// Integer payload does not fit the declared byte length
    Encoding,
}

impl From<BusError> for PmbusError {
    fn from(e: BusError) -> Self {
        PmbusError::Transport(e)
    }
}

impl fmt::Display for PmbusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PmbusError::Transport(e) => write!(f, "bus error ({:?})", e),
            PmbusError::PecMismatch { expected, received } => write!(
                f,
                "PEC mismatch (expected 0x{:02X}, got 0x{:02X})",
                expected, received
            ),
            PmbusError::LengthViolation { len, max } => {
                write!(f, "length {} exceeds {}", len, max)
            }
            PmbusError::Encoding => f.write_str("value does not fit length"),
        }
    }
}
