//! Register value reading
//!
//! Picks the transfer and decoding for a registry entry:
//!
//! | Descriptor                 | Transfer        | Result                 |
//! |----------------------------|-----------------|------------------------|
//! | 1 byte                     | `read_plain`    | `Integer`              |
//! | word, status               | `read_plain`    | `Integer` (LE)         |
//! | word, linear16             | `read_plain` x2 | `Linear` (VOUT_MODE)   |
//! | word, other                | `read_plain`    | `Linear` (linear11)    |
//! | block                      | `block_read`    | `Block`                |
//! | send byte                  | none            | `Absent`               |

use embedded_hal::delay::DelayNs;

use pmprobe_hal::I2cBus;
use pmprobe_protocol::commands::{cmd, AccessKind, CommandDescriptor, Encoding};
use pmprobe_protocol::linear::{decode_linear11, decode_linear16, vout_mode_exponent};
use pmprobe_protocol::status::{decode_status, StatusKind, StatusReport};

use crate::device::{PmbusDevice, RawReading};
use crate::error::PmbusError;
use crate::retry::RetryPolicy;

/// A register value after decoding
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodedValue {
    /// Raw unsigned value (single bytes and status words)
    Integer(u16),
    /// Scaled linear11 or linear16 value
    Linear(f32),
    /// Block register contents
    Block(RawReading),
    /// Nothing could be read
    Absent,
}

impl DecodedValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, DecodedValue::Absent)
    }
}

impl<B, D, R> PmbusDevice<B, D, R>
where
    B: I2cBus,
    D: DelayNs,
    R: RetryPolicy,
{
    /// Current linear16 exponent, read fresh from VOUT_MODE
    pub fn vout_exponent(&mut self) -> Result<i8, PmbusError> {
        let mode = self.read_plain(cmd::VOUT_MODE.code, 1)?;
        Ok(vout_mode_exponent(mode[0]))
    }

    /// Read and decode one registry entry
    ///
    /// Any failed transfer yields [`DecodedValue::Absent`].
    pub fn read_value(&mut self, command: &CommandDescriptor) -> DecodedValue {
        let result = if command.byte_len == 1 || command.access == AccessKind::ReadByte {
            self.read_plain(command.code, 1)
                .map(|data| DecodedValue::Integer(u16::from(data[0])))
        } else {
            match command.access {
                AccessKind::ReadWord => self.read_word(command),
                AccessKind::BlockRead => self
                    .block_read(command.code, usize::from(command.byte_len))
                    .map(|data| {
                        if data.is_empty() {
                            DecodedValue::Absent
                        } else {
                            DecodedValue::Block(data)
                        }
                    }),
                AccessKind::SendByte | AccessKind::ReadByte => Ok(DecodedValue::Absent),
            }
        };

        result.unwrap_or_else(|e| {
            debug!("{} unavailable: {}", command.name, e);
            DecodedValue::Absent
        })
    }

    fn read_word(&mut self, command: &CommandDescriptor) -> Result<DecodedValue, PmbusError> {
        let data = self.read_plain(command.code, 2)?;
        let (lsb, msb) = (data[0], data[1]);

        if command.is_status {
            return Ok(DecodedValue::Integer(u16::from_le_bytes([lsb, msb])));
        }

        let value = match command.encoding {
            Encoding::Linear16 => {
                let exponent = self.vout_exponent()?;
                DecodedValue::Linear(decode_linear16(u16::from_le_bytes([lsb, msb]), exponent))
            }
            Encoding::Linear11 => DecodedValue::Linear(decode_linear11(lsb, msb)),
            Encoding::Raw | Encoding::Ascii => {
                DecodedValue::Integer(u16::from_le_bytes([lsb, msb]))
            }
        };
        Ok(value)
    }

    /// Read and decode one status register
    pub fn read_status(&mut self, kind: StatusKind) -> Result<StatusReport, PmbusError> {
        let command = kind.command();
        let data = self.read_plain(command.code, usize::from(command.byte_len))?;
        decode_status(kind, &data).ok_or(PmbusError::LengthViolation {
            len: data.len(),
            max: usize::from(command.byte_len),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::FixedRetry;
    use crate::session::Session;
    use crate::testing::{MockBus, NoopDelay, Op};
    use pmprobe_hal::BusError;
    use pmprobe_protocol::REGISTRY;

    fn device(bus: MockBus) -> PmbusDevice<MockBus, NoopDelay> {
        PmbusDevice::new(
            bus,
            Session::new(0x58).unwrap(),
            NoopDelay::default(),
            FixedRetry::default(),
        )
    }

    fn commands(dev: PmbusDevice<MockBus, NoopDelay>) -> std::vec::Vec<u8> {
        dev.release()
            .0
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::ReadRegister { command, .. } => Some(*command),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_byte_register_is_integer() {
        let mut bus = MockBus::new();
        bus.reply(&[0x22]);
        let mut dev = device(bus);
        assert_eq!(dev.read_value(&cmd::PMBUS_REVISION), DecodedValue::Integer(0x22));
    }

    #[test]
    fn test_linear11_register() {
        let mut bus = MockBus::new();
        bus.reply(&[0xE8, 0xD3]);
        let mut dev = device(bus);
        assert_eq!(dev.read_value(&cmd::READ_VIN), DecodedValue::Linear(15.625));
        assert_eq!(commands(dev), [0x88]);
    }

    #[test]
    fn test_linear16_reads_vout_mode_every_time() {
        let mut bus = MockBus::new();
        // READ_VOUT, VOUT_MODE, READ_VOUT, VOUT_MODE
        bus.reply(&[0x00, 0x18])
            .reply(&[0x17])
            .reply(&[0x00, 0x18])
            .reply(&[0x18]);
        let mut dev = device(bus);

        assert_eq!(dev.read_value(&cmd::READ_VOUT), DecodedValue::Linear(12.0));
        // Exponent changed to -8 between the two reads
        assert_eq!(dev.read_value(&cmd::READ_VOUT), DecodedValue::Linear(24.0));
        assert_eq!(commands(dev), [0x8B, 0x20, 0x8B, 0x20]);
    }

    #[test]
    fn test_linear16_without_vout_mode_is_absent() {
        let mut bus = MockBus::new();
        bus.reply(&[0x00, 0x18]);
        let mut dev = device(bus);
        assert!(dev.read_value(&cmd::MFR_VOUT_MAX).is_absent());
    }

    #[test]
    fn test_status_word_is_little_endian_integer() {
        let mut bus = MockBus::new();
        bus.reply(&[0x01, 0x80]);
        let mut dev = device(bus);
        assert_eq!(dev.read_value(&cmd::STATUS_WORD), DecodedValue::Integer(0x8001));
    }

    #[test]
    fn test_block_register() {
        let mut bus = MockBus::new();
        bus.reply(b"ACME PSU");
        let mut dev = device(bus);
        match dev.read_value(&cmd::MFR_ID) {
            DecodedValue::Block(data) => assert_eq!(data.as_slice(), b"ACME PSU"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_send_byte_has_no_value() {
        let mut dev = device(MockBus::new());
        assert!(dev.read_value(&cmd::CLEAR_FAULTS).is_absent());
        assert_eq!(dev.release().0.op_count(), 0);
    }

    #[test]
    fn test_failed_read_is_absent_not_zero() {
        let mut bus = MockBus::new();
        bus.fail_read(BusError::Nack)
            .fail_read(BusError::Nack)
            .fail_read(BusError::Nack);
        let mut dev = device(bus);
        assert_eq!(dev.read_value(&cmd::READ_IOUT), DecodedValue::Absent);
    }

    #[test]
    fn test_every_registry_entry_reads_without_panicking() {
        for command in REGISTRY {
            let mut dev = device(MockBus::new());
            let _ = dev.read_value(command);
        }
    }

    #[test]
    fn test_read_status() {
        let mut bus = MockBus::new();
        bus.reply(&[0b1000_0001]);
        let mut dev = device(bus);

        let report = dev.read_status(StatusKind::Vout).unwrap();
        assert_eq!(report.value, 0x81);
        assert_eq!(report.bits.iter().filter(|b| b.active).count(), 2);
        assert_eq!(commands(dev), [0x7A]);
    }

    #[test]
    fn test_read_status_failure() {
        let mut dev = device(MockBus::new());
        assert!(dev.read_status(StatusKind::Word).is_err());
    }
}
