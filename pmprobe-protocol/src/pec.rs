//! SMBus Packet Error Checking
//!
//! PEC is CRC-8 with polynomial 0x07 (x^8 + x^2 + x + 1), initial value 0,
//! MSB first. It covers every byte of a transaction as it appears on the
//! wire, including the address bytes:
//!
//! - write: `addr+W, CMD, DATA...` -> PEC appended by the master
//! - read:  `addr+W, CMD, addr+R, DATA...` -> PEC appended by the device
//!
//! The address bytes are never part of the buffers handed to the bus, so
//! the helpers below fold them in explicitly.

/// CRC-8 polynomial used by SMBus/PMBus
pub const POLYNOMIAL: u8 = 0x07;

/// Incremental CRC-8 accumulator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc8 {
    crc: u8,
}

impl Crc8 {
    /// Start a new checksum
    pub const fn new() -> Self {
        Self { crc: 0 }
    }

    /// Feed a single byte
    pub fn update_byte(&mut self, byte: u8) {
        self.crc ^= byte;
        for _ in 0..8 {
            if self.crc & 0x80 != 0 {
                self.crc = (self.crc << 1) ^ POLYNOMIAL;
            } else {
                self.crc <<= 1;
            }
        }
    }

    /// Feed a slice of bytes
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        for &byte in data {
            self.update_byte(byte);
        }
        self
    }

    /// Current checksum value
    pub fn finish(&self) -> u8 {
        self.crc
    }
}

/// CRC-8 over a byte slice
pub fn crc8(data: &[u8]) -> u8 {
    Crc8::new().update(data).finish()
}

/// Address byte for a write (R/W bit clear)
pub const fn write_address(address: u8) -> u8 {
    address << 1
}

/// Address byte for a read (R/W bit set)
pub const fn read_address(address: u8) -> u8 {
    (address << 1) | 1
}

/// PEC for a write transaction: `{addr+W, command} + payload`
pub fn write_pec(address: u8, command: u8, payload: &[u8]) -> u8 {
    Crc8::new()
        .update(&[write_address(address), command])
        .update(payload)
        .finish()
}

/// PEC sent with the command byte that opens a PEC read: `{addr+W, command}`
pub fn read_request_pec(address: u8, command: u8) -> u8 {
    write_pec(address, command, &[])
}

/// PEC the device must append to a read reply
///
/// Covers `{addr+W, command, addr+R} + data`.
pub fn read_response_pec(address: u8, command: u8, data: &[u8]) -> u8 {
    Crc8::new()
        .update(&[write_address(address), command, read_address(address)])
        .update(data)
        .finish()
}
