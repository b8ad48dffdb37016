//! I2C bus abstractions
//!
//! Provides the transport trait consumed by the PMBus transaction engine,
//! plus an adapter for any `embedded-hal` 1.0 I2C master.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c, Operation};
use heapless::Vec;

/// First address probed by [`I2cBus::scan`] (0x00-0x07 are reserved)
pub const SCAN_FIRST: u8 = 0x08;

/// Last address probed by [`I2cBus::scan`] (0x78-0x7F are reserved)
pub const SCAN_LAST: u8 = 0x77;

/// Maximum number of devices a scan can report
pub const MAX_SCAN_RESULTS: usize = (SCAN_LAST - SCAN_FIRST + 1) as usize;

/// Addresses that answered a bus scan, in ascending order
pub type ScanResult = Vec<u8, MAX_SCAN_RESULTS>;

/// Errors reported by the bus transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Bus error (misplaced start/stop)
    Bus,
    /// Arbitration lost
    ArbitrationLost,
    /// NACK received (address or data)
    Nack,
    /// Overrun/underrun
    Overrun,
    /// Other error
    Other,
}

impl From<ErrorKind> for BusError {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Bus => BusError::Bus,
            ErrorKind::ArbitrationLoss => BusError::ArbitrationLost,
            ErrorKind::NoAcknowledge(_) => BusError::Nack,
            ErrorKind::Overrun => BusError::Overrun,
            _ => BusError::Other,
        }
    }
}

/// I2C bus master as seen by the PMBus transaction engine
///
/// All addresses are 7-bit. Each method is one blocking bus operation;
/// implementations must not retry internally.
pub trait I2cBus {
    /// Error type for bus operations
    type Error: Into<BusError>;

    /// Write `command` then read `buf.len()` bytes (repeated start)
    fn read_register(
        &mut self,
        address: u8,
        command: u8,
        buf: &mut [u8],
    ) -> Result<(), Self::Error>;

    /// Write `command` followed by `data` in one transfer
    fn write_register(
        &mut self,
        address: u8,
        command: u8,
        data: &[u8],
    ) -> Result<(), Self::Error>;

    /// Write `data` as-is
    fn raw_write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Read `buf.len()` bytes without writing a command first
    fn raw_read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// List the addresses that acknowledge on the bus
    fn scan(&mut self) -> Result<ScanResult, Self::Error>;
}

impl<T: I2cBus + ?Sized> I2cBus for &mut T {
    type Error = T::Error;

    fn read_register(
        &mut self,
        address: u8,
        command: u8,
        buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        T::read_register(self, address, command, buf)
    }

    fn write_register(
        &mut self,
        address: u8,
        command: u8,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        T::write_register(self, address, command, data)
    }

    fn raw_write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        T::raw_write(self, address, data)
    }

    fn raw_read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        T::raw_read(self, address, buf)
    }

    fn scan(&mut self) -> Result<ScanResult, Self::Error> {
        T::scan(self)
    }
}

/// Adapter from an `embedded-hal` I2C master to [`I2cBus`]
pub struct HalBus<T> {
    i2c: T,
}

impl<T: I2c> HalBus<T> {
    /// Wrap an `embedded-hal` I2C master
    pub fn new(i2c: T) -> Self {
        Self { i2c }
    }

    /// Release the wrapped I2C master
    pub fn release(self) -> T {
        self.i2c
    }
}

impl<T: I2c> I2cBus for HalBus<T> {
    type Error = BusError;

    fn read_register(&mut self, address: u8, command: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.i2c
            .write_read(address, &[command], buf)
            .map_err(|e| e.kind().into())
    }

    fn write_register(&mut self, address: u8, command: u8, data: &[u8]) -> Result<(), BusError> {
        // Adjacent writes in one transaction go out without a repeated start
        self.i2c
            .transaction(
                address,
                &mut [Operation::Write(&[command]), Operation::Write(data)],
            )
            .map_err(|e| e.kind().into())
    }

    fn raw_write(&mut self, address: u8, data: &[u8]) -> Result<(), BusError> {
        self.i2c.write(address, data).map_err(|e| e.kind().into())
    }

    fn raw_read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.i2c.read(address, buf).map_err(|e| e.kind().into())
    }

    fn scan(&mut self) -> Result<ScanResult, BusError> {
        let mut found = ScanResult::new();
        let mut probe = [0u8; 1];
        for address in SCAN_FIRST..=SCAN_LAST {
            if self.i2c.read(address, &mut probe).is_ok() {
                // Capacity covers the whole probed range
                let _ = found.push(address);
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorType, NoAcknowledgeSource, SevenBitAddress};

    /// Minimal embedded-hal device: answers on one address, records writes
    struct FakeI2c {
        present: u8,
        written: Vec<u8, 64>,
        reply: u8,
    }

    #[derive(Debug)]
    struct FakeError(ErrorKind);

    impl embedded_hal::i2c::Error for FakeError {
        fn kind(&self) -> ErrorKind {
            self.0
        }
    }

    impl ErrorType for FakeI2c {
        type Error = FakeError;
    }

    impl I2c<SevenBitAddress> for FakeI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if address != self.present {
                return Err(FakeError(ErrorKind::NoAcknowledge(
                    NoAcknowledgeSource::Address,
                )));
            }
            for op in operations {
                match op {
                    Operation::Write(data) => {
                        self.written.extend_from_slice(data).unwrap();
                    }
                    Operation::Read(buf) => {
                        for b in buf.iter_mut() {
                            *b = self.reply;
                        }
                    }
                }
            }
            Ok(())
        }
    }

    fn fake() -> FakeI2c {
        FakeI2c {
            present: 0x58,
            written: Vec::new(),
            reply: 0xA5,
        }
    }

    #[test]
    fn test_scan_finds_present_device() {
        let mut bus = HalBus::new(fake());
        let found = bus.scan().unwrap();
        assert_eq!(found.as_slice(), &[0x58]);
    }

    #[test]
    fn test_write_register_prefixes_command() {
        let mut bus = HalBus::new(fake());
        bus.write_register(0x58, 0x21, &[0x34, 0x12]).unwrap();
        assert_eq!(bus.release().written.as_slice(), &[0x21, 0x34, 0x12]);
    }

    #[test]
    fn test_read_register() {
        let mut bus = HalBus::new(fake());
        let mut buf = [0u8; 2];
        bus.read_register(0x58, 0x8B, &mut buf).unwrap();
        assert_eq!(buf, [0xA5, 0xA5]);
        assert_eq!(bus.release().written.as_slice(), &[0x8B]);
    }

    #[test]
    fn test_nack_maps_to_bus_error() {
        let mut bus = HalBus::new(fake());
        let mut buf = [0u8; 1];
        assert_eq!(bus.raw_read(0x10, &mut buf), Err(BusError::Nack));
    }
}
