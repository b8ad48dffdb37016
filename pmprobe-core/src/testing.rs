//! Scripted bus and delay for engine tests

use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use pmprobe_hal::{BusError, I2cBus, ScanResult};

/// One recorded bus operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    ReadRegister { address: u8, command: u8, len: usize },
    WriteRegister { address: u8, command: u8, data: Vec<u8> },
    RawWrite { address: u8, data: Vec<u8> },
    RawRead { address: u8, len: usize },
    Scan,
}

/// In-memory bus that replays queued results and records every call
///
/// Reads pop from `reads`, writes from `writes`. An empty read queue
/// answers with a NACK; an empty write queue succeeds.
#[derive(Debug, Default)]
pub struct MockBus {
    pub ops: Vec<Op>,
    pub reads: VecDeque<Result<Vec<u8>, BusError>>,
    pub writes: VecDeque<Result<(), BusError>>,
    pub present: Vec<u8>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&mut self, data: &[u8]) -> &mut Self {
        self.reads.push_back(Ok(data.to_vec()));
        self
    }

    pub fn fail_read(&mut self, e: BusError) -> &mut Self {
        self.reads.push_back(Err(e));
        self
    }

    pub fn fail_write(&mut self, e: BusError) -> &mut Self {
        self.writes.push_back(Err(e));
        self
    }

    /// Number of recorded operations that touched the bus
    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    fn next_read(&mut self, buf: &mut [u8]) -> Result<(), BusError> {
        let data = self.reads.pop_front().unwrap_or(Err(BusError::Nack))?;
        for (i, b) in buf.iter_mut().enumerate() {
            *b = data.get(i).copied().unwrap_or(0);
        }
        Ok(())
    }

    fn next_write(&mut self) -> Result<(), BusError> {
        self.writes.pop_front().unwrap_or(Ok(()))
    }
}

impl I2cBus for MockBus {
    type Error = BusError;

    fn read_register(&mut self, address: u8, command: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.ops.push(Op::ReadRegister {
            address,
            command,
            len: buf.len(),
        });
        self.next_read(buf)
    }

    fn write_register(&mut self, address: u8, command: u8, data: &[u8]) -> Result<(), BusError> {
        self.ops.push(Op::WriteRegister {
            address,
            command,
            data: data.to_vec(),
        });
        self.next_write()
    }

    fn raw_write(&mut self, address: u8, data: &[u8]) -> Result<(), BusError> {
        self.ops.push(Op::RawWrite {
            address,
            data: data.to_vec(),
        });
        self.next_write()
    }

    fn raw_read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.ops.push(Op::RawRead {
            address,
            len: buf.len(),
        });
        self.next_read(buf)
    }

    fn scan(&mut self) -> Result<ScanResult, BusError> {
        self.ops.push(Op::Scan);
        let mut found = ScanResult::new();
        for &address in &self.present {
            found.push(address).map_err(|_| BusError::Other)?;
        }
        Ok(found)
    }
}

/// Delay that returns immediately and remembers what it was asked for
#[derive(Debug, Default)]
pub struct NoopDelay {
    pub calls: usize,
    pub total_ms: u32,
}

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.calls += 1;
        self.total_ms += ns / 1_000_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls += 1;
        self.total_ms += ms;
    }
}
