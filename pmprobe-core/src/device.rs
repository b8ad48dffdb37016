//! PMBus transaction engine
//!
//! [`PmbusDevice`] owns the bus and performs every transfer shape the
//! probe needs:
//!
//! ```text
//! read_plain      S W │ CMD │ Sr R │ DATA... P            (retried)
//! write_plain     S W │ CMD │ DATA... P
//! send_byte       S W │ CMD P
//! block_read      S W │ CMD │ Sr R │ DATA... P            (single attempt)
//! block_write     S W │ CMD │ LEN │ DATA... P
//! read_with_pec   S W │ CMD │ PEC P   S R │ DATA... │ PEC P
//! write_with_pec  S W │ CMD │ DATA... │ PEC P
//! paged_read      S W │ 0x06 │ COUNT │ PAGE │ CMD P   S R │ 4 bytes P
//! capability      S W │ 0x1A │ CMD P   S R │ FLAG P
//! ```
//!
//! Transport faults never escape as panics: each one is logged and turned
//! into an `Err` (or `false` for the boolean write helpers).

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use pmprobe_hal::{BusError, I2cBus, ScanResult};
use pmprobe_protocol::commands::{cmd, PAGE_PLUS_READ};
use pmprobe_protocol::pec;

use crate::error::PmbusError;
use crate::retry::{FixedRetry, RetryPolicy};
use crate::session::Session;

/// Longest read the engine will perform, in data bytes
pub const MAX_READ_LEN: usize = 32;

/// Longest block write payload (the length prefix is one byte)
pub const MAX_BLOCK_LEN: usize = 255;

/// Response length of a PAGE_PLUS_READ
pub const PAGED_READ_LEN: usize = 4;

/// Command byte + length or PEC trailer + payload
const FRAME_LEN: usize = MAX_BLOCK_LEN + 2;

type Frame = Vec<u8, FRAME_LEN>;

/// Bytes returned by a successful read
pub type RawReading = Vec<u8, MAX_READ_LEN>;

/// Data for the plain and PEC write helpers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    /// Integer sent little-endian in exactly the declared number of bytes
    Int(u32),
    /// Bytes sent as-is, cut to the declared length
    Bytes(&'a [u8]),
}

impl From<u32> for Payload<'_> {
    fn from(value: u32) -> Self {
        Payload::Int(value)
    }
}

impl<'a> From<&'a [u8]> for Payload<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Payload::Bytes(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Payload<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        Payload::Bytes(bytes)
    }
}

impl<'a, const N: usize> From<&'a Vec<u8, N>> for Payload<'a> {
    fn from(bytes: &'a Vec<u8, N>) -> Self {
        Payload::Bytes(bytes)
    }
}

impl Payload<'_> {
    /// Append the wire bytes for a `len`-byte field to `out`
    fn encode_into(&self, len: usize, out: &mut Frame) -> Result<(), PmbusError> {
        let room = out.capacity() - out.len();
        match *self {
            Payload::Int(value) => {
                if len > room {
                    return Err(PmbusError::LengthViolation { len, max: room });
                }
                if len < 4 && u64::from(value) >> (8 * len) != 0 {
                    return Err(PmbusError::Encoding);
                }
                let bytes = value.to_le_bytes();
                for i in 0..len {
                    out.push(bytes.get(i).copied().unwrap_or(0))
                        .map_err(|_| PmbusError::LengthViolation { len, max: room })?;
                }
            }
            Payload::Bytes(bytes) => {
                let data = &bytes[..bytes.len().min(len)];
                out.extend_from_slice(data)
                    .map_err(|_| PmbusError::LengthViolation {
                        len: data.len(),
                        max: room,
                    })?;
            }
        }
        Ok(())
    }
}

fn transport<E: Into<BusError>>(e: E) -> PmbusError {
    PmbusError::Transport(e.into())
}

fn check_read_len(len: usize, max: usize) -> Result<(), PmbusError> {
    if len > max {
        return Err(PmbusError::LengthViolation { len, max });
    }
    Ok(())
}

fn reading(data: &[u8]) -> Result<RawReading, PmbusError> {
    RawReading::from_slice(data).map_err(|_| PmbusError::LengthViolation {
        len: data.len(),
        max: MAX_READ_LEN,
    })
}

/// Transaction engine for one PMBus device
pub struct PmbusDevice<B, D, R = FixedRetry> {
    bus: B,
    delay: D,
    retry: R,
    session: Session,
}

impl<B, D, R> PmbusDevice<B, D, R>
where
    B: I2cBus,
    D: DelayNs,
    R: RetryPolicy,
{
    pub fn new(bus: B, session: Session, delay: D, retry: R) -> Self {
        Self {
            bus,
            delay,
            retry,
            session,
        }
    }

    /// Current target
    pub fn session(&self) -> Session {
        self.session
    }

    /// Point the engine at another device
    pub fn set_session(&mut self, session: Session) {
        debug!("session -> {:#x}", session.address());
        self.session = session;
    }

    /// Give back the bus and delay
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }

    fn address(&self) -> u8 {
        self.session.address()
    }

    /// Read `len` bytes from `code`, retrying per policy
    pub fn read_plain(&mut self, code: u8, len: usize) -> Result<RawReading, PmbusError> {
        check_read_len(len, MAX_READ_LEN)?;
        let address = self.address();
        let attempts = self.retry.attempts();
        let mut buf = [0u8; MAX_READ_LEN];

        let mut attempt = 1;
        loop {
            match self.bus.read_register(address, code, &mut buf[..len]) {
                Ok(()) => return reading(&buf[..len]),
                Err(e) => {
                    let e: BusError = e.into();
                    if attempt >= attempts {
                        warn!("read {:#x}: giving up after {} attempts ({})", code, attempt, e);
                        return Err(PmbusError::Transport(e));
                    }
                    trace!("read {:#x}: attempt {} failed ({})", code, attempt, e);
                    self.delay.delay_ms(self.retry.backoff_ms(attempt));
                    attempt += 1;
                }
            }
        }
    }

    /// Write `payload` to `code` as a `len`-byte field
    pub fn write_plain<'a>(&mut self, code: u8, payload: impl Into<Payload<'a>>, len: usize) -> bool {
        let result = self.try_write_plain(code, payload.into(), len);
        if let Err(e) = result {
            error!("write {:#x} failed: {}", code, e);
        }
        result.is_ok()
    }

    fn try_write_plain(&mut self, code: u8, payload: Payload<'_>, len: usize) -> Result<(), PmbusError> {
        let mut data = Frame::new();
        payload.encode_into(len, &mut data)?;
        let address = self.address();
        self.bus
            .write_register(address, code, &data)
            .map_err(transport)
    }

    /// Send a bare command byte (e.g. CLEAR_FAULTS)
    pub fn send_byte(&mut self, code: u8) -> bool {
        let address = self.address();
        match self.bus.raw_write(address, &[code]) {
            Ok(()) => true,
            Err(e) => {
                error!("send byte {:#x} failed: {}", code, transport(e));
                false
            }
        }
    }

    /// Read `len` bytes from a block register in one attempt
    pub fn block_read(&mut self, code: u8, len: usize) -> Result<RawReading, PmbusError> {
        check_read_len(len, MAX_READ_LEN)?;
        let address = self.address();
        let mut buf = [0u8; MAX_READ_LEN];
        self.bus
            .read_register(address, code, &mut buf[..len])
            .map_err(transport)
            .inspect_err(|e| error!("block read {:#x} failed: {}", code, e))?;
        reading(&buf[..len])
    }

    /// Write a length-prefixed block
    ///
    /// Payloads longer than 255 bytes are rejected before touching the bus.
    pub fn block_write(&mut self, code: u8, payload: &[u8]) -> Result<(), PmbusError> {
        if payload.len() > MAX_BLOCK_LEN {
            error!("block write {:#x}: {} bytes is too large", code, payload.len());
            return Err(PmbusError::LengthViolation {
                len: payload.len(),
                max: MAX_BLOCK_LEN,
            });
        }

        let mut frame = Frame::new();
        // Lengths were checked above; FRAME_LEN leaves room for both prefix bytes
        let _ = frame.push(code);
        let _ = frame.push(payload.len() as u8);
        let _ = frame.extend_from_slice(payload);

        let address = self.address();
        self.bus
            .raw_write(address, &frame)
            .map_err(transport)
            .inspect_err(|e| error!("block write {:#x} failed: {}", code, e))
    }

    /// Read `len` bytes followed by a PEC byte and verify it
    ///
    /// On a mismatch the data is dropped and `PecMismatch` is returned.
    pub fn read_with_pec(&mut self, code: u8, len: usize) -> Result<RawReading, PmbusError> {
        check_read_len(len, MAX_READ_LEN)?;
        let address = self.address();
        let request = [code, pec::read_request_pec(address, code)];

        let mut buf = [0u8; MAX_READ_LEN + 1];
        let result = self
            .bus
            .raw_write(address, &request)
            .and_then(|()| self.bus.raw_read(address, &mut buf[..len + 1]))
            .map_err(transport);
        if let Err(e) = result {
            error!("PEC read {:#x} failed: {}", code, e);
            return Err(e);
        }

        let (data, received) = (&buf[..len], buf[len]);
        let expected = pec::read_response_pec(address, code, data);
        if expected != received {
            warn!(
                "PEC mismatch on {:#x}: got {:#x}, expected {:#x}",
                code, received, expected
            );
            return Err(PmbusError::PecMismatch { expected, received });
        }
        reading(data)
    }

    /// Write `payload` as a `len`-byte field with a trailing PEC byte
    pub fn write_with_pec<'a>(&mut self, code: u8, payload: impl Into<Payload<'a>>, len: usize) -> bool {
        let result = self.try_write_with_pec(code, payload.into(), len);
        if let Err(e) = result {
            error!("PEC write {:#x} failed: {}", code, e);
        }
        result.is_ok()
    }

    fn try_write_with_pec(&mut self, code: u8, payload: Payload<'_>, len: usize) -> Result<(), PmbusError> {
        let address = self.address();
        let mut frame = Frame::new();
        let _ = frame.push(code);
        payload.encode_into(len, &mut frame)?;

        // The address byte is covered by PEC but never part of the buffer
        let pec = pec::write_pec(address, code, &frame[1..]);
        frame
            .push(pec)
            .map_err(|_| PmbusError::LengthViolation { len, max: MAX_BLOCK_LEN })?;

        self.bus.raw_write(address, &frame).map_err(transport)
    }

    /// Vendor PAGE_PLUS_READ: select `page` and read `command` through it
    ///
    /// The response is always read as four bytes. A failed request write is
    /// logged and the read is still attempted.
    pub fn paged_read(
        &mut self,
        byte_count: u8,
        page: u8,
        command: u8,
    ) -> Result<[u8; PAGED_READ_LEN], PmbusError> {
        let address = self.address();
        let request = [PAGE_PLUS_READ, byte_count, page, command];
        if let Err(e) = self.bus.raw_write(address, &request) {
            warn!("PAGE_PLUS_READ request failed: {}", transport(e));
        }

        let mut response = [0u8; PAGED_READ_LEN];
        self.bus
            .raw_read(address, &mut response)
            .map_err(transport)
            .inspect_err(|e| error!("PAGE_PLUS_READ response failed: {}", e))?;
        Ok(response)
    }

    /// Ask the device whether it supports `code` via QUERY
    ///
    /// `Ok(false)` means the device answered "unsupported"; a bus failure is
    /// an `Err`.
    pub fn capability_query(&mut self, code: u8) -> Result<bool, PmbusError> {
        let address = self.address();
        let mut flag = [0u8; 1];
        self.bus
            .raw_write(address, &[cmd::QUERY.code, code])
            .and_then(|()| self.bus.raw_read(address, &mut flag))
            .map_err(transport)
            .inspect_err(|e| error!("QUERY {:#x} failed: {}", code, e))?;
        Ok(flag[0] == 1)
    }

    /// List the addresses that acknowledge on the bus
    pub fn scan(&mut self) -> Result<ScanResult, PmbusError> {
        self.bus
            .scan()
            .map_err(transport)
            .inspect_err(|e| error!("bus scan failed: {}", e))
    }
}
