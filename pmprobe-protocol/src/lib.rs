//! PMBus Protocol Layer
//!
//! This crate holds everything about PMBus that does not touch the bus:
//! the command registry, the two PMBus "linear" number formats, packet
//! error checking and the status register bit tables.
//!
//! # Wire shapes
//!
//! ```text
//! read word      S addr+W │ CMD │ Sr addr+R │ LSB │ MSB │ [PEC] P
//! write word     S addr+W │ CMD │ LSB │ MSB │ [PEC] P
//! block write    S addr+W │ CMD │ LEN │ DATA ... P
//! page plus read S addr+W │ 0x06 │ COUNT │ PAGE │ CMD P  S addr+R │ 4 bytes P
//! ```
//!
//! PEC is a CRC-8 (poly 0x07) over every byte of the transaction,
//! including the address bytes that never appear in the data buffers.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod commands;
pub mod linear;
pub mod pec;
pub mod status;

pub use commands::{
    lookup, lookup_name, AccessKind, CommandDescriptor, Encoding, PAGE_PLUS_READ, PARAMS,
    REGISTRY,
};
pub use linear::{decode_linear11, decode_linear16, vout_mode_exponent};
pub use pec::{crc8, Crc8};
pub use status::{decode_status, StatusBit, StatusKind, StatusReport};
