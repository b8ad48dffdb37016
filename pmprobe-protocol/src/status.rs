//! Status register bit tables
//!
//! Each status register kind has a fixed table of the bits this device
//! family defines. Decoding walks the table, so bits the table does not
//! name never show up in a report.

use heapless::Vec;

use crate::commands::{cmd, CommandDescriptor};

/// One table entry: bit position and label
pub type BitLabel = (u8, &'static str);

/// Status registers with a bit table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusKind {
    Word,
    Vout,
    Iout,
    Input,
    Temperature,
    Fans12,
    Other,
}

const STATUS_WORD_BITS: &[BitLabel] = &[
    (15, "VOUT"),
    (14, "IOUT/POUT"),
    (13, "INPUT"),
    (12, "MFR"),
    (11, "POWER_GOOD#"),
    (10, "FANS"),
    (9, "OTHER"),
    (8, "UNKNOWN"),
    (7, "BUSY"),
    (6, "OFF"),
    (5, "VOUT_OV"),
    (4, "IOUT_OC"),
    (3, "VIN_UV"),
    (2, "TEMPERATURE"),
    (1, "CML"),
    (0, "NONE OF THE ABOVE"),
];

const STATUS_VOUT_BITS: &[BitLabel] = &[
    (7, "VOUT Over voltage Fault"),
    (6, "VOUT Over voltage Warning"),
    (5, "VOUT Under voltage Warning"),
    (4, "VOUT Under voltage Fault"),
    (3, "VOUT_MAX Warning"),
    (2, "TON_MAX_FAULT"),
    (1, "TOFF_MAX Warning"),
    (0, "VOUT Tracking Error"),
];

const STATUS_IOUT_BITS: &[BitLabel] = &[
    (7, "IOUT Over current Fault"),
    (6, "IOUT OC + LV Shutdown Fault"),
    (5, "IOUT Over current Warning"),
    (4, "IOUT Undercurrent Fault"),
    (3, "Current Share Fault"),
    (2, "Power Limiting"),
    (1, "POUT Overpower Fault"),
    (0, "POUT Overpower Warning"),
];

const STATUS_INPUT_BITS: &[BitLabel] = &[
    (7, "VIN Over voltage Fault"),
    (6, "VIN Over voltage Warning"),
    (5, "VIN Under voltage Warning"),
    (4, "VIN Under voltage Fault"),
    (3, "Unit Off - Low Input"),
    (2, "IIN Over current Fault"),
    (1, "IIN Over current Warning"),
    (0, "PIN Overpower Warning"),
];

const STATUS_TEMPERATURE_BITS: &[BitLabel] = &[
    (7, "Over temperature Fault"),
    (6, "Over temperature Warning"),
    (5, "Under temperature Warning"),
    (4, "Under temperature Fault"),
];

const STATUS_FANS_1_2_BITS: &[BitLabel] = &[
    (7, "Fan 1 Fault"),
    (6, "Fan 2 Fault"),
    (5, "Fan 1 Warning"),
    (4, "Fan 2 Warning"),
    (3, "Fan 1 Speed Overridden"),
    (2, "Fan 2 Speed Overridden"),
    (1, "Airflow Fault"),
    (0, "Airflow Warning"),
];

const STATUS_OTHER_BITS: &[BitLabel] = &[
    (5, "Input A Fuse Fault"),
    (4, "Input B Fuse Fault"),
    (3, "Input A OR-ing Fault"),
    (2, "Input B OR-ing Fault"),
    (1, "Output OR-ing Fault"),
];

impl StatusKind {
    /// All kinds, in the order the console reports them
    pub const ALL: [StatusKind; 7] = [
        StatusKind::Word,
        StatusKind::Vout,
        StatusKind::Iout,
        StatusKind::Input,
        StatusKind::Temperature,
        StatusKind::Fans12,
        StatusKind::Other,
    ];

    /// Register this kind is read from
    pub fn command(self) -> &'static CommandDescriptor {
        match self {
            StatusKind::Word => &cmd::STATUS_WORD,
            StatusKind::Vout => &cmd::STATUS_VOUT,
            StatusKind::Iout => &cmd::STATUS_IOUT,
            StatusKind::Input => &cmd::STATUS_INPUT,
            StatusKind::Temperature => &cmd::STATUS_TEMPERATURE,
            StatusKind::Fans12 => &cmd::STATUS_FANS_1_2,
            StatusKind::Other => &cmd::STATUS_OTHER,
        }
    }

    /// Register name
    pub fn name(self) -> &'static str {
        self.command().name
    }

    /// Bit table, most significant bit first
    pub fn bits(self) -> &'static [BitLabel] {
        match self {
            StatusKind::Word => STATUS_WORD_BITS,
            StatusKind::Vout => STATUS_VOUT_BITS,
            StatusKind::Iout => STATUS_IOUT_BITS,
            StatusKind::Input => STATUS_INPUT_BITS,
            StatusKind::Temperature => STATUS_TEMPERATURE_BITS,
            StatusKind::Fans12 => STATUS_FANS_1_2_BITS,
            StatusKind::Other => STATUS_OTHER_BITS,
        }
    }
}

/// One decoded status bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusBit {
    pub bit: u8,
    pub label: &'static str,
    pub active: bool,
}

/// Decoded status register
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    pub kind: StatusKind,
    /// Raw register value (little-endian for word registers)
    pub value: u16,
    /// Defined bits in table order
    pub bits: Vec<StatusBit, 16>,
}

/// Decode raw register bytes against a kind's bit table
///
/// One byte is an 8-bit value, two or more bytes a little-endian 16-bit
/// value (extra bytes are ignored). Returns `None` for an empty reading.
pub fn decode_status(kind: StatusKind, raw: &[u8]) -> Option<StatusReport> {
    let value = match raw {
        [] => return None,
        [byte] => u16::from(*byte),
        [lsb, msb, ..] => u16::from_le_bytes([*lsb, *msb]),
    };

    let mut bits = Vec::new();
    for &(bit, label) in kind.bits() {
        let active = (value >> bit) & 1 != 0;
        // Tables hold at most 16 entries
        let _ = bits.push(StatusBit { bit, label, active });
    }

    Some(StatusReport { kind, value, bits })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_vout_first_and_last_bit() {
        let report = decode_status(StatusKind::Vout, &[0b1000_0001]).unwrap();
        assert_eq!(report.value, 0x81);
        assert_eq!(report.bits.len(), 8);

        for b in &report.bits {
            let expected = b.bit == 7 || b.bit == 0;
            assert_eq!(b.active, expected, "bit {}", b.bit);
        }
        assert_eq!(report.bits[0].label, "VOUT Over voltage Fault");
        assert_eq!(report.bits[7].label, "VOUT Tracking Error");
    }

    #[test]
    fn test_status_word_is_little_endian() {
        // LSB 0x01 (NONE OF THE ABOVE), MSB 0x80 (VOUT)
        let report = decode_status(StatusKind::Word, &[0x01, 0x80]).unwrap();
        assert_eq!(report.value, 0x8001);
        let active: heapless::Vec<u8, 16> =
            report.bits.iter().filter(|b| b.active).map(|b| b.bit).collect();
        assert_eq!(active.as_slice(), &[15, 0]);
    }

    #[test]
    fn test_undefined_bits_are_omitted() {
        // STATUS_OTHER defines bits 5..1 only
        let report = decode_status(StatusKind::Other, &[0xFF]).unwrap();
        assert_eq!(report.bits.len(), 5);
        assert!(report.bits.iter().all(|b| b.active));
        assert!(report.bits.iter().all(|b| b.bit != 0 && b.bit < 6));
    }

    #[test]
    fn test_temperature_upper_nibble_only() {
        let report = decode_status(StatusKind::Temperature, &[0x0F]).unwrap();
        assert_eq!(report.bits.len(), 4);
        assert!(report.bits.iter().all(|b| !b.active));
    }

    #[test]
    fn test_empty_reading() {
        assert!(decode_status(StatusKind::Iout, &[]).is_none());
    }

    #[test]
    fn test_kinds_map_to_status_registers() {
        for kind in StatusKind::ALL {
            let command = kind.command();
            assert!(command.is_status);
            // Every table bit fits in the register
            let width = command.byte_len * 8;
            assert!(kind.bits().iter().all(|(bit, _)| *bit < width));
        }
    }

    #[test]
    fn test_status_byte_has_no_table() {
        assert!(StatusKind::ALL
            .iter()
            .all(|kind| kind.command().code != cmd::STATUS_BYTE.code));
    }
}
