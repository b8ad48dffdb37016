//! PMBus command registry
//!
//! Every command the probe knows about is a [`CommandDescriptor`] constant
//! in [`cmd`], collected into [`REGISTRY`]. Adding a command means adding a
//! constant and a registry entry; nothing else dispatches on command codes.

/// How a command moves data on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessKind {
    /// Command byte only, no payload
    SendByte,
    /// One data byte
    ReadByte,
    /// Two data bytes, little-endian
    ReadWord,
    /// Fixed-size block of data bytes
    BlockRead,
}

/// How the payload of a command is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Encoding {
    /// Unsigned integer (little-endian) or opaque bytes
    Raw,
    /// PMBus linear11: exponent carried in the word itself
    Linear11,
    /// PMBus linear16: exponent taken from VOUT_MODE
    Linear16,
    /// Printable text (manufacturer strings)
    Ascii,
}

/// Static description of one PMBus command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandDescriptor {
    /// Command code on the wire
    pub code: u8,
    /// Display name (PMBus mnemonic)
    pub name: &'static str,
    /// Payload size in bytes (0 for send-byte commands)
    pub byte_len: u8,
    /// Bus access kind
    pub access: AccessKind,
    /// Status registers decode as bit fields, never as linear values
    pub is_status: bool,
    /// Payload interpretation
    pub encoding: Encoding,
}

impl CommandDescriptor {
    /// Send-byte command (no payload)
    pub const fn send_byte(code: u8, name: &'static str) -> Self {
        Self {
            code,
            name,
            byte_len: 0,
            access: AccessKind::SendByte,
            is_status: false,
            encoding: Encoding::Raw,
        }
    }

    /// Single byte register, read as an integer
    pub const fn read_byte(code: u8, name: &'static str) -> Self {
        Self {
            code,
            name,
            byte_len: 1,
            access: AccessKind::ReadByte,
            is_status: false,
            encoding: Encoding::Raw,
        }
    }

    /// Word register carrying a linear11 value
    pub const fn read_word(code: u8, name: &'static str) -> Self {
        Self {
            code,
            name,
            byte_len: 2,
            access: AccessKind::ReadWord,
            is_status: false,
            encoding: Encoding::Linear11,
        }
    }

    /// Fixed-length block register
    pub const fn block_read(code: u8, name: &'static str, byte_len: u8) -> Self {
        Self {
            code,
            name,
            byte_len,
            access: AccessKind::BlockRead,
            is_status: false,
            encoding: Encoding::Raw,
        }
    }

    /// Mark as a status register (raw integer, bit-field decoded)
    pub const fn status(mut self) -> Self {
        self.is_status = true;
        self.encoding = Encoding::Raw;
        self
    }

    /// Mark as an output-voltage quantity (linear16 + VOUT_MODE)
    pub const fn linear16(mut self) -> Self {
        self.encoding = Encoding::Linear16;
        self
    }

    /// Mark as printable text
    pub const fn ascii(mut self) -> Self {
        self.encoding = Encoding::Ascii;
        self
    }

    /// Check that `byte_len` agrees with `access`
    pub const fn is_consistent(&self) -> bool {
        match self.access {
            AccessKind::SendByte => self.byte_len == 0,
            AccessKind::ReadByte => self.byte_len == 1,
            AccessKind::ReadWord => self.byte_len == 2,
            AccessKind::BlockRead => self.byte_len > 0,
        }
    }
}

/// Vendor extended read: `{0x06, count, page, command}` then a 4-byte reply
pub const PAGE_PLUS_READ: u8 = 0x06;

/// PMBus command descriptors
pub mod cmd {
    use super::CommandDescriptor as C;

    // Basic commands
    pub const CLEAR_FAULTS: C = C::send_byte(0x03, "CLEAR_FAULTS");
    pub const CAPABILITY: C = C::read_byte(0x19, "CAPABILITY");
    pub const QUERY: C = C::block_read(0x1A, "QUERY", 1);
    pub const VOUT_MODE: C = C::read_byte(0x20, "VOUT_MODE");

    // Fault / warning limits
    pub const VOUT_OV_FAULT_LIMIT: C = C::read_word(0x40, "VOUT_OV_FAULT_LIMIT").linear16();
    pub const VOUT_UV_FAULT_LIMIT: C = C::read_word(0x44, "VOUT_UV_FAULT_LIMIT").linear16();
    pub const IOUT_OC_FAULT_LIMIT: C = C::read_word(0x46, "IOUT_OC_FAULT_LIMIT");
    pub const IOUT_OC_WARN_LIMIT: C = C::read_word(0x4A, "IOUT_OC_WARN_LIMIT");
    pub const OT_FAULT_LIMIT: C = C::read_word(0x4F, "OT_FAULT_LIMIT");
    pub const OT_WARN_LIMIT: C = C::read_word(0x51, "OT_WARN_LIMIT");
    pub const VIN_OV_FAULT_LIMIT: C = C::read_word(0x55, "VIN_OV_FAULT_LIMIT");
    pub const VIN_OV_WARN_LIMIT: C = C::read_word(0x57, "VIN_OV_WARN_LIMIT");
    pub const VIN_UV_WARN_LIMIT: C = C::read_word(0x58, "VIN_UV_WARN_LIMIT");
    pub const VIN_UV_FAULT_LIMIT: C = C::read_word(0x59, "VIN_UV_FAULT_LIMIT");

    // Status registers
    pub const STATUS_BYTE: C = C::read_byte(0x78, "STATUS_BYTE").status();
    pub const STATUS_WORD: C = C::read_word(0x79, "STATUS_WORD").status();
    pub const STATUS_VOUT: C = C::read_byte(0x7A, "STATUS_VOUT").status();
    pub const STATUS_IOUT: C = C::read_byte(0x7B, "STATUS_IOUT").status();
    pub const STATUS_INPUT: C = C::read_byte(0x7C, "STATUS_INPUT").status();
    pub const STATUS_TEMPERATURE: C = C::read_byte(0x7D, "STATUS_TEMPERATURE").status();
    pub const STATUS_OTHER: C = C::read_byte(0x7F, "STATUS_OTHER").status();
    pub const STATUS_FANS_1_2: C = C::read_byte(0x81, "STATUS_FANS_1_2").status();

    // Telemetry
    pub const READ_VIN_TYPE: C = C::read_byte(0x80, "READ_VIN_TYPE");
    pub const READ_VSB_OUT: C = C::read_word(0x84, "READ_VSB_OUT").linear16();
    pub const READ_ISB_OUT: C = C::read_word(0x85, "READ_ISB_OUT");
    pub const READ_EIN: C = C::block_read(0x86, "READ_EIN", 6);
    pub const READ_EOUT: C = C::block_read(0x87, "READ_EOUT", 6);
    pub const READ_VIN: C = C::read_word(0x88, "READ_VIN");
    pub const READ_IIN: C = C::read_word(0x89, "READ_IIN");
    pub const READ_VOUT: C = C::read_word(0x8B, "READ_VOUT").linear16();
    pub const READ_IOUT: C = C::read_word(0x8C, "READ_IOUT");
    pub const READ_TEMPERATURE_1: C = C::read_word(0x8D, "READ_TEMPERATURE_1");
    pub const READ_TEMPERATURE_2: C = C::read_word(0x8E, "READ_TEMPERATURE_2");
    pub const READ_TEMPERATURE_3: C = C::read_word(0x8F, "READ_TEMPERATURE_3");
    pub const READ_FAN_SPEED_1: C = C::read_word(0x90, "READ_FAN_SPEED_1");
    pub const READ_POUT: C = C::read_word(0x96, "READ_POUT");
    pub const READ_PIN: C = C::read_word(0x97, "READ_PIN");
    pub const READ_LSB: C = C::read_word(0xB2, "READ_LSB");
    pub const READ_PSON: C = C::read_byte(0xB3, "READ_PSON");
    pub const READ_CRB: C = C::read_byte(0xB4, "READ_CRB");
    pub const READ_VINOK: C = C::read_byte(0xB5, "READ_VINOK");
    pub const READ_ALERT: C = C::read_byte(0xB7, "READ_ALERT");
    pub const READ_ADDR: C = C::read_byte(0xB8, "READ_ADDR");
    pub const READ_FAN_DUTY: C = C::read_word(0xBB, "READ_FAN_DUTY");

    // Manufacturer specific
    pub const PMBUS_REVISION: C = C::read_byte(0x98, "PMBUS_REVISION");
    pub const MFR_ID: C = C::block_read(0x99, "MFR_ID", 8).ascii();
    pub const MFR_MODEL: C = C::block_read(0x9A, "MFR_MODEL", 15).ascii();
    pub const MFR_REVISION: C = C::block_read(0x9B, "MFR_REVISION", 6).ascii();
    pub const MFR_VIN_MIN: C = C::read_word(0xA0, "MFR_VIN_MIN");
    pub const MFR_VIN_MAX: C = C::read_word(0xA1, "MFR_VIN_MAX");
    pub const MFR_VOUT_MIN: C = C::read_word(0xA4, "MFR_VOUT_MIN").linear16();
    pub const MFR_VOUT_MAX: C = C::read_word(0xA5, "MFR_VOUT_MAX").linear16();
    pub const MFR_IOUT_MAX: C = C::read_word(0xA6, "MFR_IOUT_MAX");
}

/// Every known command, in code order
pub static REGISTRY: &[CommandDescriptor] = &[
    cmd::CLEAR_FAULTS,
    cmd::CAPABILITY,
    cmd::QUERY,
    cmd::VOUT_MODE,
    cmd::VOUT_OV_FAULT_LIMIT,
    cmd::VOUT_UV_FAULT_LIMIT,
    cmd::IOUT_OC_FAULT_LIMIT,
    cmd::IOUT_OC_WARN_LIMIT,
    cmd::OT_FAULT_LIMIT,
    cmd::OT_WARN_LIMIT,
    cmd::VIN_OV_FAULT_LIMIT,
    cmd::VIN_OV_WARN_LIMIT,
    cmd::VIN_UV_WARN_LIMIT,
    cmd::VIN_UV_FAULT_LIMIT,
    cmd::STATUS_BYTE,
    cmd::STATUS_WORD,
    cmd::STATUS_VOUT,
    cmd::STATUS_IOUT,
    cmd::STATUS_INPUT,
    cmd::STATUS_TEMPERATURE,
    cmd::STATUS_OTHER,
    cmd::READ_VIN_TYPE,
    cmd::STATUS_FANS_1_2,
    cmd::READ_VSB_OUT,
    cmd::READ_ISB_OUT,
    cmd::READ_EIN,
    cmd::READ_EOUT,
    cmd::READ_VIN,
    cmd::READ_IIN,
    cmd::READ_VOUT,
    cmd::READ_IOUT,
    cmd::READ_TEMPERATURE_1,
    cmd::READ_TEMPERATURE_2,
    cmd::READ_TEMPERATURE_3,
    cmd::READ_FAN_SPEED_1,
    cmd::READ_POUT,
    cmd::READ_PIN,
    cmd::PMBUS_REVISION,
    cmd::MFR_ID,
    cmd::MFR_MODEL,
    cmd::MFR_REVISION,
    cmd::MFR_VIN_MIN,
    cmd::MFR_VIN_MAX,
    cmd::MFR_VOUT_MIN,
    cmd::MFR_VOUT_MAX,
    cmd::MFR_IOUT_MAX,
    cmd::READ_LSB,
    cmd::READ_PSON,
    cmd::READ_CRB,
    cmd::READ_VINOK,
    cmd::READ_ALERT,
    cmd::READ_ADDR,
    cmd::READ_FAN_DUTY,
];

/// Commands polled by the console `params` command, in display order
pub static PARAMS: &[CommandDescriptor] = &[
    cmd::VOUT_OV_FAULT_LIMIT,
    cmd::VOUT_UV_FAULT_LIMIT,
    cmd::IOUT_OC_FAULT_LIMIT,
    cmd::IOUT_OC_WARN_LIMIT,
    cmd::OT_FAULT_LIMIT,
    cmd::OT_WARN_LIMIT,
    cmd::VIN_OV_FAULT_LIMIT,
    cmd::VIN_OV_WARN_LIMIT,
    cmd::VIN_UV_WARN_LIMIT,
    cmd::VIN_UV_FAULT_LIMIT,
    cmd::READ_VIN,
    cmd::READ_IIN,
    cmd::READ_VOUT,
    cmd::READ_IOUT,
    cmd::READ_TEMPERATURE_1,
    cmd::READ_TEMPERATURE_2,
    cmd::READ_TEMPERATURE_3,
    cmd::READ_FAN_SPEED_1,
    cmd::READ_POUT,
    cmd::READ_PIN,
    cmd::VOUT_MODE,
    cmd::MFR_ID,
    cmd::MFR_MODEL,
    cmd::MFR_REVISION,
    cmd::MFR_VIN_MIN,
    cmd::MFR_VIN_MAX,
    cmd::MFR_VOUT_MIN,
    cmd::MFR_VOUT_MAX,
    cmd::MFR_IOUT_MAX,
    cmd::READ_LSB,
    cmd::READ_VSB_OUT,
    cmd::READ_ISB_OUT,
    cmd::READ_FAN_DUTY,
    cmd::READ_PSON,
    cmd::READ_CRB,
    cmd::READ_VINOK,
    cmd::READ_ALERT,
    cmd::READ_ADDR,
];

/// Find a command by its code
pub fn lookup(code: u8) -> Option<&'static CommandDescriptor> {
    REGISTRY.iter().find(|c| c.code == code)
}

/// Find a command by name, ignoring ASCII case
pub fn lookup_name(name: &str) -> Option<&'static CommandDescriptor> {
    REGISTRY.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        for (i, a) in REGISTRY.iter().enumerate() {
            for b in &REGISTRY[i + 1..] {
                assert_ne!(a.code, b.code, "{} and {} share a code", a.name, b.name);
            }
        }
    }

    #[test]
    fn test_names_are_unique() {
        for (i, a) in REGISTRY.iter().enumerate() {
            for b in &REGISTRY[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_lengths_match_access_kind() {
        for c in REGISTRY {
            assert!(c.is_consistent(), "{} has inconsistent length", c.name);
        }
    }

    #[test]
    fn test_status_tag_matches_name_prefix() {
        // The tag must reproduce the historical name-based dispatch exactly
        for c in REGISTRY {
            let by_name = c.name.starts_with("STATUS_") || c.name == "STATUS_WORD";
            assert_eq!(c.is_status, by_name, "{}", c.name);
        }
    }

    #[test]
    fn test_linear16_set() {
        let linear16: heapless::Vec<&str, 8> = REGISTRY
            .iter()
            .filter(|c| c.encoding == Encoding::Linear16)
            .map(|c| c.name)
            .collect();
        assert_eq!(
            linear16.as_slice(),
            &[
                "VOUT_OV_FAULT_LIMIT",
                "VOUT_UV_FAULT_LIMIT",
                "READ_VSB_OUT",
                "READ_VOUT",
                "MFR_VOUT_MIN",
                "MFR_VOUT_MAX",
            ]
        );
    }

    #[test]
    fn test_lookup_by_code() {
        assert_eq!(lookup(0x8B).map(|c| c.name), Some("READ_VOUT"));
        assert_eq!(lookup(0x20), Some(&cmd::VOUT_MODE));
        assert!(lookup(0xFF).is_none());
    }

    #[test]
    fn test_lookup_by_name_ignores_case() {
        assert_eq!(lookup_name("mfr_vin_min"), Some(&cmd::MFR_VIN_MIN));
        assert_eq!(lookup_name("Read_Vout"), Some(&cmd::READ_VOUT));
        assert!(lookup_name("READ_NOTHING").is_none());
    }

    #[test]
    fn test_params_are_registered() {
        for c in PARAMS {
            assert_eq!(lookup(c.code), Some(c));
        }
    }

    #[test]
    fn test_clear_faults_is_send_byte() {
        assert_eq!(cmd::CLEAR_FAULTS.access, AccessKind::SendByte);
        assert_eq!(cmd::CLEAR_FAULTS.byte_len, 0);
    }
}
