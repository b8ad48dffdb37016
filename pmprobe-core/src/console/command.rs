//! Console command parsing
//!
//! Commands are case-insensitive words separated by whitespace. Register
//! codes and byte values are hexadecimal (with or without `0x`), read
//! lengths are decimal.

use heapless::Vec;

use pmprobe_protocol::commands::{lookup_name, CommandDescriptor};

/// Most byte values a `write`/`writepec` line may carry
pub const MAX_VALUES: usize = 32;

/// Byte values of a write command
pub type Values = Vec<u8, MAX_VALUES>;

const MAX_TOKENS: usize = MAX_VALUES + 2;

/// Which address an `addr` command sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressTarget {
    Pmbus,
    Eeprom,
}

/// A parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Poll every parameter in `PARAMS`
    Params,
    /// Decode every status register
    Status,
    /// Scan the bus
    Scan,
    SetAddress { target: AddressTarget, address: u8 },
    ShowAddress,
    Read { code: u8, len: usize },
    Write { code: u8, values: Values },
    ReadPec { code: u8, len: usize },
    WritePec { code: u8, values: Values },
    ReadPagePlus { byte_count: u8, page: u8, command: u8 },
    /// Capability query for one command code
    Check { code: u8 },
    /// Send CLEAR_FAULTS
    Clear,
    Help,
    Exit,
    /// Read and print one registry entry by name
    Register(&'static CommandDescriptor),
}

impl Command {
    /// Whether the command talks to the configured PMBus device
    pub fn needs_pmbus(&self) -> bool {
        !matches!(
            self,
            Command::Scan
                | Command::SetAddress { .. }
                | Command::ShowAddress
                | Command::Help
                | Command::Exit
        )
    }
}

/// Why a line could not be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Blank line
    Empty,
    /// First word is neither a command nor a register name
    Unknown,
    /// Known command with the wrong arguments; carries the usage line
    Usage(&'static str),
    /// Argument is not a valid number
    InvalidNumber,
    /// More words than any command takes
    TooManyArguments,
}

fn parse_hex(s: &str) -> Result<u8, ParseError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u8::from_str_radix(digits, 16).map_err(|_| ParseError::InvalidNumber)
}

fn parse_len(s: &str) -> Result<usize, ParseError> {
    s.parse().map_err(|_| ParseError::InvalidNumber)
}

fn parse_values(args: &[&str]) -> Result<Values, ParseError> {
    let mut values = Values::new();
    for arg in args {
        values
            .push(parse_hex(arg)?)
            .map_err(|_| ParseError::TooManyArguments)?;
    }
    Ok(values)
}

const USAGE_ADDR: &str = "addr pmbus <hex> or addr eeprom <hex>";
const USAGE_READ: &str = "read <reg> <len>";
const USAGE_WRITE: &str = "write <reg> <val1> [val2 ...]";
const USAGE_READPEC: &str = "readpec <reg> <len>";
const USAGE_WRITEPEC: &str = "writepec <reg> <val1> [val2 ...]";
const USAGE_PAGE_PLUS: &str = "read_page_plus <count> <page> <cmd>";
const USAGE_CHECK: &str = "check <cmd>";

/// Parse one console line
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let mut tokens: Vec<&str, MAX_TOKENS> = Vec::new();
    for token in line.split_ascii_whitespace() {
        tokens.push(token).map_err(|_| ParseError::TooManyArguments)?;
    }

    let Some((&word, args)) = tokens.split_first() else {
        return Err(ParseError::Empty);
    };
    let is = |name: &str| word.eq_ignore_ascii_case(name);

    let command = if is("params") {
        Command::Params
    } else if is("status") {
        Command::Status
    } else if is("scan") {
        Command::Scan
    } else if is("showaddr") {
        Command::ShowAddress
    } else if is("clear") {
        Command::Clear
    } else if is("help") {
        Command::Help
    } else if is("exit") {
        Command::Exit
    } else if is("addr") {
        let [target, address] = args else {
            return Err(ParseError::Usage(USAGE_ADDR));
        };
        let target = if target.eq_ignore_ascii_case("pmbus") {
            AddressTarget::Pmbus
        } else if target.eq_ignore_ascii_case("eeprom") {
            AddressTarget::Eeprom
        } else {
            return Err(ParseError::Usage(USAGE_ADDR));
        };
        Command::SetAddress {
            target,
            address: parse_hex(address)?,
        }
    } else if is("read") {
        let [code, len] = args else {
            return Err(ParseError::Usage(USAGE_READ));
        };
        Command::Read {
            code: parse_hex(code)?,
            len: parse_len(len)?,
        }
    } else if is("readpec") {
        let [code, len] = args else {
            return Err(ParseError::Usage(USAGE_READPEC));
        };
        Command::ReadPec {
            code: parse_hex(code)?,
            len: parse_len(len)?,
        }
    } else if is("write") {
        let [code, values @ ..] = args else {
            return Err(ParseError::Usage(USAGE_WRITE));
        };
        if values.is_empty() {
            return Err(ParseError::Usage(USAGE_WRITE));
        }
        Command::Write {
            code: parse_hex(code)?,
            values: parse_values(values)?,
        }
    } else if is("writepec") {
        let [code, values @ ..] = args else {
            return Err(ParseError::Usage(USAGE_WRITEPEC));
        };
        if values.is_empty() {
            return Err(ParseError::Usage(USAGE_WRITEPEC));
        }
        Command::WritePec {
            code: parse_hex(code)?,
            values: parse_values(values)?,
        }
    } else if is("read_page_plus") {
        let [byte_count, page, command] = args else {
            return Err(ParseError::Usage(USAGE_PAGE_PLUS));
        };
        Command::ReadPagePlus {
            byte_count: parse_hex(byte_count)?,
            page: parse_hex(page)?,
            command: parse_hex(command)?,
        }
    } else if is("check") {
        let [code] = args else {
            return Err(ParseError::Usage(USAGE_CHECK));
        };
        Command::Check {
            code: parse_hex(code)?,
        }
    } else {
        match (lookup_name(word), args) {
            (Some(descriptor), []) => Command::Register(descriptor),
            _ => return Err(ParseError::Unknown),
        }
    };

    Ok(command)
}
