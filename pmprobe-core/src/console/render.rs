//! Console output formatting

use core::fmt::{self, Write};

use pmprobe_protocol::commands::{CommandDescriptor, Encoding};
use pmprobe_protocol::status::StatusReport;

use crate::monitor::DecodedValue;

/// Longest text or hex rendering before it is cut off with `...`
pub const MAX_FIELD_CHARS: usize = 60;

/// Width of the register name column
const NAME_WIDTH: usize = 25;

/// Width of the status bit label column
const LABEL_WIDTH: usize = 30;

/// Write at most [`MAX_FIELD_CHARS`] characters, then `...` if cut
fn write_truncated<W: Write>(out: &mut W, chars: impl Iterator<Item = char>) -> fmt::Result {
    for (i, c) in chars.enumerate() {
        if i == MAX_FIELD_CHARS {
            return out.write_str("...");
        }
        out.write_char(c)?;
    }
    Ok(())
}

/// Padding trimmed from text blocks: TAB..CR, the FS/GS/RS/US separators
/// and space
fn is_padding(b: u8) -> bool {
    matches!(b, b'\t'..=b'\r' | 0x1C..=0x1F | b' ')
}

/// ASCII bytes of a block with surrounding padding removed
fn ascii_text(data: &[u8]) -> impl Iterator<Item = char> + '_ {
    let start = data
        .iter()
        .position(|&b| b.is_ascii() && !is_padding(b))
        .unwrap_or(data.len());
    let end = data
        .iter()
        .rposition(|&b| b.is_ascii() && !is_padding(b))
        .map_or(start, |i| i + 1);
    data[start..end]
        .iter()
        .filter(|b| b.is_ascii())
        .map(|&b| char::from(b))
}

/// Bytes as space-separated `0x..` values
struct Hex<'a>(&'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_char(' ')?;
            }
            write!(f, "{:#x}", b)?;
        }
        Ok(())
    }
}

/// Bytes as a bracketed list: `[0x00, 0x18]`
pub struct ByteList<'a>(pub &'a [u8]);

impl fmt::Display for ByteList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('[')?;
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "0x{:02X}", b)?;
        }
        f.write_char(']')
    }
}

/// One `NAME : value` line for a registry entry
pub fn write_value<W: Write>(
    out: &mut W,
    command: &CommandDescriptor,
    value: &DecodedValue,
) -> fmt::Result {
    write!(out, "{:<width$}: ", command.name, width = NAME_WIDTH)?;
    match value {
        DecodedValue::Absent => out.write_str("[ERROR]")?,
        DecodedValue::Integer(v) if command.is_status => write!(out, "0x{:04X}", v)?,
        DecodedValue::Integer(v) => write!(out, "{:.2}", f32::from(*v))?,
        DecodedValue::Linear(v) => write!(out, "{:.2}", v)?,
        DecodedValue::Block(data) if command.encoding == Encoding::Ascii => {
            write_truncated(out, ascii_text(data))?
        }
        DecodedValue::Block(data) => {
            // 32 bytes at up to five characters each
            let mut hex: heapless::String<160> = heapless::String::new();
            write!(hex, "{}", Hex(data))?;
            write_truncated(out, hex.chars())?
        }
    }
    out.write_char('\n')
}

/// Header plus one line per defined bit
pub fn write_status<W: Write>(out: &mut W, report: &StatusReport) -> fmt::Result {
    writeln!(out, "Decoded {}:", report.kind.name())?;
    for bit in &report.bits {
        writeln!(
            out,
            "  [{}] {:<width$}: {}",
            bit.bit,
            bit.label,
            if bit.active { "YES" } else { "NO" },
            width = LABEL_WIDTH
        )?;
    }
    Ok(())
}

pub const HELP: &str = "\
Available commands:
  params             - show all monitored parameters
  status             - show all decoded status registers
  <PARAM_NAME>       - show value of one known command (e.g. MFR_VIN_MIN)
  addr pmbus <hex>   - set PMBus address
  addr eeprom <hex>  - set EEPROM address
  showaddr           - show current addresses
  read <reg> <len>   - read <len> bytes from <reg> (hex)
  write <reg> <val1> [val2 ...] - write bytes to register
  readpec <reg> <len>       - read with PEC
  writepec <reg> <val1>...  - write with PEC
  read_page_plus <count> <page> <cmd> - read <cmd> through PAGE_PLUS_READ
  check <cmd>        - check if a command code is supported by device
  clear              - send CLEAR_FAULTS
  scan               - scan and list devices on I2C bus
  exit               - exit the console
";
