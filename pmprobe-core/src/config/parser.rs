//! Minimal TOML parser for the probe configuration
//!
//! Handles only the subset `pmprobe.toml` uses. It does NOT support the
//! full TOML grammar.
//!
//! Supported:
//! - `[bus]`, `[console]`, `[device]` and `[retry]` section headers
//! - Integer values, decimal or `0x` hexadecimal, optionally quoted
//! - Comments (`# ...`), including trailing ones
//!
//! Unknown keys are ignored so newer files still load.

use super::types::ProbeConfig;
use crate::session::MAX_ADDRESS;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Value is not an integer or does not fit its field
    InvalidValue,
    /// Address outside the 7-bit range
    InvalidAddress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Bus,
    Console,
    Device,
    Retry,
}

/// Parse TOML text into a [`ProbeConfig`], starting from the defaults
pub fn parse_config(input: &str) -> Result<ProbeConfig, ParseError> {
    let mut config = ProbeConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            apply_value(section, key, value, &mut config)?;
        }
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "bus" => Ok(Section::Bus),
        "console" => Ok(Section::Console),
        "device" => Ok(Section::Device),
        "retry" => Ok(Section::Retry),
        _ => Err(ParseError::InvalidSection),
    }
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = match value.find('#') {
        Some(hash_pos) => value[..hash_pos].trim(),
        None => value,
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse an integer, decimal or `0x` hex, with optional quotes
fn parse_int(value: &str) -> Result<u32, ParseError> {
    let value = value.trim_matches('"');
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|_| ParseError::InvalidValue)
}

fn parse_u8(value: &str) -> Result<u8, ParseError> {
    u8::try_from(parse_int(value)?).map_err(|_| ParseError::InvalidValue)
}

fn parse_address(value: &str) -> Result<u8, ParseError> {
    let address = parse_int(value)?;
    if address > u32::from(MAX_ADDRESS) {
        return Err(ParseError::InvalidAddress);
    }
    Ok(address as u8)
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut ProbeConfig,
) -> Result<(), ParseError> {
    match (section, key) {
        (Section::Bus, "frequency_hz") => config.bus.frequency_hz = parse_int(value)?,
        (Section::Console, "baudrate") => config.console.baudrate = parse_int(value)?,
        (Section::Device, "address") => config.device.address = Some(parse_address(value)?),
        (Section::Device, "eeprom") => config.device.eeprom = Some(parse_address(value)?),
        (Section::Retry, "attempts") => config.retry.attempts = parse_u8(value)?,
        (Section::Retry, "delay_ms") => config.retry.delay_ms = parse_int(value)?,
        _ => {} // Ignore unknown keys
    }
    Ok(())
}
