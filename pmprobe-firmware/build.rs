//! Build script for pmprobe-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates pmprobe.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Largest 7-bit I2C address
const MAX_ADDRESS: i64 = 0x7F;

/// RP2040 I2C block limit
const MAX_FREQUENCY_HZ: i64 = 1_000_000;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    if env::var_os("CARGO_FEATURE_DEFMT").is_some() {
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate pmprobe.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=pmprobe.toml");

    let config_path = Path::new("pmprobe.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: pmprobe.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds pmprobe.toml at build time.                 ║\n\
            ║  Please create one in the pmprobe-firmware directory.            ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read pmprobe.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in pmprobe.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);
    validate_bus(&config, &mut errors);
    validate_console(&config, &mut errors);
    validate_device(&config, &mut errors);
    validate_retry(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid configuration in pmprobe.toml                    ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            format_error_lines(&errors.join("\n"))
        );
    }

    println!("cargo:warning=pmprobe.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The firmware parser rejects sections it does not know
fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(table) = config.as_table() else {
        return;
    };
    for name in table.keys() {
        if !matches!(name.as_str(), "bus" | "console" | "device" | "retry") {
            errors.push(format!("Unknown section [{}]", name));
        }
    }
}

/// Integer at `section.key`, if present. Pushes an error for other types.
fn integer(
    config: &toml::Value,
    section: &str,
    key: &str,
    errors: &mut Vec<String>,
) -> Option<i64> {
    let value = config.get(section)?.get(key)?;
    match value.as_integer() {
        Some(v) => Some(v),
        None => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            None
        }
    }
}

fn validate_bus(config: &toml::Value, errors: &mut Vec<String>) {
    if let Some(hz) = integer(config, "bus", "frequency_hz", errors) {
        if hz <= 0 || hz > MAX_FREQUENCY_HZ {
            errors.push(format!(
                "[bus] frequency_hz = {} (must be 1..={})",
                hz, MAX_FREQUENCY_HZ
            ));
        }
    }
}

fn validate_console(config: &toml::Value, errors: &mut Vec<String>) {
    if let Some(baud) = integer(config, "console", "baudrate", errors) {
        if baud <= 0 || baud > i64::from(u32::MAX) {
            errors.push(format!("[console] baudrate = {} is out of range", baud));
        }
    }
}

fn validate_device(config: &toml::Value, errors: &mut Vec<String>) {
    for key in ["address", "eeprom"] {
        if let Some(addr) = integer(config, "device", key, errors) {
            if !(0..=MAX_ADDRESS).contains(&addr) {
                errors.push(format!(
                    "[device] {} = {:#x} is not a 7-bit address",
                    key, addr
                ));
            }
        }
    }
}

fn validate_retry(config: &toml::Value, errors: &mut Vec<String>) {
    if let Some(attempts) = integer(config, "retry", "attempts", errors) {
        if !(1..=255).contains(&attempts) {
            errors.push(format!("[retry] attempts = {} (must be 1..=255)", attempts));
        }
    }
    if let Some(delay) = integer(config, "retry", "delay_ms", errors) {
        if delay < 0 || delay > i64::from(u32::MAX) {
            errors.push(format!("[retry] delay_ms = {} is out of range", delay));
        }
    }
}
