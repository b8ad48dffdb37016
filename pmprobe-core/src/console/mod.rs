//! Line-oriented operator console
//!
//! The console owns the bus and the retry settings and keeps the two
//! addresses an operator can configure. For each command that talks to
//! the PMBus device it builds a short-lived [`PmbusDevice`] borrowing the
//! bus, so the session address cannot change while a transaction runs.
//!
//! Output goes to any [`core::fmt::Write`]; the firmware backs it with a
//! UART buffer, tests with a `String`.

pub mod command;
pub mod line;
pub mod output;
pub mod render;

use core::fmt::{self, Write};

use embedded_hal::delay::DelayNs;

use pmprobe_hal::{BusError, I2cBus};
use pmprobe_protocol::commands::{cmd, PARAMS};
use pmprobe_protocol::status::StatusKind;

use crate::config::ProbeConfig;
use crate::device::PmbusDevice;
use crate::retry::{FixedRetry, RetryPolicy};
use crate::session::Session;

pub use command::{parse, AddressTarget, Command, ParseError};
pub use line::{Edit, LineEditor};
pub use output::Crlf;
use render::ByteList;

/// Printed once when the console starts
pub const BANNER: &str = "PMBus console. Type 'help' for available commands.";

/// Printed before every input line
pub const PROMPT: &str = "\n> ";

const NOT_SET: &str = "[!] PMBus address not set. Use 'addr pmbus <hex>' to set it.";

/// What the caller should do after a line was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Continue,
    Exit,
}

/// Console state: bus, delay, retry policy and configured addresses
pub struct Console<B, D, R = FixedRetry> {
    bus: B,
    delay: D,
    retry: R,
    pmbus: Option<Session>,
    eeprom: Option<u8>,
}

impl<B, D> Console<B, D, FixedRetry>
where
    B: I2cBus,
    D: DelayNs,
{
    /// Console with addresses and retry settings taken from `config`
    pub fn from_config(bus: B, delay: D, config: &ProbeConfig) -> Self {
        let mut console = Self::new(bus, delay, FixedRetry::from(config.retry));
        console.pmbus = config.device.session();
        console.eeprom = config.device.eeprom;
        console
    }
}

impl<B, D, R> Console<B, D, R>
where
    B: I2cBus,
    D: DelayNs,
    R: RetryPolicy + Clone,
{
    pub fn new(bus: B, delay: D, retry: R) -> Self {
        Self {
            bus,
            delay,
            retry,
            pmbus: None,
            eeprom: None,
        }
    }

    /// Configured PMBus session, if any
    pub fn pmbus(&self) -> Option<Session> {
        self.pmbus
    }

    /// Configured EEPROM address, if any
    pub fn eeprom(&self) -> Option<u8> {
        self.eeprom
    }

    /// Give back the bus and delay
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }

    fn device(&mut self) -> Option<PmbusDevice<&mut B, &mut D, R>> {
        let session = self.pmbus?;
        Some(PmbusDevice::new(
            &mut self.bus,
            session,
            &mut self.delay,
            self.retry.clone(),
        ))
    }

    /// Parse and run one input line
    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Outcome, fmt::Error> {
        match parse(line) {
            Ok(command) => self.execute(command, out),
            Err(ParseError::Empty) => Ok(Outcome::Continue),
            Err(ParseError::Unknown) => {
                writeln!(out, "Unknown command. Type 'help' for list of commands.")?;
                Ok(Outcome::Continue)
            }
            Err(ParseError::Usage(usage)) => {
                writeln!(out, "Usage: {}", usage)?;
                Ok(Outcome::Continue)
            }
            Err(ParseError::InvalidNumber) => {
                writeln!(out, "[ERROR] Invalid number")?;
                Ok(Outcome::Continue)
            }
            Err(ParseError::TooManyArguments) => {
                writeln!(out, "[ERROR] Too many arguments")?;
                Ok(Outcome::Continue)
            }
        }
    }

    /// Run one parsed command
    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<Outcome, fmt::Error> {
        if command.needs_pmbus() {
            match self.device() {
                Some(mut device) => run_device_command(&mut device, command, out)?,
                None => writeln!(out, "{}", NOT_SET)?,
            }
            return Ok(Outcome::Continue);
        }

        match command {
            Command::Exit => {
                writeln!(out, "Exiting.")?;
                return Ok(Outcome::Exit);
            }
            Command::Help => out.write_str(render::HELP)?,
            Command::Scan => self.scan(out)?,
            Command::SetAddress { target, address } => self.set_address(target, address, out)?,
            Command::ShowAddress => self.show_address(out)?,
            // Device commands were dispatched above
            _ => {}
        }
        Ok(Outcome::Continue)
    }

    fn scan<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        writeln!(out, "Scanning I2C bus...")?;
        match self.bus.scan() {
            Ok(found) if found.is_empty() => writeln!(out, "No devices found."),
            Ok(found) => {
                for address in found {
                    writeln!(out, "Found device at 0x{:02X}", address)?;
                }
                Ok(())
            }
            Err(e) => {
                let e: BusError = e.into();
                writeln!(out, "[ERROR] Scan failed ({:?})", e)
            }
        }
    }

    fn set_address<W: Write>(&mut self, target: AddressTarget, address: u8, out: &mut W) -> fmt::Result {
        let Some(session) = Session::new(address) else {
            return writeln!(out, "[ERROR] Address must be 7-bit (0x00-0x7F)");
        };
        match target {
            AddressTarget::Pmbus => {
                self.pmbus = Some(session);
                writeln!(out, "PMBus address set to 0x{:02X}", address)
            }
            AddressTarget::Eeprom => {
                self.eeprom = Some(address);
                writeln!(out, "EEPROM address set to 0x{:02X}", address)
            }
        }
    }

    fn show_address<W: Write>(&self, out: &mut W) -> fmt::Result {
        match self.pmbus {
            Some(s) => writeln!(out, "PMBus address : 0x{:02X}", s.address())?,
            None => writeln!(out, "PMBus address not set")?,
        }
        match self.eeprom {
            Some(a) => writeln!(out, "EEPROM address: 0x{:02X}", a),
            None => writeln!(out, "EEPROM address not set"),
        }
    }
}

fn run_device_command<B, D, R, W>(
    device: &mut PmbusDevice<B, D, R>,
    command: Command,
    out: &mut W,
) -> fmt::Result
where
    B: I2cBus,
    D: DelayNs,
    R: RetryPolicy,
    W: Write,
{
    match command {
        Command::Params => {
            for descriptor in PARAMS {
                let value = device.read_value(descriptor);
                render::write_value(out, descriptor, &value)?;
            }
            Ok(())
        }
        Command::Status => {
            for kind in StatusKind::ALL {
                match device.read_status(kind) {
                    Ok(report) => render::write_status(out, &report)?,
                    Err(_) => writeln!(out, "Decoded {}: [ERROR]", kind.name())?,
                }
            }
            Ok(())
        }
        Command::Register(descriptor) => {
            let value = device.read_value(descriptor);
            render::write_value(out, descriptor, &value)
        }
        Command::Read { code, len } => match device.read_plain(code, len) {
            Ok(data) => writeln!(out, "Data: {}", ByteList(&data)),
            Err(e) => writeln!(out, "Data: [ERROR] {}", e),
        },
        Command::ReadPec { code, len } => match device.read_with_pec(code, len) {
            Ok(data) => writeln!(out, "Data: {}", ByteList(&data)),
            Err(e) => writeln!(out, "Data: [ERROR] {}", e),
        },
        Command::Write { code, values } => {
            if device.write_plain(code, &values, values.len()) {
                writeln!(out, "Write complete")
            } else {
                writeln!(out, "[ERROR] Write failed")
            }
        }
        Command::WritePec { code, values } => {
            if device.write_with_pec(code, &values, values.len()) {
                writeln!(out, "Write complete")
            } else {
                writeln!(out, "[ERROR] Write failed")
            }
        }
        Command::ReadPagePlus {
            byte_count,
            page,
            command,
        } => match device.paged_read(byte_count, page, command) {
            Ok(response) => writeln!(out, "PAGE_PLUS_READ Response {}", ByteList(&response)),
            Err(e) => writeln!(out, "[ERROR] PAGE_PLUS_READ failed: {}", e),
        },
        Command::Check { code } => match device.capability_query(code) {
            Ok(true) => writeln!(out, "Command 0x{:02X} is supported.", code),
            Ok(false) => writeln!(out, "Command 0x{:02X} is NOT supported.", code),
            Err(e) => writeln!(out, "QUERY failed: {}", e),
        },
        Command::Clear => {
            if device.send_byte(cmd::CLEAR_FAULTS.code) {
                writeln!(out, "Faults cleared")
            } else {
                writeln!(out, "[ERROR] CLEAR_FAULTS failed")
            }
        }
        // Handled by the console without a device
        Command::Scan
        | Command::SetAddress { .. }
        | Command::ShowAddress
        | Command::Help
        | Command::Exit => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::NoRetry;
    use crate::testing::{MockBus, NoopDelay, Op};
    use pmprobe_hal::BusError;
    use pmprobe_protocol::pec;
    use std::string::String;

    fn console(bus: MockBus) -> Console<MockBus, NoopDelay, NoRetry> {
        Console::new(bus, NoopDelay::default(), NoRetry)
    }

    fn run(console: &mut Console<MockBus, NoopDelay, NoRetry>, line: &str) -> String {
        let mut out = String::new();
        console.handle_line(line, &mut out).unwrap();
        out
    }

    #[test]
    fn test_bus_commands_need_address() {
        let mut c = console(MockBus::new());
        for line in ["params", "status", "read_vin", "read 88 2", "check 8b", "clear"] {
            assert_eq!(run(&mut c, line), format!("{}\n", NOT_SET), "{}", line);
        }
        assert_eq!(c.release().0.op_count(), 0);
    }

    #[test]
    fn test_address_gate_follows_command_kind() {
        let lines = [
            "params", "status", "scan", "addr pmbus 58", "showaddr", "read 88 2",
            "write 21 00", "readpec 88 2", "writepec 01 80", "read_page_plus 2 1 8b",
            "check 8b", "clear", "help", "exit", "mfr_model",
        ];
        for line in lines {
            let command = parse(line).unwrap();
            let gated = command.needs_pmbus();
            let mut c = console(MockBus::new());
            let mut out = String::new();
            c.execute(command, &mut out).unwrap();
            assert_eq!(out == format!("{}\n", NOT_SET), gated, "{}", line);
        }
    }

    #[test]
    fn test_set_and_show_address() {
        let mut c = console(MockBus::new());
        assert_eq!(run(&mut c, "showaddr"), "PMBus address not set\nEEPROM address not set\n");
        assert_eq!(run(&mut c, "addr pmbus 58"), "PMBus address set to 0x58\n");
        assert_eq!(run(&mut c, "addr eeprom 50"), "EEPROM address set to 0x50\n");
        assert_eq!(run(&mut c, "showaddr"), "PMBus address : 0x58\nEEPROM address: 0x50\n");
        assert_eq!(c.pmbus().map(|s| s.address()), Some(0x58));
    }

    #[test]
    fn test_eight_bit_address_rejected() {
        let mut c = console(MockBus::new());
        assert!(run(&mut c, "addr pmbus b0").starts_with("[ERROR]"));
        assert!(c.pmbus().is_none());
    }

    #[test]
    fn test_scan_without_address() {
        let mut bus = MockBus::new();
        bus.present = vec![0x50, 0x58];
        let mut c = console(bus);
        assert_eq!(
            run(&mut c, "scan"),
            "Scanning I2C bus...\nFound device at 0x50\nFound device at 0x58\n"
        );

        let mut c = console(MockBus::new());
        assert_eq!(run(&mut c, "scan"), "Scanning I2C bus...\nNo devices found.\n");
    }

    #[test]
    fn test_register_by_name() {
        let mut bus = MockBus::new();
        // Y = 25, N = -1
        bus.reply(&[0x19, 0xF8]);
        let mut c = console(bus);
        run(&mut c, "addr pmbus 58");
        assert_eq!(run(&mut c, "READ_VIN"), format!("{:<25}: 12.50\n", "READ_VIN"));
    }

    #[test]
    fn test_params_prints_every_entry() {
        let mut c = console(MockBus::new());
        run(&mut c, "addr pmbus 58");
        let out = run(&mut c, "params");
        assert_eq!(out.lines().count(), PARAMS.len());
        // Nothing answered, so nothing may look like a reading
        assert!(out.lines().all(|l| l.ends_with("[ERROR]")));
    }

    #[test]
    fn test_status_prints_every_register() {
        let mut bus = MockBus::new();
        bus.reply(&[0x00, 0x00]);
        let mut c = console(bus);
        run(&mut c, "addr pmbus 58");
        let out = run(&mut c, "status");

        assert!(out.starts_with("Decoded STATUS_WORD:\n  [15] VOUT"));
        for kind in StatusKind::ALL.iter().skip(1) {
            assert!(out.contains(&format!("Decoded {}: [ERROR]", kind.name())));
        }
    }

    #[test]
    fn test_raw_read_and_write() {
        let mut bus = MockBus::new();
        bus.reply(&[0x00, 0x18]);
        let mut c = console(bus);
        run(&mut c, "addr pmbus 58");

        assert_eq!(run(&mut c, "read 8b 2"), "Data: [0x00, 0x18]\n");
        assert_eq!(run(&mut c, "write 21 00 18"), "Write complete\n");

        let ops = c.release().0.ops;
        assert_eq!(
            ops[1],
            Op::WriteRegister { address: 0x58, command: 0x21, data: vec![0x00, 0x18] }
        );
    }

    #[test]
    fn test_pec_commands() {
        let good = pec::read_response_pec(0x58, 0x98, &[0x22]);
        let mut bus = MockBus::new();
        bus.reply(&[0x22, good]).reply(&[0x22, good ^ 0x80]);
        let mut c = console(bus);
        run(&mut c, "addr pmbus 58");

        assert_eq!(run(&mut c, "readpec 98 1"), "Data: [0x22]\n");
        assert!(run(&mut c, "readpec 98 1").starts_with("Data: [ERROR] PEC mismatch"));
        assert_eq!(run(&mut c, "writepec 01 80"), "Write complete\n");
    }

    #[test]
    fn test_check_and_page_plus() {
        let mut bus = MockBus::new();
        bus.reply(&[0x01])
            .reply(&[0x00])
            .fail_read(BusError::Nack)
            .reply(&[1, 2, 3, 4]);
        let mut c = console(bus);
        run(&mut c, "addr pmbus 58");

        assert_eq!(run(&mut c, "check 8b"), "Command 0x8B is supported.\n");
        assert_eq!(run(&mut c, "check 8b"), "Command 0x8B is NOT supported.\n");
        assert!(run(&mut c, "check 8b").starts_with("QUERY failed"));
        assert_eq!(
            run(&mut c, "read_page_plus 2 1 8b"),
            "PAGE_PLUS_READ Response [0x01, 0x02, 0x03, 0x04]\n"
        );
    }

    #[test]
    fn test_clear_faults() {
        let mut bus = MockBus::new();
        bus.fail_write(BusError::Nack);
        let mut c = console(bus);
        run(&mut c, "addr pmbus 58");

        assert_eq!(run(&mut c, "clear"), "[ERROR] CLEAR_FAULTS failed\n");
        assert_eq!(run(&mut c, "clear"), "Faults cleared\n");
    }

    #[test]
    fn test_parse_errors_are_reported() {
        let mut c = console(MockBus::new());
        assert_eq!(run(&mut c, ""), "");
        assert!(run(&mut c, "bogus").starts_with("Unknown command"));
        assert_eq!(run(&mut c, "read 8b"), "Usage: read <reg> <len>\n");
        assert_eq!(run(&mut c, "check zz"), "[ERROR] Invalid number\n");
        let line = format!("read{}", " 8b".repeat(40));
        assert_eq!(run(&mut c, &line), "[ERROR] Too many arguments\n");
    }

    #[test]
    fn test_help_and_exit() {
        let mut c = console(MockBus::new());
        assert!(run(&mut c, "help").contains("read_page_plus"));

        let mut out = String::new();
        assert_eq!(c.handle_line("exit", &mut out), Ok(Outcome::Exit));
        assert_eq!(out, "Exiting.\n");
    }

    #[test]
    fn test_from_config() {
        let config = crate::config::parse_config("[device]\naddress = 0x59\neeprom = 0x51").unwrap();
        let c = Console::from_config(MockBus::new(), NoopDelay::default(), &config);
        assert_eq!(c.pmbus().map(|s| s.address()), Some(0x59));
        assert_eq!(c.eeprom(), Some(0x51));
    }
}
