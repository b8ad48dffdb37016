//! pmprobe - PMBus power-supply probe firmware
//!
//! Main firmware binary for RP2040 boards. Drives a PMBus device on I2C0
//! and exposes an interactive console on UART0.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::i2c::{self, Blocking, I2c};
use embassy_rp::peripherals::{I2C0, UART0};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use pmprobe_core::config::{parse_config, ProbeConfig};
use pmprobe_core::console::Console;
use pmprobe_hal::HalBus;

/// Embedded configuration (compiled into firmware)
/// Edit pmprobe.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../pmprobe.toml");

mod tasks;

/// PMBus transport on I2C0
pub type ProbeBus = HalBus<I2c<'static, I2C0, Blocking>>;

/// Console bound to the board's bus and timer
pub type ProbeConsole = Console<ProbeBus, Delay>;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("pmprobe firmware starting...");

    let p = embassy_rp::init(Default::default());

    let config = match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!(
                "Config: bus {} Hz, console {} baud, {} attempts / {} ms",
                config.bus.frequency_hz,
                config.console.baudrate,
                config.retry.attempts,
                config.retry.delay_ms
            );
            config
        }
        Err(e) => {
            warn!("Embedded config rejected ({:?}), using defaults", e);
            ProbeConfig::default()
        }
    };

    // I2C0: GP0 = SDA, GP1 = SCL
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = config.bus.frequency_hz;
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_1, p.PIN_0, i2c_config);
    let bus = HalBus::new(i2c);

    // UART0 console: GP16 = TX, GP17 = RX
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = config.console.baudrate;

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_16, p.PIN_17, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    if let Some(session) = config.device.session() {
        info!("PMBus address preset to {:#x}", session.address());
    }
    let console = Console::from_config(bus, Delay, &config);

    spawner.spawn(tasks::console_task(tx, rx, console)).unwrap();

    info!("Console running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
