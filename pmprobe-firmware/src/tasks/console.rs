//! Serial console task
//!
//! Reads terminal bytes from UART0, echoes them, and runs each completed
//! line through the PMBus console.

use core::fmt::Write as _;

use defmt::*;
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embedded_io_async::{Read, Write};
use heapless::String;

use pmprobe_core::console::{Crlf, Edit, LineEditor, Outcome, BANNER, PROMPT};

use crate::ProbeConsole;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Output of a single command; `status` is the longest
const OUTPUT_BUF_SIZE: usize = 8192;

const TRUNCATED: &[u8] = b"\r\n[output truncated]\r\n";

/// Console task - line editing, command dispatch and output
#[embassy_executor::task]
pub async fn console_task(
    mut tx: BufferedUartTx,
    mut rx: BufferedUartRx,
    mut console: ProbeConsole,
) {
    info!("Console task started");

    let mut editor = LineEditor::new();
    let mut out: String<OUTPUT_BUF_SIZE> = String::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    let _ = write!(Crlf(&mut out), "{}{}", BANNER, PROMPT);
    send(&mut tx, out.as_bytes()).await;

    loop {
        let n = match rx.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("UART read error: {:?}", e);
                continue;
            }
        };
        trace!("RX: {} bytes", n);

        for &byte in &buf[..n] {
            match editor.feed(byte) {
                Edit::None => {}
                Edit::Echo(b) => send(&mut tx, &[b]).await,
                Edit::Erase => send(&mut tx, b"\x08 \x08").await,
                Edit::Submit => {
                    out.clear();
                    let _ = out.push_str("\r\n");
                    debug!("Line: {}", editor.line());
                    let result = console.handle_line(editor.line(), &mut Crlf(&mut out));
                    editor.clear();
                    send(&mut tx, out.as_bytes()).await;

                    match result {
                        Ok(Outcome::Continue) => {}
                        Ok(Outcome::Exit) => {
                            info!("Console closed");
                            return;
                        }
                        Err(_) => {
                            warn!("Command output exceeded {} bytes", OUTPUT_BUF_SIZE);
                            send(&mut tx, TRUNCATED).await;
                        }
                    }

                    out.clear();
                    let _ = write!(Crlf(&mut out), "{}", PROMPT);
                    send(&mut tx, out.as_bytes()).await;
                }
            }
        }
    }
}

async fn send(tx: &mut BufferedUartTx, bytes: &[u8]) {
    if let Err(e) = tx.write_all(bytes).await {
        warn!("UART write error: {:?}", e);
    }
}
