//! Byte-at-a-time line editing for a serial terminal

use heapless::String;

/// Longest line the editor keeps; further printable bytes are dropped
pub const MAX_LINE_LEN: usize = 128;

/// What the terminal should show after a byte was fed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edit {
    /// Nothing to show
    None,
    /// Echo this byte back
    Echo(u8),
    /// Erase the last character on screen
    Erase,
    /// Line complete; read it with [`LineEditor::line`]
    Submit,
}

/// Accumulates printable bytes until CR or LF
#[derive(Debug, Default)]
pub struct LineEditor {
    buf: String<MAX_LINE_LEN>,
    after_cr: bool,
}

impl LineEditor {
    pub const fn new() -> Self {
        Self {
            buf: String::new(),
            after_cr: false,
        }
    }

    /// Feed one received byte
    pub fn feed(&mut self, byte: u8) -> Edit {
        let after_cr = core::mem::replace(&mut self.after_cr, byte == b'\r');
        match byte {
            b'\r' => Edit::Submit,
            // Second half of CRLF
            b'\n' if after_cr => Edit::None,
            b'\n' => Edit::Submit,
            0x08 | 0x7F => match self.buf.pop() {
                Some(_) => Edit::Erase,
                None => Edit::None,
            },
            0x20..=0x7E => match self.buf.push(char::from(byte)) {
                Ok(()) => Edit::Echo(byte),
                Err(()) => Edit::None,
            },
            _ => Edit::None,
        }
    }

    /// Current line contents
    pub fn line(&self) -> &str {
        &self.buf
    }

    /// Start a new line
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
