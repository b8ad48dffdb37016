//! Terminal output adapter

use core::fmt::{self, Write};

/// Translates `\n` into `\r\n` for serial terminals
pub struct Crlf<W>(pub W);

impl<W: Write> Write for Crlf<W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for (i, part) in s.split('\n').enumerate() {
            if i > 0 {
                self.0.write_str("\r\n")?;
            }
            self.0.write_str(part)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::String;

    #[test]
    fn test_newlines_translated() {
        let mut out = String::new();
        write!(Crlf(&mut out), "a\nb\n").unwrap();
        assert_eq!(out, "a\r\nb\r\n");
    }

    #[test]
    fn test_overflow_reported() {
        let mut out: heapless::String<4> = heapless::String::new();
        assert!(write!(Crlf(&mut out), "abc\n").is_err());
    }
}
