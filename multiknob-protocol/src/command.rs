//! Side-channel command parsing
//!
//! Commands are ASCII lines terminated by `\n` or `\r`. A burst of bytes
//! that ends without a terminator is also treated as a complete line
//! (see [`CommandParser::finish`]), matching host tools that write the bare
//! word and nothing else. Matching is case-insensitive and ignores
//! surrounding whitespace.

use heapless::Vec;

/// Longest accepted command line
pub const MAX_COMMAND_LEN: usize = 32;

/// Recognized side-channel commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlCommand {
    /// Restart the device (reloading configuration)
    Reboot,
    /// Anything else; logged and ignored
    Unknown,
}

impl ControlCommand {
    /// Parse one complete line
    ///
    /// Returns `None` for a blank line.
    pub fn parse(line: &[u8]) -> Option<Self> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return None;
        }
        if line.eq_ignore_ascii_case(b"REBOOT") {
            Some(ControlCommand::Reboot)
        } else {
            Some(ControlCommand::Unknown)
        }
    }
}

/// Errors that can occur while parsing commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Line exceeded [`MAX_COMMAND_LEN`]; discarded up to the next terminator
    LineTooLong,
}

/// Byte-at-a-time line parser
#[derive(Debug, Clone, Default)]
pub struct CommandParser {
    buffer: Vec<u8, MAX_COMMAND_LEN>,
    /// Dropping bytes until the next terminator
    discarding: bool,
}

impl CommandParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }

    /// Feed a single byte
    ///
    /// Returns `Ok(Some(cmd))` when a terminator completes a non-blank line.
    pub fn feed(&mut self, byte: u8) -> Result<Option<ControlCommand>, CommandError> {
        if byte == b'\n' || byte == b'\r' {
            if self.discarding {
                self.reset();
                return Ok(None);
            }
            let cmd = ControlCommand::parse(&self.buffer);
            self.buffer.clear();
            return Ok(cmd);
        }

        if self.discarding {
            return Ok(None);
        }

        if self.buffer.push(byte).is_err() {
            self.buffer.clear();
            self.discarding = true;
            return Err(CommandError::LineTooLong);
        }

        Ok(None)
    }

    /// Feed multiple bytes
    ///
    /// Returns the first complete command found. Remaining bytes after it
    /// are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<ControlCommand>, CommandError> {
        for &byte in bytes {
            if let Some(cmd) = self.feed(byte)? {
                return Ok(Some(cmd));
            }
        }
        Ok(None)
    }

    /// End of a burst: treat buffered bytes as a complete line
    pub fn finish(&mut self) -> Option<ControlCommand> {
        let cmd = if self.discarding {
            None
        } else {
            ControlCommand::parse(&self.buffer)
        };
        self.reset();
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reboot_with_newline() {
        let mut parser = CommandParser::new();
        assert_eq!(
            parser.feed_bytes(b"REBOOT\n"),
            Ok(Some(ControlCommand::Reboot))
        );
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let mut parser = CommandParser::new();
        assert_eq!(
            parser.feed_bytes(b"  reboot \r\n"),
            Ok(Some(ControlCommand::Reboot))
        );
        // The trailing \n after \r is a blank line
        assert_eq!(parser.feed_bytes(b"\n"), Ok(None));
    }

    #[test]
    fn test_unterminated_burst() {
        let mut parser = CommandParser::new();
        assert_eq!(parser.feed_bytes(b"Reboot"), Ok(None));
        assert_eq!(parser.finish(), Some(ControlCommand::Reboot));
        assert_eq!(parser.finish(), None);
    }

    #[test]
    fn test_unknown_command() {
        let mut parser = CommandParser::new();
        assert_eq!(
            parser.feed_bytes(b"FORMAT\n"),
            Ok(Some(ControlCommand::Unknown))
        );
        assert_eq!(
            parser.feed_bytes(b"REBOOTNOW\n"),
            Ok(Some(ControlCommand::Unknown))
        );
    }

    #[test]
    fn test_line_too_long_resyncs() {
        let mut parser = CommandParser::new();
        let long = [b'x'; MAX_COMMAND_LEN + 1];
        assert_eq!(parser.feed_bytes(&long), Err(CommandError::LineTooLong));
        // Rest of the long line is swallowed
        assert_eq!(parser.feed_bytes(b"REBOOT\n"), Ok(None));
        assert_eq!(
            parser.feed_bytes(b"REBOOT\n"),
            Ok(Some(ControlCommand::Reboot))
        );
    }

    #[test]
    fn test_remaining_bytes_not_consumed() {
        let mut parser = CommandParser::new();
        let data = b"REBOOT\nREBOOT";
        assert_eq!(parser.feed_bytes(data), Ok(Some(ControlCommand::Reboot)));
        assert_eq!(parser.finish(), None);
    }

    proptest! {
        #[test]
        fn prop_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let mut parser = CommandParser::new();
            for b in bytes {
                let _ = parser.feed(b);
            }
            let _ = parser.finish();
        }

        #[test]
        fn prop_garbage_lines_are_not_reboot(line in "[a-qs-zA-QS-Z0-9 ]{1,20}") {
            let mut parser = CommandParser::new();
            let mut bytes = std::vec::Vec::from(line.as_bytes());
            bytes.push(b'\n');
            let result = parser.feed_bytes(&bytes).unwrap();
            prop_assert_ne!(result, Some(ControlCommand::Reboot));
        }
    }
}
