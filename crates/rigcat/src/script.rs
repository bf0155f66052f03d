//! Command file reader
//!
//! One command per line. Everything from `#` to the end of the line is a
//! comment; blank lines are skipped.

use std::io::{self, BufRead, Lines};

/// Iterator over the command lines of a text source
pub struct CommandScript<R> {
    lines: Lines<R>,
}

impl<R: BufRead> CommandScript<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl<R: BufRead> Iterator for CommandScript<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            let text = match line.find('#') {
                Some(pos) => &line[..pos],
                None => &line,
            };
            let text = text.trim();
            if !text.is_empty() {
                return Some(Ok(text.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_comments_and_blanks() {
        let source = "# setup\nFREQ 7074000\n\n   \nMODE USB  # voice\n  PTT ON\n#\n";
        let lines: Vec<String> = CommandScript::new(source.as_bytes())
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(lines, vec!["FREQ 7074000", "MODE USB", "PTT ON"]);
    }

    #[test]
    fn test_empty_source() {
        assert!(CommandScript::new("".as_bytes()).next().is_none());
        assert!(CommandScript::new("# only\n\n".as_bytes()).next().is_none());
    }

    #[test]
    fn test_crlf_lines() {
        let mut script = CommandScript::new("VFO B\r\nSPLIT\r\n".as_bytes());
        assert_eq!(script.next().unwrap().unwrap(), "VFO B");
        assert_eq!(script.next().unwrap().unwrap(), "SPLIT");
        assert!(script.next().is_none());
    }

    #[test]
    fn test_invalid_utf8_is_error() {
        let mut script = CommandScript::new(&[0xFF, 0xFE, b'\n'][..]);
        assert!(script.next().unwrap().is_err());
    }
}
