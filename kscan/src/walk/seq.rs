use std::io::{self, Write};

use kscan_common::LineBuf;

/// Append-only, newline-framed record stream.
pub struct SeqFile<W: Write> {
    out: W,
    lines: u64,
    truncated: u64,
}

impl<W: Write> SeqFile<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            lines: 0,
            truncated: 0,
        }
    }

    pub fn print(&mut self, line: &LineBuf) -> io::Result<()> {
        if line.is_truncated() {
            self.truncated += 1;
            log::debug!("line truncated at {} bytes", line.len());
        }
        self.write_line(line.as_bytes())
    }

    pub fn print_str(&mut self, s: &str) -> io::Result<()> {
        self.write_line(s.as_bytes())
    }

    fn write_line(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.out.write_all(bytes)?;
        self.out.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    /// Lines written so far.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Lines that hit the line buffer capacity.
    pub fn truncated(&self) -> u64 {
        self.truncated
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_line_is_newline_terminated() {
        let mut seq = SeqFile::new(Vec::new());
        let mut line = LineBuf::new();
        line.push_str("pid=1");
        seq.print(&line).unwrap();
        seq.print_str("").unwrap();
        assert_eq!(seq.lines(), 2);
        assert_eq!(seq.into_inner(), b"pid=1\n\n");
    }

    #[test]
    fn counts_truncated_lines() {
        let mut seq = SeqFile::new(Vec::new());
        let mut line = LineBuf::new();
        line.push_bytes(&[b'x'; kscan_common::LINE_LEN + 10]);
        seq.print(&line).unwrap();
        assert_eq!(seq.truncated(), 1);
        assert_eq!(seq.into_inner().len(), kscan_common::LINE_LEN + 1);
    }
}
