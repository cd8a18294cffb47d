use core::fmt;

use crate::LINE_LEN;

/// Fixed-capacity buffer that one output line is composed into.
///
/// Writes past the capacity are dropped and the line is flagged as
/// truncated. The terminating newline is added by the sink, not stored here.
pub struct LineBuf {
    buf: [u8; LINE_LEN],
    len: usize,
    truncated: bool,
}

impl LineBuf {
    pub const fn new() -> Self {
        Self {
            buf: [0u8; LINE_LEN],
            len: 0,
            truncated: false,
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.truncated = false;
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        let room = LINE_LEN - self.len;
        let n = bytes.len().min(room);
        self.buf[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
        if n < bytes.len() {
            self.truncated = true;
        }
    }

    pub fn push_str(&mut self, s: &str) {
        self.push_bytes(s.as_bytes());
    }

    /// Append formatted text. Never fails; overflow only truncates.
    pub fn put(&mut self, args: fmt::Arguments<'_>) {
        let _ = fmt::Write::write_fmt(self, args);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl Default for LineBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Write for LineBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        // Never fails: a long line is truncated rather than aborted.
        self.push_str(s);
        Ok(())
    }
}
