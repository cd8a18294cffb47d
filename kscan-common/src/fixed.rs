use core::fmt;

/// Replace every newline byte with an underscore.
///
/// The whole slice is scanned, not just the logical string, so bytes past
/// the terminator are covered too.
pub fn sanitize(buf: &mut [u8]) {
    for b in buf.iter_mut() {
        if *b == b'\n' {
            *b = b'_';
        }
    }
}

/// Fixed-capacity, NUL-terminated byte string.
///
/// Copies are bounded to `N - 1` bytes so the buffer always holds a
/// terminator, mirroring how kernel string reads behave.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FixedStr<const N: usize> {
    buf: [u8; N],
}

impl<const N: usize> FixedStr<N> {
    pub const CAPACITY: usize = N;

    pub const fn new() -> Self {
        Self { buf: [0u8; N] }
    }

    /// Build from raw bytes, truncating to the capacity.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut s = Self::new();
        s.set(bytes);
        s
    }

    /// Overwrite the contents. Any previous bytes are zeroed first.
    pub fn set(&mut self, bytes: &[u8]) {
        self.clear();
        let n = bytes.len().min(N.saturating_sub(1));
        self.buf[..n].copy_from_slice(&bytes[..n]);
    }

    pub fn clear(&mut self) {
        self.buf = [0u8; N];
    }

    /// Logical contents, up to the first NUL.
    pub fn as_bytes(&self) -> &[u8] {
        let end = self.buf.iter().position(|&b| b == 0).unwrap_or(N);
        &self.buf[..end]
    }

    /// The full backing buffer, terminator and trailing bytes included.
    pub fn raw(&self) -> &[u8; N] {
        &self.buf
    }

    pub fn raw_mut(&mut self) -> &mut [u8; N] {
        &mut self.buf
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.first().map_or(true, |&b| b == 0)
    }

    pub fn sanitize(&mut self) {
        sanitize(&mut self.buf);
    }
}

#[cfg(feature = "userspace")]
impl<const N: usize> FixedStr<N> {
    pub fn from_os_str(s: &std::ffi::OsStr) -> Self {
        use std::os::unix::ffi::OsStrExt;
        Self::from_bytes(s.as_bytes())
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }
}

impl<const N: usize> Default for FixedStr<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for FixedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match core::str::from_utf8(self.as_bytes()) {
            Ok(s) => write!(f, "{s:?}"),
            Err(_) => write!(f, "{:?}", self.as_bytes()),
        }
    }
}
