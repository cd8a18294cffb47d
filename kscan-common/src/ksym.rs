use core::fmt;

/// Which part of the kernel symbol table a symbol was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Core kernel and loadable module symbols.
    Mod,
    FtraceMod,
    Bpf,
    Kprobe,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mod => "MOD",
            Self::FtraceMod => "FTRACE_MOD",
            Self::Bpf => "BPF",
            Self::Kprobe => "KPROBE",
        }
    }

    /// Section a symbol belongs to, judged by the pseudo-module the kernel
    /// lists it under.
    pub fn section_of(module: &[u8]) -> Self {
        match module {
            b"__builtin__ftrace" => Self::FtraceMod,
            b"bpf" => Self::Bpf,
            b"__builtin__kprobes" => Self::Kprobe,
            _ => Self::Mod,
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of the symbol iterator and the section boundaries it has passed.
///
/// A zero boundary means the section has not ended yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KsymCursor {
    pub pos: u64,
    pub pos_mod_end: u64,
    pub pos_ftrace_mod_end: u64,
    pub pos_bpf_end: u64,
}

impl KsymCursor {
    /// Move to `pos`, which lies in `section`. Every earlier section that is
    /// still open is closed at `pos`.
    pub fn enter(&mut self, pos: u64, section: SymbolKind) {
        self.pos = pos;
        let close = |end: &mut u64| {
            if *end == 0 {
                *end = pos;
            }
        };
        match section {
            SymbolKind::Mod => {}
            SymbolKind::FtraceMod => close(&mut self.pos_mod_end),
            SymbolKind::Bpf => {
                close(&mut self.pos_mod_end);
                close(&mut self.pos_ftrace_mod_end);
            }
            SymbolKind::Kprobe => {
                close(&mut self.pos_mod_end);
                close(&mut self.pos_ftrace_mod_end);
                close(&mut self.pos_bpf_end);
            }
        }
    }

    /// The first boundary not yet crossed decides the kind. The order of
    /// the checks matters: later kinds are fallbacks.
    pub fn classify(&self) -> SymbolKind {
        if self.pos_mod_end == 0 || self.pos_mod_end > self.pos {
            SymbolKind::Mod
        } else if self.pos_ftrace_mod_end == 0 || self.pos_ftrace_mod_end > self.pos {
            SymbolKind::FtraceMod
        } else if self.pos_bpf_end == 0 || self.pos_bpf_end > self.pos {
            SymbolKind::Bpf
        } else {
            SymbolKind::Kprobe
        }
    }
}

/// Offset of a symbol's address from the previously emitted symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrDelta {
    /// No usable previous address.
    Unknown,
    Forward(u64),
    Backward(u64),
}

impl AddrDelta {
    /// A zero `prev` counts as "no previous address".
    pub fn between(prev: u64, cur: u64) -> Self {
        if prev == 0 {
            Self::Unknown
        } else if cur >= prev {
            Self::Forward(cur - prev)
        } else {
            Self::Backward(prev - cur)
        }
    }
}

impl fmt::Display for AddrDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => Ok(()),
            Self::Forward(d) => write!(f, "0x{d:x}"),
            Self::Backward(d) => write!(f, "-0x{d:x}"),
        }
    }
}
