use core::fmt;

use crate::{AddrDelta, LineBuf, SymbolKind, NO_MODULE};

/// Renders an optional value, or nothing when it is unavailable.
struct Opt<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for Opt<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => fmt::Display::fmt(v, f),
            None => Ok(()),
        }
    }
}

/// One process, as seen on its thread-group leader.
///
/// The `ppid=` token on the wire carries the thread-group id.
#[derive(Debug, Clone, Copy)]
pub struct TaskRecord<'a> {
    pub pid: i32,
    pub tgid: i32,
    pub comm: &'a [u8],
    pub exe_inode: Option<u64>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub exe: &'a [u8],
}

impl TaskRecord<'_> {
    /// `pid=<int> ppid=<int> comm=<string>`
    pub fn write_basic(&self, line: &mut LineBuf) {
        line.put(format_args!("pid={} ppid={} comm=", self.pid, self.tgid));
        line.push_bytes(self.comm);
    }

    /// `pid= ppid= inode= uid= gid= comm= exe=`
    pub fn write_enriched(&self, line: &mut LineBuf) {
        line.put(format_args!(
            "pid={} ppid={} inode={} uid={} gid={} comm=",
            self.pid,
            self.tgid,
            Opt(self.exe_inode),
            Opt(self.uid),
            Opt(self.gid),
        ));
        line.push_bytes(self.comm);
        line.push_str(" exe=");
        line.push_bytes(self.exe);
    }
}

/// One open descriptor of one process.
#[derive(Debug, Clone, Copy)]
pub struct FileRecord<'a> {
    pub pid: i32,
    pub tgid: i32,
    pub fd: u32,
    pub inode: Option<u64>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub host: &'a [u8],
    pub path: &'a [u8],
    pub comm: &'a [u8],
    pub exe: &'a [u8],
}

impl FileRecord<'_> {
    pub fn write(&self, line: &mut LineBuf) {
        line.put(format_args!(
            "pid={} ppid={} fd={} inode={} uid={} gid={} host=",
            self.pid,
            self.tgid,
            self.fd,
            Opt(self.inode),
            Opt(self.uid),
            Opt(self.gid),
        ));
        line.push_bytes(self.host);
        line.push_str(" file=");
        line.push_bytes(self.path);
        line.push_str(" comm=");
        line.push_bytes(self.comm);
        line.push_str(" exe=");
        line.push_bytes(self.exe);
    }
}

/// One kernel symbol. It is written as two physical lines: the address
/// delta, then the entry itself.
#[derive(Debug, Clone, Copy)]
pub struct KsymRecord<'a> {
    pub delta: AddrDelta,
    pub addr: u64,
    pub atype: u8,
    pub name: &'a [u8],
    pub module: &'a [u8],
    pub kind: SymbolKind,
    /// Reserved column, never populated.
    pub max_size: Option<u64>,
}

impl KsymRecord<'_> {
    pub fn write_delta(&self, line: &mut LineBuf) {
        line.put(format_args!("{}", self.delta));
    }

    pub fn write_entry(&self, line: &mut LineBuf) {
        line.put(format_args!(
            "addr=0x{:x} atype={} func=",
            self.addr, self.atype as char
        ));
        line.push_bytes(self.name);
        line.push_str(" name=");
        if self.module.is_empty() {
            line.push_str(NO_MODULE);
        } else {
            line.push_bytes(self.module);
        }
        line.put(format_args!(" type={} ", self.kind));
        if let Some(size) = self.max_size {
            line.put(format_args!("0x{size:x}"));
        }
    }
}
