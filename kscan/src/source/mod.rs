//! Live kernel objects as the drivers hand them to the walkers.
//!
//! Every nested `Option` stands for a pointer that may be null when the
//! object is read: a task without credentials, a kernel thread without an
//! executable, an executable whose inode could not be reached.

pub mod kallsyms;
pub mod procfs;

use kscan_common::{Comm, KPath, KsymCursor, ModName, Nodename, SymName};

/// Real user and group ids of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Creds {
    pub uid: u32,
    pub gid: u32,
}

/// The executable backing a task's address space.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExeFile {
    pub inode: Option<u64>,
    pub path: Option<KPath>,
}

#[derive(Debug, Clone, Copy)]
pub struct TaskView {
    pub pid: i32,
    pub tgid: i32,
    pub comm: Comm,
    pub cred: Option<Creds>,
    pub exe: Option<ExeFile>,
    /// Node name of the task's UTS namespace.
    pub nodename: Option<Nodename>,
}

impl TaskView {
    pub fn is_group_leader(&self) -> bool {
        self.pid == self.tgid
    }
}

/// One open descriptor. `inode` is unset when the target cannot be
/// stat'ed and names no anonymous inode number.
#[derive(Debug, Clone, Copy)]
pub struct OpenFile {
    pub fd: u32,
    pub inode: Option<u64>,
    pub path: Option<KPath>,
}

/// One entry of the kernel symbol table and the iterator position it was
/// read at.
#[derive(Debug, Clone, Copy)]
pub struct Ksym {
    pub value: u64,
    pub show_value: bool,
    pub kind_code: u8,
    pub name: SymName,
    pub module_name: ModName,
    pub cursor: KsymCursor,
}
