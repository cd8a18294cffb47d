#![cfg_attr(not(feature = "userspace"), no_std)]

//! Types shared by the kscan walkers.
//!
//! Everything here works on caller-owned, fixed-capacity buffers so the same
//! record layout and line composition can run where no allocator exists.

mod fixed;
mod ksym;
mod line;
mod record;

pub use fixed::{sanitize, FixedStr};
pub use ksym::{AddrDelta, KsymCursor, SymbolKind};
pub use line::LineBuf;
pub use record::{FileRecord, KsymRecord, TaskRecord};

/// Task command name capacity, terminator included.
pub const TASK_COMM_LEN: usize = 16;
/// Resolved path capacity.
pub const PATH_LEN: usize = 1024;
/// UTS node name capacity, terminator included.
pub const NODENAME_LEN: usize = 65;
/// Kernel symbol name capacity.
pub const KSYM_NAME_LEN: usize = 512;
/// Kernel module name capacity.
pub const MODULE_NAME_LEN: usize = 56;
/// Upper bound on a single emitted line.
pub const LINE_LEN: usize = 4096;

pub type Comm = FixedStr<TASK_COMM_LEN>;
pub type KPath = FixedStr<PATH_LEN>;
pub type Nodename = FixedStr<NODENAME_LEN>;
pub type SymName = FixedStr<KSYM_NAME_LEN>;
pub type ModName = FixedStr<MODULE_NAME_LEN>;

/// Column header written once before the first file record.
pub const FILE_HEADER: &str = "    pid      tgid       fd      inode      file      exe";

/// Column header written once at the start of a symbol run.
pub const KSYM_HEADER: &str = "ADDR TYPE NAME MODULE_NAME KIND MAX_SIZE";

/// Placeholder for symbols that do not belong to a module.
pub const NO_MODULE: &str = "none";
