//! Record producers, one per kernel table.
//!
//! A walker is handed one live object at a time by a driver, turns it into
//! zero or more lines on the [`SeqFile`], and keeps whatever state it needs
//! between calls to itself. Walkers never share state with each other.

mod carry;
mod file;
mod ksym;
mod seq;
mod task;

pub use carry::Carry;
pub use file::FileWalker;
pub use ksym::KsymWalker;
pub use seq::SeqFile;
pub use task::{TaskFormat, TaskWalker};

/// What a single visit produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Emitted,
    /// Null object, or one the walker filters out.
    Skipped,
    /// The call only wrote the column header.
    HeaderOnly,
}
