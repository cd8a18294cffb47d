//! Drivers: walk a live table and feed each object to its walker in order.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::source::kallsyms::Kallsyms;
use crate::source::procfs::ProcFs;
use crate::walk::{FileWalker, KsymWalker, Outcome, SeqFile, TaskWalker};

/// Per-run tally of walker calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpStats {
    pub visited: u64,
    pub emitted: u64,
    pub skipped: u64,
}

impl DumpStats {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Emitted => {
                self.visited += 1;
                self.emitted += 1;
            }
            Outcome::Skipped => {
                self.visited += 1;
                self.skipped += 1;
            }
            Outcome::HeaderOnly => {}
        }
    }

    fn log(&self, what: &str) {
        log::info!(
            "{what}: visited {}, emitted {}, skipped {}",
            self.visited,
            self.emitted,
            self.skipped
        );
    }
}

/// Every thread of every process; the walker keeps the group leaders.
pub fn tasks<W: Write>(
    procfs: &ProcFs,
    walker: &mut TaskWalker,
    out: &mut SeqFile<W>,
) -> Result<DumpStats> {
    let mut stats = DumpStats::default();
    for pid in procfs.pids()? {
        for tid in procfs.threads(pid) {
            let task = procfs.task(pid, tid);
            let outcome = walker
                .visit(task.as_ref(), out)
                .context("writing task record")?;
            stats.record(outcome);
        }
    }
    stats.log("tasks");
    Ok(stats)
}

/// Every open descriptor of every process.
pub fn files<W: Write>(
    procfs: &ProcFs,
    walker: &mut FileWalker,
    out: &mut SeqFile<W>,
) -> Result<DumpStats> {
    let mut stats = DumpStats::default();
    let mut seq = 0u64;
    for pid in procfs.pids()? {
        let fds = procfs.fds(pid);
        if fds.is_empty() {
            continue;
        }
        // Read once per process; it may still exit while its fds are walked.
        let task = procfs.task(pid, pid);
        for fd in fds {
            let file = procfs.file(pid, fd);
            let outcome = walker
                .visit(seq, task.as_ref(), file.as_ref(), out)
                .context("writing file record")?;
            stats.record(outcome);
            seq += 1;
        }
    }
    stats.log("files");
    Ok(stats)
}

/// The kernel symbol table. Sequence 0 is a header-only call so the first
/// symbol is not swallowed by it. Every run starts with an empty delta,
/// even on a walker that has been used before.
pub fn ksyms<R: BufRead, W: Write>(
    symbols: Kallsyms<R>,
    walker: &mut KsymWalker,
    out: &mut SeqFile<W>,
) -> Result<DumpStats> {
    let mut stats = DumpStats::default();
    walker.reset();
    stats.record(walker.visit(0, None, out).context("writing symbol header")?);
    for (seq, sym) in (1u64..).zip(symbols) {
        let sym = sym.context("reading kallsyms")?;
        let outcome = walker
            .visit(seq, Some(&sym), out)
            .context("writing symbol record")?;
        stats.record(outcome);
    }
    stats.log("ksyms");
    Ok(stats)
}
