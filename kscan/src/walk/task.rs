use std::io::{self, Write};

use kscan_common::{KPath, LineBuf, TaskRecord};
use serde::Deserialize;

use super::{Carry, Outcome, SeqFile};
use crate::source::{Creds, TaskView};

/// Which process line layout to emit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFormat {
    /// `pid ppid comm`
    Basic,
    /// Adds executable inode, credentials and executable path.
    #[default]
    Enriched,
}

/// Emits one line per thread-group leader; other threads are dropped.
pub struct TaskWalker {
    format: TaskFormat,
    creds: Carry<Creds>,
    exe_inode: Carry<u64>,
    exe_path: Carry<KPath>,
    line: LineBuf,
}

impl TaskWalker {
    pub fn new(format: TaskFormat, reuse_stale_values: bool) -> Self {
        Self {
            format,
            creds: Carry::new(reuse_stale_values),
            exe_inode: Carry::new(reuse_stale_values),
            exe_path: Carry::new(reuse_stale_values),
            line: LineBuf::new(),
        }
    }

    pub fn visit<W: Write>(
        &mut self,
        task: Option<&TaskView>,
        out: &mut SeqFile<W>,
    ) -> io::Result<Outcome> {
        let Some(task) = task else {
            return Ok(Outcome::Skipped);
        };
        if !task.is_group_leader() {
            return Ok(Outcome::Skipped);
        }

        let mut comm = task.comm;
        comm.sanitize();

        self.line.clear();
        match self.format {
            TaskFormat::Basic => TaskRecord {
                pid: task.pid,
                tgid: task.tgid,
                comm: comm.as_bytes(),
                exe_inode: None,
                uid: None,
                gid: None,
                exe: b"",
            }
            .write_basic(&mut self.line),
            TaskFormat::Enriched => {
                let creds = self.creds.resolve(task.cred);
                let exe = task.exe.unwrap_or_default();
                let exe_inode = self.exe_inode.resolve(exe.inode);
                let mut exe_path = self.exe_path.resolve(exe.path).unwrap_or_default();
                exe_path.sanitize();

                TaskRecord {
                    pid: task.pid,
                    tgid: task.tgid,
                    comm: comm.as_bytes(),
                    exe_inode,
                    uid: creds.map(|c| c.uid),
                    gid: creds.map(|c| c.gid),
                    exe: exe_path.as_bytes(),
                }
                .write_enriched(&mut self.line);
            }
        }

        out.print(&self.line)?;
        Ok(Outcome::Emitted)
    }
}
