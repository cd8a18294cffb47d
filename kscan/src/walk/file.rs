use std::io::{self, Write};

use kscan_common::{FileRecord, KPath, LineBuf, FILE_HEADER};

use super::{Carry, Outcome, SeqFile};
use crate::source::{Creds, OpenFile, TaskView};

/// Reusable per-record storage of the file walker.
///
/// Cleared after every record, so a field that fails to resolve for one
/// descriptor can never show the previous descriptor's value.
#[derive(Debug, Default)]
pub struct FileScratch {
    pub path: KPath,
    pub exe_path: KPath,
    pub exe_inode: Option<u64>,
}

impl FileScratch {
    fn clear(&mut self) {
        self.path.clear();
        self.exe_path.clear();
        self.exe_inode = None;
    }

    #[cfg(test)]
    pub fn is_clear(&self) -> bool {
        self.path.is_empty() && self.exe_path.is_empty() && self.exe_inode.is_none()
    }
}

/// Emits one line per open descriptor, after a one-time column header.
pub struct FileWalker {
    scratch: FileScratch,
    creds: Carry<Creds>,
    line: LineBuf,
}

impl FileWalker {
    pub fn new(reuse_stale_values: bool) -> Self {
        Self {
            scratch: FileScratch::default(),
            creds: Carry::new(reuse_stale_values),
            line: LineBuf::new(),
        }
    }

    #[cfg(test)]
    pub fn scratch(&self) -> &FileScratch {
        &self.scratch
    }

    pub fn visit<W: Write>(
        &mut self,
        seq: u64,
        task: Option<&TaskView>,
        file: Option<&OpenFile>,
        out: &mut SeqFile<W>,
    ) -> io::Result<Outcome> {
        if seq == 0 {
            out.print_str(FILE_HEADER)?;
        }
        let (Some(task), Some(file)) = (task, file) else {
            return Ok(Outcome::Skipped);
        };

        let creds = self.creds.resolve(task.cred);
        if let Some(exe) = task.exe {
            self.scratch.exe_inode = exe.inode;
            if let Some(path) = exe.path {
                self.scratch.exe_path = path;
            }
        }
        if let Some(path) = file.path {
            self.scratch.path = path;
        }

        let mut comm = task.comm;
        comm.sanitize();
        let mut host = task.nodename.unwrap_or_default();
        host.sanitize();
        self.scratch.path.sanitize();
        self.scratch.exe_path.sanitize();
        log::trace!(
            "pid {} fd {} exe inode {:?}",
            task.pid,
            file.fd,
            self.scratch.exe_inode
        );

        self.line.clear();
        FileRecord {
            pid: task.pid,
            tgid: task.tgid,
            fd: file.fd,
            inode: file.inode,
            uid: creds.map(|c| c.uid),
            gid: creds.map(|c| c.gid),
            host: host.as_bytes(),
            path: self.scratch.path.as_bytes(),
            comm: comm.as_bytes(),
            exe: self.scratch.exe_path.as_bytes(),
        }
        .write(&mut self.line);

        let written = out.print(&self.line);
        self.scratch.clear();
        written.map(|()| Outcome::Emitted)
    }
}

#[cfg(test)]
mod tests {
    use kscan_common::{Comm, Nodename};

    use super::*;
    use crate::source::ExeFile;

    fn task() -> TaskView {
        TaskView {
            pid: 300,
            tgid: 300,
            comm: Comm::from_bytes(b"sshd"),
            cred: Some(Creds { uid: 0, gid: 0 }),
            exe: Some(ExeFile {
                inode: Some(99),
                path: Some(KPath::from_bytes(b"/usr/sbin/sshd")),
            }),
            nodename: Some(Nodename::from_bytes(b"web01")),
        }
    }

    fn file(fd: u32, path: Option<&[u8]>) -> OpenFile {
        OpenFile {
            fd,
            inode: Some(4000 + u64::from(fd)),
            path: path.map(KPath::from_bytes),
        }
    }

    #[test]
    fn header_precedes_first_record_only() {
        let mut walker = FileWalker::new(false);
        let mut out = SeqFile::new(Vec::new());
        let t = task();
        walker
            .visit(0, Some(&t), Some(&file(0, Some(b"/dev/null"))), &mut out)
            .unwrap();
        walker
            .visit(1, Some(&t), Some(&file(1, Some(b"/var/log/auth.log"))), &mut out)
            .unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                FILE_HEADER,
                "pid=300 ppid=300 fd=0 inode=4000 uid=0 gid=0 host=web01 file=/dev/null comm=sshd exe=/usr/sbin/sshd",
                "pid=300 ppid=300 fd=1 inode=4001 uid=0 gid=0 host=web01 file=/var/log/auth.log comm=sshd exe=/usr/sbin/sshd",
            ]
        );
    }

    #[test]
    fn null_task_or_file_contributes_nothing() {
        let mut walker = FileWalker::new(false);
        let mut out = SeqFile::new(Vec::new());
        let t = task();
        let f = file(3, Some(b"/etc/passwd"));
        assert_eq!(walker.visit(5, None, Some(&f), &mut out).unwrap(), Outcome::Skipped);
        assert_eq!(walker.visit(6, Some(&t), None, &mut out).unwrap(), Outcome::Skipped);
        assert_eq!(out.lines(), 0);
    }

    #[test]
    fn header_is_written_even_when_first_object_is_null() {
        let mut walker = FileWalker::new(false);
        let mut out = SeqFile::new(Vec::new());
        assert_eq!(walker.visit(0, None, None, &mut out).unwrap(), Outcome::Skipped);
        assert_eq!(String::from_utf8(out.into_inner()).unwrap(), format!("{FILE_HEADER}\n"));
    }

    #[test]
    fn scratch_is_reset_after_each_record() {
        let mut walker = FileWalker::new(false);
        let mut out = SeqFile::new(Vec::new());
        assert!(walker.scratch().is_clear());

        let t = task();
        walker
            .visit(0, Some(&t), Some(&file(4, Some(b"/tmp/x"))), &mut out)
            .unwrap();
        assert!(walker.scratch().is_clear());

        // A descriptor whose path cannot be resolved must not inherit /tmp/x.
        let mut bare = task();
        bare.exe = None;
        walker.visit(1, Some(&bare), Some(&file(5, None)), &mut out).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.lines().last().unwrap().ends_with("file= comm=sshd exe="));
    }

    #[test]
    fn path_and_comm_are_sanitized() {
        let mut walker = FileWalker::new(false);
        let mut out = SeqFile::new(Vec::new());
        let mut t = task();
        t.comm = Comm::from_bytes(b"a\nb");
        walker
            .visit(1, Some(&t), Some(&file(7, Some(b"/tmp/new\nline"))), &mut out)
            .unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert_eq!(text.matches('\n').count(), 1);
        assert!(text.contains("file=/tmp/new_line comm=a_b"));
    }

    #[test]
    fn host_and_exe_are_sanitized() {
        let mut walker = FileWalker::new(false);
        let mut out = SeqFile::new(Vec::new());
        let mut t = task();
        t.nodename = Some(Nodename::from_bytes(b"a\nb"));
        t.exe = Some(ExeFile {
            inode: Some(99),
            path: Some(KPath::from_bytes(b"/opt/bad\nname")),
        });
        walker
            .visit(1, Some(&t), Some(&file(2, Some(b"/dev/pts/0"))), &mut out)
            .unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert_eq!(text.matches('\n').count(), 1);
        assert!(text.contains(" host=a_b "));
        assert!(text.ends_with(" exe=/opt/bad_name\n"));
    }
}
