use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use kscan_common::{Comm, KPath, Nodename};

use super::{Creds, ExeFile, OpenFile, TaskView};

/// Reads tasks and their descriptor tables from a procfs mount.
///
/// Anything that disappears between listing and reading is reported as
/// `None` rather than as an error: the tables change under our feet.
pub struct ProcFs {
    root: PathBuf,
    own_uts: Option<PathBuf>,
    nodename: Option<Nodename>,
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let own_uts = fs::read_link(root.join("self/ns/uts")).ok();
        let nodename = match nix::sys::utsname::uname() {
            Ok(uts) => Some(Nodename::from_os_str(uts.nodename())),
            Err(e) => {
                log::warn!("uname failed: {e}");
                None
            }
        };
        Self {
            root,
            own_uts,
            nodename,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pid_dir(&self, pid: i32) -> PathBuf {
        self.root.join(pid.to_string())
    }

    /// Process ids, ascending.
    pub fn pids(&self) -> Result<Vec<i32>> {
        let entries = fs::read_dir(&self.root)
            .with_context(|| format!("reading {}", self.root.display()))?;
        let mut pids: Vec<i32> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str()?.parse().ok())
            .collect();
        pids.sort_unstable();
        Ok(pids)
    }

    /// Thread ids of `pid`; empty once the process is gone.
    pub fn threads(&self, pid: i32) -> Vec<i32> {
        numeric_entries(&self.pid_dir(pid).join("task"))
    }

    /// Open descriptor numbers of `pid`; empty if gone or unreadable.
    pub fn fds(&self, pid: i32) -> Vec<u32> {
        numeric_entries(&self.pid_dir(pid).join("fd"))
    }

    /// The executable and host name are only resolved for the thread-group
    /// leader; other threads are never printed.
    pub fn task(&self, pid: i32, tid: i32) -> Option<TaskView> {
        let dir = self.pid_dir(pid).join("task").join(tid.to_string());
        let status = match fs::read_to_string(dir.join("status")) {
            Ok(s) => parse_status(&s),
            Err(e) => {
                log::debug!("task {pid}/{tid} vanished: {e}");
                return None;
            }
        };
        let (Some(task_pid), Some(tgid)) = (status.pid, status.tgid) else {
            log::debug!("task {pid}/{tid}: status has no Pid/Tgid");
            return None;
        };

        let comm = match fs::read(dir.join("comm")) {
            Ok(raw) => Comm::from_bytes(raw.strip_suffix(b"\n").unwrap_or(&raw)),
            Err(e) => {
                log::debug!("task {pid}/{tid}: comm unreadable: {e}");
                Comm::new()
            }
        };

        let (exe, nodename) = if task_pid == tgid {
            (self.exe(pid), self.nodename_of(pid))
        } else {
            (None, None)
        };

        Some(TaskView {
            pid: task_pid,
            tgid,
            comm,
            cred: status.creds,
            exe,
            nodename,
        })
    }

    fn exe(&self, pid: i32) -> Option<ExeFile> {
        let link = self.pid_dir(pid).join("exe");
        let target = match fs::read_link(&link) {
            Ok(t) => t,
            Err(e) => {
                log::debug!("pid {pid}: no executable: {e}");
                return None;
            }
        };
        let inode = fs::metadata(&link).ok().map(|m| m.ino());
        Some(ExeFile {
            inode,
            path: Some(KPath::from_os_str(target.as_os_str())),
        })
    }

    fn nodename_of(&self, pid: i32) -> Option<Nodename> {
        let dir = self.pid_dir(pid);
        let uts = fs::read_link(dir.join("ns/uts")).ok()?;
        if self.own_uts.as_ref() == Some(&uts) {
            return self.nodename;
        }
        let raw = fs::read(dir.join("root/etc/hostname")).ok()?;
        Some(Nodename::from_bytes(raw.trim_ascii()))
    }

    pub fn file(&self, pid: i32, fd: u32) -> Option<OpenFile> {
        let link = self.pid_dir(pid).join("fd").join(fd.to_string());
        let target = match fs::read_link(&link) {
            Ok(t) => t,
            Err(e) => {
                log::debug!("pid {pid} fd {fd} closed: {e}");
                return None;
            }
        };
        let bytes = target.as_os_str().as_bytes();
        let inode = fs::metadata(&link)
            .ok()
            .map(|m| m.ino())
            .or_else(|| anon_inode(bytes));
        if inode.is_none() {
            log::debug!("pid {pid} fd {fd}: no inode for {}", target.display());
        }
        Some(OpenFile {
            fd,
            inode,
            path: Some(KPath::from_bytes(bytes)),
        })
    }
}

#[derive(Debug, Default)]
struct Status {
    pid: Option<i32>,
    tgid: Option<i32>,
    creds: Option<Creds>,
}

fn parse_status(content: &str) -> Status {
    let mut status = Status::default();
    let mut uid = None;
    let mut gid = None;
    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        // Uid/Gid list real, effective, saved and fs ids; the first is the real one.
        let first = rest.split_whitespace().next();
        match key {
            "Pid" => status.pid = first.and_then(|v| v.parse().ok()),
            "Tgid" => status.tgid = first.and_then(|v| v.parse().ok()),
            "Uid" => uid = first.and_then(|v| v.parse().ok()),
            "Gid" => gid = first.and_then(|v| v.parse().ok()),
            _ => {}
        }
    }
    if let (Some(uid), Some(gid)) = (uid, gid) {
        status.creds = Some(Creds { uid, gid });
    }
    status
}

/// Inode number of an anonymous target such as `socket:[1234]`.
fn anon_inode(target: &[u8]) -> Option<u64> {
    let open = target.iter().position(|&b| b == b'[')?;
    let inner = target[open + 1..].strip_suffix(b"]")?;
    std::str::from_utf8(inner).ok()?.parse().ok()
}

fn numeric_entries<T: FromStr + Ord>(dir: &Path) -> Vec<T> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut ids: Vec<T> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().to_str()?.parse().ok())
        .collect();
    ids.sort_unstable();
    ids
}
