//! Fake procfs trees for tests.

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub struct FakeProc {
    dir: TempDir,
    targets: TempDir,
}

impl FakeProc {
    pub fn new() -> Self {
        Self {
            dir: tempfile::Builder::new()
                .prefix("kscan-proc")
                .tempdir()
                .expect("tempdir"),
            targets: tempfile::Builder::new()
                .prefix("kscan-fs")
                .tempdir()
                .expect("tempdir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn add_dir(&self, rel: &str) {
        fs::create_dir_all(self.root().join(rel)).expect("mkdir");
    }

    pub fn add_file(&self, rel: &str, content: &[u8]) {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, content).expect("write");
    }

    fn add_link(&self, rel: &str, target: &Path) {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        symlink(target, path).expect("symlink");
    }

    /// Writes `<pid>/task/<tid>/{status,comm}` the way procfs lays them out.
    pub fn add_thread(&self, pid: i32, tid: i32, comm: &[u8], uid: u32, gid: u32) {
        let status = format!(
            "Name:\t{name}\nUmask:\t0022\nState:\tS (sleeping)\nTgid:\t{pid}\nNgid:\t0\n\
             Pid:\t{tid}\nPPid:\t1\nUid:\t{uid}\t{uid}\t{uid}\t{uid}\nGid:\t{gid}\t{gid}\t{gid}\t{gid}\n",
            name = String::from_utf8_lossy(comm),
        );
        self.add_file(&format!("{pid}/task/{tid}/status"), status.as_bytes());
        let mut raw = comm.to_vec();
        raw.push(b'\n');
        self.add_file(&format!("{pid}/task/{tid}/comm"), &raw);
    }

    /// A real file outside the proc tree that links can point at.
    pub fn add_target(&self, rel: &str, content: &[u8]) -> PathBuf {
        let path = self.targets.path().join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, content).expect("write");
        path
    }

    pub fn set_exe(&self, pid: i32, target: &Path) {
        self.add_link(&format!("{pid}/exe"), target);
    }

    pub fn add_fd(&self, pid: i32, fd: u32, target: &Path) {
        self.add_link(&format!("{pid}/fd/{fd}"), target);
    }

    pub fn set_uts(&self, pid: i32, ns: &str) {
        self.add_link(&format!("{pid}/ns/uts"), Path::new(ns));
    }

    pub fn set_own_uts(&self, ns: &str) {
        self.add_link("self/ns/uts", Path::new(ns));
    }
}
