//! Common test utilities for integration tests.
//!
//! Provides `ProcTree` for building synthetic process-information trees and
//! helper macros for conditional test execution.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;

use sockowner::netlink::{NetlinkSocket, Protocol};

/// A synthetic `/proc` in a temporary directory, removed on drop.
pub struct ProcTree {
    dir: tempfile::TempDir,
}

impl ProcTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Add a process directory with an `exe` link and one descriptor per
    /// entry of `links`, numbered from 0.
    pub fn add_process(&self, pid: u32, exe: &str, links: &[&str]) -> &Self {
        let dir = self.root().join(pid.to_string());
        fs::create_dir_all(dir.join("fd")).expect("create fd dir");
        symlink(exe, dir.join("exe")).expect("create exe link");
        for (fd, target) in links.iter().enumerate() {
            symlink(target, dir.join("fd").join(fd.to_string())).expect("create fd link");
        }
        self
    }

    /// Add a non-process entry, like `/proc/self` or `/proc/net`.
    pub fn add_entry(&self, name: &str) -> &Self {
        fs::create_dir_all(self.root().join(name)).expect("create entry");
        self
    }
}

/// Effective uid of the test process; synthetic trees are owned by it.
pub fn euid() -> u32 {
    // SAFETY: geteuid has no preconditions.
    unsafe { libc::geteuid() }
}

/// Check if the kernel lets us open a socket diagnostics channel.
pub fn has_sock_diag() -> bool {
    NetlinkSocket::new(Protocol::SockDiag).is_ok()
}

/// Skip the test if NETLINK_SOCK_DIAG is unavailable.
#[macro_export]
macro_rules! require_sock_diag {
    () => {
        if !crate::common::has_sock_diag() {
            eprintln!("Skipping test: NETLINK_SOCK_DIAG unavailable");
            return;
        }
    };
}
