//! Resolution against synthetic process-information trees.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use sockowner::{
    BufferPool, ConnectionKey, Error, Network, ProcSearcher, Resolver, ResolverConfig, Result,
    SocketLookup, SocketOwner,
};

use crate::common::{ProcTree, euid};

/// Lookup backend answering from a fixed table.
struct TableLookup(Vec<(ConnectionKey, SocketOwner)>);

impl SocketLookup for TableLookup {
    fn lookup(&self, key: &ConnectionKey) -> Result<SocketOwner> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, owner)| *owner)
            .ok_or_else(Error::no_socket)
    }
}

fn addr(s: &str) -> SocketAddr {
    s.parse().unwrap()
}

#[test]
fn test_curl_scenario() {
    let tree = ProcTree::new();
    tree.add_entry("self")
        .add_entry("sys")
        .add_process(1, "/sbin/init", &["/dev/console", "socket:[12]"])
        .add_process(4242, "/usr/bin/curl", &["/dev/pts/0", "pipe:[9]", "socket:[88221]"]);

    let key = ConnectionKey::new(Network::Tcp, addr("127.0.0.1:51000"), addr("93.184.216.34:443"));
    let lookup = TableLookup(vec![(key, SocketOwner { inode: 88221, uid: euid() })]);
    let resolver = Resolver::with_lookup(lookup, ResolverConfig::new().proc_root(tree.root()));

    let exe = resolver.resolve_str("tcp", key.local, key.remote).unwrap();
    assert_eq!(exe, Path::new("/usr/bin/curl"));

    let record = resolver.resolve_record(Network::Tcp, key.local, key.remote).unwrap();
    assert_eq!(record.pid, "4242");
}

#[test]
fn test_udp_and_tcp_resolve_independently() {
    let tree = ProcTree::new();
    tree.add_process(300, "/usr/bin/dig", &["socket:[501]"])
        .add_process(301, "/usr/bin/wget", &["socket:[502]"]);

    let local = addr("10.0.0.2:40000");
    let remote = addr("10.0.0.1:53");
    let lookup = TableLookup(vec![
        (ConnectionKey::new(Network::Udp, local, remote), SocketOwner { inode: 501, uid: euid() }),
        (ConnectionKey::new(Network::Tcp, local, remote), SocketOwner { inode: 502, uid: euid() }),
    ]);
    let resolver = Resolver::with_lookup(lookup, ResolverConfig::new().proc_root(tree.root()));

    assert_eq!(resolver.resolve(Network::Udp, local, remote).unwrap(), Path::new("/usr/bin/dig"));
    assert_eq!(resolver.resolve(Network::Tcp, local, remote).unwrap(), Path::new("/usr/bin/wget"));
}

#[test]
fn test_shared_socket_returns_a_holder() {
    let tree = ProcTree::new();
    tree.add_process(10, "/usr/sbin/nginx", &["socket:[77]"])
        .add_process(11, "/usr/sbin/nginx-worker", &["socket:[77]"]);

    let record = ProcSearcher::with_root(tree.root()).find_process(77, euid()).unwrap();
    assert!(record.pid == "10" || record.pid == "11");
    assert!(record.path.starts_with("/usr/sbin"));
}

#[test]
fn test_not_found_reports_identity() {
    let tree = ProcTree::new();
    tree.add_process(1, "/sbin/init", &["socket:[1]"]);

    let err = ProcSearcher::with_root(tree.root())
        .find_executable(424242, euid())
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), format!("inode 424242 of uid {} not found", euid()));
}

#[test]
fn test_concurrent_searches_share_pool() {
    let tree = ProcTree::new();
    for pid in 100..150 {
        let link = format!("socket:[{}]", pid * 10);
        tree.add_process(pid, "/usr/bin/app", &["/dev/null", link.as_str()]);
    }

    let pool = Arc::new(BufferPool::new());
    let searcher = ProcSearcher::with_root(tree.root()).pool(Arc::clone(&pool));

    thread::scope(|s| {
        for t in 0..4u32 {
            let searcher = &searcher;
            s.spawn(move || {
                for pid in 100..150u32 {
                    if pid % 4 != t {
                        continue;
                    }
                    let record = searcher.find_process(pid * 10, euid()).unwrap();
                    assert_eq!(record.pid, pid.to_string());
                }
            });
        }
    });

    // Two buffers per concurrent search at most.
    assert!(pool.allocations() <= 8, "allocations: {}", pool.allocations());
    assert!(pool.allocations() >= 2);
}

#[test]
fn test_missing_root_is_io_error() {
    let resolver = Resolver::with_lookup(
        TableLookup(vec![(
            ConnectionKey::new(Network::Tcp, addr("127.0.0.1:1"), addr("127.0.0.1:2")),
            SocketOwner { inode: 1, uid: 0 },
        )]),
        ResolverConfig::new().proc_root("/nonexistent/sockowner-root"),
    );

    let err = resolver
        .resolve(Network::Tcp, addr("127.0.0.1:1"), addr("127.0.0.1:2"))
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
