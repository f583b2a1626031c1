//! Resolution of this process's own sockets through the running kernel.

use std::net::{TcpListener, TcpStream, UdpSocket};

use sockowner::{Network, Resolver, SockDiag};

fn own_exe() -> std::path::PathBuf {
    std::env::current_exe().expect("current exe")
}

#[test]
fn test_resolve_own_tcp_connection() {
    require_sock_diag!();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
    let (server, _) = listener.accept().unwrap();

    let resolver = Resolver::new();
    let exe = resolver
        .resolve(Network::Tcp, client.local_addr().unwrap(), client.peer_addr().unwrap())
        .unwrap();
    assert_eq!(exe, own_exe());

    let exe = resolver
        .resolve(Network::Tcp, server.local_addr().unwrap(), server.peer_addr().unwrap())
        .unwrap();
    assert_eq!(exe, own_exe());
}

#[test]
fn test_resolve_own_udp_socket() {
    require_sock_diag!();

    let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.connect(peer.local_addr().unwrap()).unwrap();

    let exe = sockowner::find_process_path(
        "udp",
        socket.local_addr().unwrap(),
        peer.local_addr().unwrap(),
    )
    .unwrap();
    assert_eq!(exe, own_exe());
}

#[test]
fn test_resolve_own_tcp6_connection() {
    require_sock_diag!();

    let Ok(listener) = TcpListener::bind("[::1]:0") else {
        eprintln!("Skipping test: no IPv6 loopback");
        return;
    };
    let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();

    let owner = SockDiag::new()
        .resolve_socket(Network::Tcp, client.local_addr().unwrap(), client.peer_addr().unwrap())
        .unwrap();
    // SAFETY: geteuid has no preconditions.
    assert_eq!(owner.uid, unsafe { libc::geteuid() });
    assert_ne!(owner.inode, 0);
}

#[test]
fn test_closed_connection_not_found() {
    require_sock_diag!();

    // Port freed by dropping the listener; no connection uses it.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = Resolver::new()
        .resolve(Network::Tcp, addr, "127.0.0.1:9".parse().unwrap())
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");
}
