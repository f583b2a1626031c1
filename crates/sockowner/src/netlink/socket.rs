//! Low-level blocking netlink socket operations.

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicU32, Ordering};

use bytes::BytesMut;
use netlink_sys::{Socket, SocketAddr, protocols};

use crate::error::{Error, Result};

/// Netlink protocol families used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Socket diagnostics (inet_diag / sock_diag).
    SockDiag,
}

impl Protocol {
    fn as_isize(self) -> isize {
        match self {
            Protocol::SockDiag => protocols::NETLINK_SOCK_DIAG,
        }
    }
}

/// Blocking netlink socket.
///
/// The descriptor is closed when the socket is dropped, so a socket opened
/// for a single request is released on every exit path.
pub struct NetlinkSocket {
    /// The underlying socket.
    socket: Socket,
    /// Sequence number counter.
    seq: AtomicU32,
    /// Local port ID (assigned by kernel).
    pid: u32,
    /// Protocol this socket uses.
    protocol: Protocol,
}

impl NetlinkSocket {
    /// Create a new netlink socket for the given protocol.
    pub fn new(protocol: Protocol) -> Result<Self> {
        let mut socket = Socket::new(protocol.as_isize()).map_err(Error::Netlink)?;

        // Bind to get a port ID
        let mut addr = SocketAddr::new(0, 0);
        socket.bind(&addr).map_err(Error::Netlink)?;
        socket.get_address(&mut addr).map_err(Error::Netlink)?;
        let pid = addr.port_number();

        Ok(Self {
            socket,
            seq: AtomicU32::new(1),
            pid,
            protocol,
        })
    }

    /// Get the next sequence number.
    pub fn next_seq(&self) -> u32 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Get the local port ID.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Get the protocol.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Send a message to the kernel.
    pub fn send(&self, msg: &[u8]) -> Result<()> {
        loop {
            match self.socket.send(msg, 0) {
                Ok(n) if n == msg.len() => return Ok(()),
                Ok(n) => {
                    return Err(Error::Netlink(io::Error::new(
                        io::ErrorKind::WriteZero,
                        format!("short netlink send: {} of {} bytes", n, msg.len()),
                    )));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Netlink(e)),
            }
        }
    }

    /// Receive one datagram into a buffer of `capacity` bytes.
    pub fn recv_msg(&self, capacity: usize) -> Result<BytesMut> {
        let mut buf = BytesMut::with_capacity(capacity);

        loop {
            match self.socket.recv(&mut buf, 0) {
                Ok(_n) => return Ok(buf),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Netlink(e)),
            }
        }
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}

impl std::fmt::Debug for NetlinkSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetlinkSocket")
            .field("fd", &self.as_raw_fd())
            .field("pid", &self.pid)
            .field("protocol", &self.protocol)
            .finish()
    }
}
