//! Socket lookup via NETLINK_SOCK_DIAG.
//!
//! [`SockDiag`] asks the kernel for the single socket matching a
//! (protocol, local, remote) tuple and returns its inode and owning uid.
//! Every lookup opens its own netlink socket, sends one
//! `SOCK_DIAG_BY_FAMILY` request and closes the socket before returning.
//!
//! # Example
//!
//! ```ignore
//! use sockowner::sockdiag::{Network, SockDiag};
//!
//! let diag = SockDiag::new();
//! let owner = diag.resolve_socket(
//!     Network::Tcp,
//!     "127.0.0.1:51000".parse()?,
//!     "93.184.216.34:443".parse()?,
//! )?;
//! println!("inode {} uid {}", owner.inode, owner.uid);
//! ```

pub mod request;
pub mod response;
pub mod types;

use std::net::SocketAddr;

pub use request::{InetDiagReqV2, InetDiagSockId};
pub use response::InetDiagMsg;
pub use types::{AddressFamily, ConnectionKey, Network, SocketOwner};

use crate::error::{Error, Result};
use crate::netlink::message::{NLM_F_REQUEST, NlMsgError, NlMsgHdr, NlMsgType};
use crate::netlink::{MessageIter, NLMSG_HDRLEN, NetlinkSocket, Protocol};

/// Default receive buffer size for diagnostic replies.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 8192;

/// Smallest buffer that can hold one complete reply message.
pub const MIN_RECV_BUFFER_SIZE: usize = NLMSG_HDRLEN + InetDiagMsg::SIZE;

/// Source of socket identities for a connection tuple.
///
/// [`SockDiag`] is the kernel-backed implementation; the resolver is generic
/// over this trait so other backends can be plugged in.
pub trait SocketLookup {
    /// Find the inode and owning uid of the socket for `key`.
    fn lookup(&self, key: &ConnectionKey) -> Result<SocketOwner>;
}

impl<T: SocketLookup + ?Sized> SocketLookup for &T {
    fn lookup(&self, key: &ConnectionKey) -> Result<SocketOwner> {
        (**self).lookup(key)
    }
}

impl<T: SocketLookup + ?Sized> SocketLookup for std::sync::Arc<T> {
    fn lookup(&self, key: &ConnectionKey) -> Result<SocketOwner> {
        (**self).lookup(key)
    }
}

/// Kernel socket diagnostics client.
#[derive(Debug, Clone)]
pub struct SockDiag {
    recv_buffer_size: usize,
}

impl Default for SockDiag {
    fn default() -> Self {
        Self::new()
    }
}

impl SockDiag {
    /// Create a client with the default receive buffer size.
    pub fn new() -> Self {
        Self {
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
        }
    }

    /// Set the receive buffer size used for the kernel reply.
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size.max(MIN_RECV_BUFFER_SIZE);
        self
    }

    /// Resolve the inode and owning uid of the socket for a connection.
    pub fn resolve_socket(
        &self,
        network: Network,
        local: SocketAddr,
        remote: SocketAddr,
    ) -> Result<SocketOwner> {
        self.lookup(&ConnectionKey::new(network, local, remote))
    }
}

impl SocketLookup for SockDiag {
    fn lookup(&self, key: &ConnectionKey) -> Result<SocketOwner> {
        let request = InetDiagReqV2::for_connection(key);

        let socket = NetlinkSocket::new(Protocol::SockDiag)?;
        let seq = socket.next_seq();
        let msg = encode_request(&request, seq, socket.pid());

        socket.send(&msg)?;
        tracing::debug!(%key, seq, "sent sock_diag request");

        let reply = socket.recv_msg(self.recv_buffer_size)?;
        let owner = parse_reply(&reply, seq)?;
        tracing::debug!(%key, inode = owner.inode, uid = owner.uid, "socket found");

        Ok(owner)
    }
}

/// Frame a lookup request as a complete netlink message.
pub fn encode_request(request: &InetDiagReqV2, seq: u32, pid: u32) -> Vec<u8> {
    let payload = request.as_bytes();
    let mut header = NlMsgHdr::new(NlMsgType::SOCK_DIAG_BY_FAMILY, NLM_F_REQUEST, payload.len());
    header.nlmsg_seq = seq;
    header.nlmsg_pid = pid;

    let mut buf = Vec::with_capacity(header.nlmsg_len as usize);
    buf.extend_from_slice(header.as_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Extract the socket identity from a kernel reply datagram.
///
/// The first `SOCK_DIAG_BY_FAMILY` message for `seq` whose payload holds a
/// full `inet_diag_msg` wins. A kernel `ENOENT` means no such socket and
/// yields [`Error::NotFound`]; any other kernel error is a netlink error.
pub fn parse_reply(data: &[u8], seq: u32) -> Result<SocketOwner> {
    for result in MessageIter::new(data) {
        let (header, payload) = result?;

        if header.nlmsg_seq != seq {
            continue;
        }

        if header.is_error() {
            let errno = NlMsgError::errno_from_bytes(payload)?;
            match errno.wrapping_abs() {
                0 => continue,
                libc::ENOENT => return Err(Error::no_socket()),
                _ => return Err(Error::from_errno(errno)),
            }
        }

        if header.is_done() {
            break;
        }

        if header.nlmsg_type == NlMsgType::SOCK_DIAG_BY_FAMILY
            && payload.len() >= InetDiagMsg::SIZE
        {
            return Ok(InetDiagMsg::parse(payload)?.owner());
        }
    }

    Err(Error::no_socket())
}
