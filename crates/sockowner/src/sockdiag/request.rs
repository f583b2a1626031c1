//! `inet_diag_req_v2` request construction.

use std::net::{IpAddr, SocketAddr};

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::types::{AddressFamily, ConnectionKey, Network};

/// Match any socket state.
pub const ALL_STATES: u32 = u32::MAX;

/// Match any socket cookie (INET_DIAG_NOCOOKIE).
pub const NO_COOKIE: [u32; 2] = [u32::MAX, u32::MAX];

/// Socket identity block shared by requests and responses
/// (mirrors struct inet_diag_sockid, 48 bytes).
#[repr(C)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct InetDiagSockId {
    /// Source port (network byte order).
    pub sport: [u8; 2],
    /// Destination port (network byte order).
    pub dport: [u8; 2],
    /// Source address; IPv4 uses the first 4 bytes.
    pub src: [u8; 16],
    /// Destination address; IPv4 uses the first 4 bytes.
    pub dst: [u8; 16],
    /// Interface index.
    pub interface: u32,
    /// Socket cookie.
    pub cookie: [u32; 2],
}

impl InetDiagSockId {
    /// Size of the structure on the wire.
    pub const SIZE: usize = 48;

    fn set_source(&mut self, addr: SocketAddr) {
        self.sport = addr.port().to_be_bytes();
        write_addr(&mut self.src, addr.ip());
    }

    fn set_destination(&mut self, addr: SocketAddr) {
        self.dport = addr.port().to_be_bytes();
        write_addr(&mut self.dst, addr.ip());
    }
}

fn write_addr(field: &mut [u8; 16], ip: IpAddr) {
    match ip {
        IpAddr::V4(v4) => field[..4].copy_from_slice(&v4.octets()),
        IpAddr::V6(v6) => field.copy_from_slice(&v6.octets()),
    }
}

/// Convert an address to the given family where a mapping exists.
fn to_family(ip: IpAddr, family: AddressFamily) -> IpAddr {
    match (ip, family) {
        (IpAddr::V4(v4), AddressFamily::Inet6) => IpAddr::V6(v4.to_ipv6_mapped()),
        (IpAddr::V6(v6), AddressFamily::Inet) => v6.to_ipv4_mapped().map_or(ip, IpAddr::V4),
        _ => ip,
    }
}

/// Socket lookup request (mirrors struct inet_diag_req_v2, 56 bytes).
#[repr(C)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct InetDiagReqV2 {
    /// Address family (AF_INET / AF_INET6).
    pub family: u8,
    /// IP protocol number.
    pub protocol: u8,
    /// Requested extension bitmask.
    pub ext: u8,
    /// Padding.
    pub pad: u8,
    /// Socket state bitmask (native byte order).
    pub states: u32,
    /// Socket identity to match.
    pub id: InetDiagSockId,
}

impl InetDiagReqV2 {
    /// Size of the structure on the wire.
    pub const SIZE: usize = 56;

    /// Build a lookup request for a connection.
    ///
    /// The kernel indexes UDP sockets with source and destination reversed
    /// relative to TCP, so for UDP the remote endpoint goes in the source
    /// fields and the local endpoint in the destination fields.
    pub fn for_connection(key: &ConnectionKey) -> Self {
        let family = key.family();
        let local = key.local;
        let remote = SocketAddr::new(to_family(key.remote.ip(), family), key.remote.port());

        let mut id = InetDiagSockId {
            cookie: NO_COOKIE,
            ..Default::default()
        };

        // https://www.mail-archive.com/netdev@vger.kernel.org/msg248638.html
        match key.network {
            Network::Tcp => {
                id.set_source(local);
                id.set_destination(remote);
            }
            Network::Udp => {
                id.set_source(remote);
                id.set_destination(local);
            }
        }

        Self {
            family: family as u8,
            protocol: key.network.number(),
            ext: 0,
            pad: 0,
            states: ALL_STATES,
            id,
        }
    }

    /// Convert request to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }
}
