//! `inet_diag_msg` response decoding.
//!
//! Kernel replies are decoded field by field from a length-checked cursor.
//! A payload shorter than [`InetDiagMsg::SIZE`] is never decoded.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use super::types::{AddressFamily, SocketOwner};
use crate::error::Result;
use crate::netlink::message::malformed;

/// Forward-only reader over a byte slice.
struct Cursor<'a> {
    data: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let (head, rest) = self.data.split_first_chunk::<N>()?;
        self.data = rest;
        Some(*head)
    }

    fn u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn u16_be(&mut self) -> Option<u16> {
        self.take().map(u16::from_be_bytes)
    }

    fn u32_ne(&mut self) -> Option<u32> {
        self.take().map(u32::from_ne_bytes)
    }
}

/// Decoded socket record (mirrors struct inet_diag_msg).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InetDiagMsg {
    /// Address family.
    pub family: u8,
    /// Socket state.
    pub state: u8,
    /// Active timer.
    pub timer: u8,
    /// Retransmit count.
    pub retrans: u8,
    /// Source port.
    pub sport: u16,
    /// Destination port.
    pub dport: u16,
    /// Raw source address.
    pub src: [u8; 16],
    /// Raw destination address.
    pub dst: [u8; 16],
    /// Interface index.
    pub interface: u32,
    /// Socket cookie (two native-endian words).
    pub cookie: [u32; 2],
    /// Timer expiry.
    pub expires: u32,
    /// Receive queue depth.
    pub rqueue: u32,
    /// Send queue depth.
    pub wqueue: u32,
    /// Owning user id.
    pub uid: u32,
    /// Socket inode.
    pub inode: u32,
}

impl InetDiagMsg {
    /// Size of the structure on the wire.
    pub const SIZE: usize = 72;

    /// Decode a record from a message payload.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        if payload.len() < Self::SIZE {
            return Err(malformed(format!(
                "inet_diag_msg truncated: expected {} bytes, got {}",
                Self::SIZE,
                payload.len()
            )));
        }

        Self::decode(&mut Cursor::new(&payload[..Self::SIZE]))
            .ok_or_else(|| malformed("inet_diag_msg decode overrun"))
    }

    fn decode(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            family: c.u8()?,
            state: c.u8()?,
            timer: c.u8()?,
            retrans: c.u8()?,
            sport: c.u16_be()?,
            dport: c.u16_be()?,
            src: c.take()?,
            dst: c.take()?,
            interface: c.u32_ne()?,
            cookie: [c.u32_ne()?, c.u32_ne()?],
            expires: c.u32_ne()?,
            rqueue: c.u32_ne()?,
            wqueue: c.u32_ne()?,
            uid: c.u32_ne()?,
            inode: c.u32_ne()?,
        })
    }

    /// Socket cookie as a single value.
    pub fn cookie(&self) -> u64 {
        (self.cookie[0] as u64) | ((self.cookie[1] as u64) << 32)
    }

    /// Source endpoint, if the family is known.
    pub fn source(&self) -> Option<SocketAddr> {
        self.addr(&self.src).map(|ip| SocketAddr::new(ip, self.sport))
    }

    /// Destination endpoint, if the family is known.
    pub fn destination(&self) -> Option<SocketAddr> {
        self.addr(&self.dst).map(|ip| SocketAddr::new(ip, self.dport))
    }

    fn addr(&self, raw: &[u8; 16]) -> Option<IpAddr> {
        match AddressFamily::from_u8(self.family)? {
            AddressFamily::Inet => Some(IpAddr::V4(Ipv4Addr::new(raw[0], raw[1], raw[2], raw[3]))),
            AddressFamily::Inet6 => Some(IpAddr::V6(Ipv6Addr::from(*raw))),
        }
    }

    /// The socket's kernel identity.
    pub fn owner(&self) -> SocketOwner {
        SocketOwner {
            inode: self.inode,
            uid: self.uid,
        }
    }
}
