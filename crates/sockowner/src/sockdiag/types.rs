//! Core types for socket diagnostics.
//!
//! This module provides strongly-typed representations of the transport
//! protocols, address families and connection tuples a lookup is keyed by.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Socket address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AddressFamily {
    /// IPv4.
    Inet = libc::AF_INET as u8,
    /// IPv6.
    Inet6 = libc::AF_INET6 as u8,
}

impl AddressFamily {
    /// Parse from a raw u8 value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value as i32 {
            libc::AF_INET => Some(Self::Inet),
            libc::AF_INET6 => Some(Self::Inet6),
            _ => None,
        }
    }

    /// Address family of an IP address.
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Self::Inet,
            IpAddr::V6(_) => Self::Inet6,
        }
    }
}

/// Transport protocol a connection is carried over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// TCP.
    Tcp,
    /// UDP.
    Udp,
}

impl Network {
    /// Get the IP protocol number.
    pub fn number(&self) -> u8 {
        match self {
            Self::Tcp => libc::IPPROTO_TCP as u8,
            Self::Udp => libc::IPPROTO_UDP as u8,
        }
    }

    /// Get the protocol name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = Error;

    /// Accepts `tcp`, `tcp4`, `tcp6`, `udp`, `udp4` and `udp6`, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" | "tcp4" | "tcp6" => Ok(Self::Tcp),
            "udp" | "udp4" | "udp6" => Ok(Self::Udp),
            _ => Err(Error::InvalidNetwork(s.to_string())),
        }
    }
}

/// A connection as seen from this host: protocol plus both endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionKey {
    /// Transport protocol.
    pub network: Network,
    /// Local endpoint (bound on this host).
    pub local: SocketAddr,
    /// Remote endpoint.
    pub remote: SocketAddr,
}

impl ConnectionKey {
    /// Create a new connection key.
    pub fn new(network: Network, local: SocketAddr, remote: SocketAddr) -> Self {
        Self {
            network,
            local,
            remote,
        }
    }

    /// Address family used for the diagnostic query (taken from the local end).
    pub fn family(&self) -> AddressFamily {
        AddressFamily::of(&self.local.ip())
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.network, self.local, self.remote)
    }
}

/// Kernel identity of a socket: its inode and owning user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocketOwner {
    /// Socket inode number.
    pub inode: u32,
    /// Owning user id.
    pub uid: u32,
}
