//! Find the local process that owns a TCP or UDP socket.
//!
//! Given a connection tuple (protocol, local endpoint, remote endpoint), this
//! crate asks the kernel over `NETLINK_SOCK_DIAG` for the socket's inode and
//! owning uid, then scans `/proc` for the process holding that inode and
//! returns its executable path.
//!
//! Linux only. Lookups are synchronous and block the calling thread; enable
//! the `async` feature for a tokio wrapper.
//!
//! # Example
//!
//! ```ignore
//! use sockowner::{Network, Resolver};
//!
//! let resolver = Resolver::new();
//! let exe = resolver.resolve(
//!     Network::Tcp,
//!     "127.0.0.1:51000".parse()?,
//!     "93.184.216.34:443".parse()?,
//! )?;
//! println!("{}", exe.display());
//! ```
//!
//! # Modules
//!
//! - [`sockdiag`]: socket inode and uid lookup via the kernel
//! - [`procfs`]: owning-process search over `/proc`
//! - [`resolver`]: the two combined
//! - [`pool`]: scratch buffers shared by concurrent searches

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod error;
pub mod netlink;
pub mod pool;
pub mod procfs;
pub mod resolver;
pub mod sockdiag;

pub use config::ResolverConfig;
pub use error::{Error, Result};
pub use pool::{BufferPool, PooledBuf};
pub use procfs::{ProcSearcher, ProcessRecord};
pub use resolver::{Resolver, find_process_path};
pub use sockdiag::{ConnectionKey, Network, SockDiag, SocketLookup, SocketOwner};
