//! Connection to process resolution.
//!
//! [`Resolver`] chains a [`SocketLookup`] (the kernel's socket diagnostics
//! by default) with a [`ProcSearcher`]: the connection tuple is turned into a
//! socket inode and uid, and those into the executable of the process holding
//! the socket. Nothing is cached between calls.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ResolverConfig;
use crate::error::Result;
use crate::pool::BufferPool;
use crate::procfs::{ProcSearcher, ProcessRecord};
use crate::sockdiag::{ConnectionKey, Network, SockDiag, SocketLookup};

/// Resolves connections to the executable of their owning process.
#[derive(Debug, Clone)]
pub struct Resolver<L = SockDiag> {
    lookup: L,
    searcher: ProcSearcher,
}

impl Default for Resolver<SockDiag> {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver<SockDiag> {
    /// Create a resolver backed by the kernel, searching `/proc`.
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    /// Create a kernel-backed resolver from a configuration.
    pub fn with_config(config: ResolverConfig) -> Self {
        let lookup = SockDiag::new().recv_buffer_size(config.recv_buffer_size);
        Self::with_lookup(lookup, config)
    }
}

impl<L: SocketLookup> Resolver<L> {
    /// Create a resolver with a custom socket lookup backend.
    pub fn with_lookup(lookup: L, config: ResolverConfig) -> Self {
        Self {
            lookup,
            searcher: ProcSearcher::from_config(&config, BufferPool::global()),
        }
    }

    /// Use `pool` for the searcher's scratch buffers.
    pub fn pool(mut self, pool: Arc<BufferPool>) -> Self {
        self.searcher = self.searcher.pool(pool);
        self
    }

    /// The socket lookup backend.
    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// The process searcher.
    pub fn searcher(&self) -> &ProcSearcher {
        &self.searcher
    }

    /// Resolve a connection to the executable path of its owning process.
    pub fn resolve(&self, network: Network, local: SocketAddr, remote: SocketAddr) -> Result<PathBuf> {
        self.resolve_record(network, local, remote)
            .map(|record| record.path)
    }

    /// Like [`resolve`](Self::resolve), with the protocol given by name
    /// (`"tcp"`, `"udp"`, optionally suffixed with `4` or `6`).
    ///
    /// An unknown name fails with [`Error::InvalidNetwork`](crate::Error::InvalidNetwork)
    /// before any I/O is performed.
    pub fn resolve_str(&self, network: &str, local: SocketAddr, remote: SocketAddr) -> Result<PathBuf> {
        let network: Network = network.parse()?;
        self.resolve(network, local, remote)
    }

    /// Resolve a connection to the full record of its owning process.
    pub fn resolve_record(
        &self,
        network: Network,
        local: SocketAddr,
        remote: SocketAddr,
    ) -> Result<ProcessRecord> {
        self.resolve_key(&ConnectionKey::new(network, local, remote))
    }

    /// Resolve a connection key to the full record of its owning process.
    pub fn resolve_key(&self, key: &ConnectionKey) -> Result<ProcessRecord> {
        let owner = self.lookup.lookup(key)?;
        tracing::debug!(%key, inode = owner.inode, uid = owner.uid, "searching for owner process");
        self.searcher.find_process(owner.inode, owner.uid)
    }
}

#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
impl<L> Resolver<L>
where
    L: SocketLookup + Clone + Send + 'static,
{
    /// Resolve a connection on tokio's blocking thread pool.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn resolve_async(
        &self,
        network: Network,
        local: SocketAddr,
        remote: SocketAddr,
    ) -> Result<PathBuf> {
        let resolver = self.clone();
        tokio::task::spawn_blocking(move || resolver.resolve(network, local, remote))
            .await
            .map_err(|e| crate::Error::Io(std::io::Error::other(e)))?
    }
}

/// Find the executable of the process owning a connection.
///
/// One-call entry point using a default [`Resolver`]; `network` is `"tcp"` or
/// `"udp"`.
///
/// # Example
///
/// ```ignore
/// let exe = sockowner::find_process_path(
///     "tcp",
///     "127.0.0.1:51000".parse()?,
///     "93.184.216.34:443".parse()?,
/// )?;
/// println!("{}", exe.display());
/// ```
pub fn find_process_path(network: &str, local: SocketAddr, remote: SocketAddr) -> Result<PathBuf> {
    Resolver::new().resolve_str(network, local, remote)
}
