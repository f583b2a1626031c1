//! Scratch buffer pool.
//!
//! Fixed-size byte buffers are checked out for the duration of one `/proc`
//! search and handed back when the [`PooledBuf`] guard drops, so a steady
//! stream of lookups reuses the same few allocations.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

/// Smallest buffer handed out by the pool.
const MIN_BUFFER_SIZE: usize = 16;

/// Default cap on idle buffers retained by a pool.
const DEFAULT_MAX_IDLE: usize = 64;

/// Thread-safe pool of reusable byte buffers.
#[derive(Debug)]
pub struct BufferPool {
    idle: Mutex<Vec<Vec<u8>>>,
    max_idle: usize,
    allocations: AtomicUsize,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::with_max_idle(DEFAULT_MAX_IDLE)
    }

    /// Create an empty pool that keeps at most `max_idle` returned buffers.
    pub fn with_max_idle(max_idle: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            max_idle,
            allocations: AtomicUsize::new(0),
        }
    }

    /// The process-wide pool shared by default-constructed resolvers.
    pub fn global() -> Arc<BufferPool> {
        static GLOBAL: OnceLock<Arc<BufferPool>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(BufferPool::new())))
    }

    fn idle(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
        // Idle buffers carry no invariants a panicking holder could break.
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check out a buffer of at least `min_len` bytes.
    ///
    /// The buffer is owned exclusively by the returned guard and goes back to
    /// the pool when the guard is dropped. Contents are not cleared.
    pub fn checkout(&self, min_len: usize) -> PooledBuf<'_> {
        let reused = {
            let mut idle = self.idle();
            idle.iter()
                .position(|b| b.len() >= min_len)
                .map(|i| idle.swap_remove(i))
        };

        let buf = reused.unwrap_or_else(|| {
            self.allocations.fetch_add(1, Ordering::Relaxed);
            vec![0u8; min_len.max(MIN_BUFFER_SIZE).next_power_of_two()]
        });

        PooledBuf {
            buf: Some(buf),
            pool: self,
        }
    }

    fn put(&self, buf: Vec<u8>) {
        let mut idle = self.idle();
        if idle.len() < self.max_idle {
            idle.push(buf);
        }
    }

    /// Number of buffers allocated by this pool so far.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::Relaxed)
    }

    /// Number of buffers currently idle in the pool.
    pub fn idle_count(&self) -> usize {
        self.idle().len()
    }
}

/// A buffer checked out from a [`BufferPool`].
///
/// Returned to the pool exactly once, on drop.
#[derive(Debug)]
pub struct PooledBuf<'a> {
    buf: Option<Vec<u8>>,
    pool: &'a BufferPool,
}

impl Deref for PooledBuf<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buf.as_deref().unwrap_or_default()
    }
}

impl DerefMut for PooledBuf<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buf.as_deref_mut().unwrap_or_default()
    }
}

impl Drop for PooledBuf<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.put(buf);
        }
    }
}
