use fnv::FnvHashMap;

use crate::context::{BufferId, BufferSource, GraphicsContext};
use crate::error::Error;

use super::buffer::{Buffer, BufferTarget, BufferUsage};

/// Proof of an outstanding [BufferPool::acquire].
///
/// A lease cannot be cloned: the buffer it refers to is handed back by passing the lease to
/// [BufferPool::release], after which the lease is gone.
#[derive(PartialEq, Eq, Hash, Debug)]
pub struct BufferLease {
    id: BufferId,
}

impl BufferLease {
    pub fn id(&self) -> BufferId {
        self.id
    }
}

/// Recycles buffers so that short-lived allocations don't have to go through the driver.
///
/// Every buffer the pool creates is owned by the pool for its entire life, either in the
/// available set (grouped by target and usage) or in the in-use set (keyed by identity). Callers
/// access an acquired buffer through its [BufferLease].
///
/// ```
/// use glitz_pipeline::context::RecordingContext;
/// use glitz_pipeline::resource::{BufferPool, BufferTarget, BufferUsage};
///
/// let mut gl = RecordingContext::new();
/// let mut pool = BufferPool::new();
///
/// let lease = pool.acquire(&mut gl, BufferTarget::Vertex, 1024, BufferUsage::StaticDraw).unwrap();
/// let id = lease.id();
///
/// pool.release(lease).unwrap();
///
/// let lease = pool.acquire(&mut gl, BufferTarget::Vertex, 256, BufferUsage::StaticDraw).unwrap();
///
/// assert_eq!(lease.id(), id);
/// ```
#[derive(Debug)]
pub struct BufferPool {
    available: FnvHashMap<(BufferTarget, BufferUsage), Vec<Buffer>>,
    in_use: FnvHashMap<BufferId, Buffer>,
}

impl BufferPool {
    pub fn new() -> Self {
        BufferPool {
            available: FnvHashMap::default(),
            in_use: FnvHashMap::default(),
        }
    }

    /// Leases a buffer for `target` and `usage` that holds at least `min_size` bytes.
    ///
    /// The available buffers for `target` and `usage` are searched in the order they were
    /// released and the first one large enough is handed out, even if it is much larger than
    /// requested. If none fits, a new zero-initialized buffer of exactly `min_size` bytes is
    /// allocated.
    pub fn acquire<C>(
        &mut self,
        gl: &mut C,
        target: BufferTarget,
        min_size: usize,
        usage: BufferUsage,
    ) -> Result<BufferLease, Error>
    where
        C: GraphicsContext + ?Sized,
    {
        let reused = self.available.get_mut(&(target, usage)).and_then(|buffers| {
            buffers
                .iter()
                .position(|buffer| buffer.size_in_bytes() >= min_size)
                .map(|index| buffers.remove(index))
        });

        let buffer = match reused {
            Some(buffer) => {
                log::debug!(
                    "reusing pooled buffer of {} bytes for a request of {} bytes",
                    buffer.size_in_bytes(),
                    min_size
                );

                buffer
            }
            None => Buffer::new(gl, target, BufferSource::Size(min_size), usage)?,
        };

        let id = buffer.id().ok_or(Error::NilArgument("buffer"))?;

        self.in_use.insert(id, buffer);

        Ok(BufferLease { id })
    }

    pub fn buffer(&self, lease: &BufferLease) -> Option<&Buffer> {
        self.in_use.get(&lease.id)
    }

    pub fn buffer_mut(&mut self, lease: &BufferLease) -> Option<&mut Buffer> {
        self.in_use.get_mut(&lease.id)
    }

    /// Returns the leased buffer to the available set.
    ///
    /// A buffer that was deleted while leased is dropped from the pool instead. Fails with
    /// [Error::NilArgument] if the pool no longer tracks the lease, which happens when the pool
    /// was cleared while the lease was outstanding.
    pub fn release(&mut self, lease: BufferLease) -> Result<(), Error> {
        let buffer = self
            .in_use
            .remove(&lease.id)
            .ok_or(Error::NilArgument("buffer"))?;

        if buffer.is_deleted() {
            log::debug!("dropping deleted buffer from pool");

            return Ok(());
        }

        self.available
            .entry((buffer.target(), buffer.usage()))
            .or_insert_with(Vec::new)
            .push(buffer);

        Ok(())
    }

    /// Deletes every buffer owned by the pool and empties both sets.
    pub fn clear<C>(&mut self, gl: &mut C)
    where
        C: GraphicsContext + ?Sized,
    {
        log::debug!(
            "clearing buffer pool ({} available, {} in use)",
            self.available_count(),
            self.in_use_count()
        );

        for (_, mut buffers) in self.available.drain() {
            for buffer in buffers.iter_mut() {
                buffer.delete(gl);
            }
        }

        for (_, mut buffer) in self.in_use.drain() {
            buffer.delete(gl);
        }
    }

    pub fn available_count(&self) -> usize {
        self.available.values().map(|buffers| buffers.len()).sum()
    }

    pub fn in_use_count(&self) -> usize {
        self.in_use.len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        BufferPool::new()
    }
}
