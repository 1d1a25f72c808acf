use crate::foundation::error::{VgirError, VgirResult};
use std::cell::RefCell;
use std::rc::Rc;

pub const DEFAULT_BUFFER_SIZE: usize = 4096;
/// Smallest unit buffer able to hold the widest instruction plus a switch marker.
pub const MIN_BUFFER_SIZE: usize = 64;

/// Pool configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolOpts {
    /// Size in bytes of every buffer handed out by the pool.
    pub buffer_size: usize,
}

impl Default for PoolOpts {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl PoolOpts {
    pub fn validate(&self) -> VgirResult<()> {
        if self.buffer_size < MIN_BUFFER_SIZE {
            return Err(VgirError::argument(format!(
                "pool buffer_size must be >= {MIN_BUFFER_SIZE}, got {}",
                self.buffer_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PoolStats {
    pub total_buffers: usize,
    pub acquired_buffers: usize,
    pub allocations: u64,
    pub reuses: u64,
}

/// A buffer checked out of a [`BufferPool`]. It must go back through [`BufferPool::release`].
#[derive(Debug)]
pub struct PooledBuffer {
    index: usize,
    data: Box<[u8]>,
}

impl PooledBuffer {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// Growable pool of fixed-size byte buffers.
///
/// Acquisition state lives in a bitmap of 8-slot groups; the pool grows by appending buffers and
/// groups and never shrinks. Retained buffers are not cleared between uses.
#[derive(Debug)]
pub struct BufferPool {
    opts: PoolOpts,
    stats: PoolStats,
    // `None` while the buffer is checked out.
    slots: Vec<Option<Box<[u8]>>>,
    bitmap: Vec<u8>,
}

impl BufferPool {
    pub fn new(opts: PoolOpts) -> VgirResult<Self> {
        opts.validate()?;
        Ok(Self {
            opts,
            stats: PoolStats::default(),
            slots: Vec::new(),
            bitmap: Vec::new(),
        })
    }

    pub fn opts(&self) -> PoolOpts {
        self.opts
    }

    pub fn stats(&self) -> PoolStats {
        self.stats.clone()
    }

    pub fn acquire(&mut self) -> VgirResult<PooledBuffer> {
        let group = match self.bitmap.iter().position(|&g| g != 0xff) {
            Some(g) => g,
            None => {
                self.bitmap.push(0);
                self.bitmap.len() - 1
            }
        };
        let bit = self.bitmap[group].trailing_ones() as usize;
        let index = (group << 3) + bit;

        if index > self.slots.len() {
            return Err(VgirError::assembler(format!(
                "corrupted buffer pool: slot {index} beyond pool length {}",
                self.slots.len()
            )));
        }

        let data = if index == self.slots.len() {
            self.slots.push(None);
            self.stats.total_buffers += 1;
            self.stats.allocations = self.stats.allocations.saturating_add(1);
            vec![0u8; self.opts.buffer_size].into_boxed_slice()
        } else {
            let data = self.slots[index].take().ok_or_else(|| {
                VgirError::assembler(format!("corrupted buffer pool: slot {index} is empty"))
            })?;
            self.stats.reuses = self.stats.reuses.saturating_add(1);
            data
        };

        self.bitmap[group] |= 1 << bit;
        self.stats.acquired_buffers += 1;
        tracing::trace!(index, "acquired pool buffer");
        Ok(PooledBuffer { index, data })
    }

    pub fn release(&mut self, buffer: PooledBuffer) -> VgirResult<()> {
        let index = buffer.index;
        if index >= self.slots.len() || !self.is_acquired(index) {
            return Err(VgirError::InvalidIndex(index));
        }
        if buffer.data.len() != self.opts.buffer_size {
            return Err(VgirError::argument(format!(
                "buffer of {} bytes does not belong to a pool of {}-byte buffers",
                buffer.data.len(),
                self.opts.buffer_size
            )));
        }

        self.bitmap[index >> 3] &= !(1 << (index & 7));
        self.slots[index] = Some(buffer.data);
        self.stats.acquired_buffers = self.stats.acquired_buffers.saturating_sub(1);
        tracing::trace!(index, "released pool buffer");
        Ok(())
    }

    pub fn is_acquired(&self, index: usize) -> bool {
        self.bitmap
            .get(index >> 3)
            .is_some_and(|g| g & (1 << (index & 7)) != 0)
    }
}

/// Shared handle to a [`BufferPool`].
///
/// Every canvas created from the same group writes into buffers of one pool. The handle is
/// single-threaded.
#[derive(Debug, Clone)]
pub struct MemoryResourceGroup {
    pool: Rc<RefCell<BufferPool>>,
}

impl MemoryResourceGroup {
    pub fn new() -> Self {
        Self {
            pool: Rc::new(RefCell::new(BufferPool {
                opts: PoolOpts::default(),
                stats: PoolStats::default(),
                slots: Vec::new(),
                bitmap: Vec::new(),
            })),
        }
    }

    pub fn with_opts(opts: PoolOpts) -> VgirResult<Self> {
        Ok(Self {
            pool: Rc::new(RefCell::new(BufferPool::new(opts)?)),
        })
    }

    pub fn buffer_size(&self) -> usize {
        self.pool.borrow().opts.buffer_size
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.borrow().stats()
    }

    pub(crate) fn acquire(&self) -> VgirResult<PooledBuffer> {
        self.pool.borrow_mut().acquire()
    }

    pub(crate) fn release(&self, buffer: PooledBuffer) -> VgirResult<()> {
        self.pool.borrow_mut().release(buffer)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.pool, &other.pool)
    }
}

impl Default for MemoryResourceGroup {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ir/pool.rs"]
mod tests;
