use crate::foundation::error::{VgirError, VgirResult};
use crate::ir::opcode::Opcode;
use crate::ir::pool::{MemoryResourceGroup, PooledBuffer};

/// Width of the instruction header word.
pub const OPCODE_BYTE_SIZE: usize = 2;

/// Sequential little-endian writer over a chain of pooled buffers.
///
/// Every instruction must be preceded by [`InstructionWriter::perform_possible_buffer_switching`]
/// with the instruction's full encoded size, so that an instruction never straddles two buffers
/// and there is always room left for a `SwitchNextBuffer` marker.
#[derive(Debug)]
pub struct InstructionWriter {
    group: MemoryResourceGroup,
    buffers: Vec<PooledBuffer>,
    pos: usize,
    switches: usize,
    disposed: bool,
}

impl InstructionWriter {
    pub fn new(group: &MemoryResourceGroup) -> VgirResult<Self> {
        let first = group.acquire()?;
        Ok(Self {
            group: group.clone(),
            buffers: vec![first],
            pos: 0,
            switches: 0,
            disposed: false,
        })
    }

    pub fn group(&self) -> &MemoryResourceGroup {
        &self.group
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn switch_count(&self) -> usize {
        self.switches
    }

    /// Write cursor inside the current buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Read-only views over every buffer written so far, in order.
    pub fn buffers(&self) -> Vec<&[u8]> {
        self.buffers.iter().map(PooledBuffer::as_slice).collect()
    }

    /// Moves to a fresh buffer when `required` bytes plus a trailing switch marker would not fit.
    pub fn perform_possible_buffer_switching(&mut self, required: usize) -> VgirResult<()> {
        let capacity = self.current()?.len();
        let size = required + OPCODE_BYTE_SIZE;
        if size >= capacity {
            return Err(VgirError::argument(format!(
                "instruction of {required} bytes cannot fit in {capacity}-byte buffers"
            )));
        }

        let remaining = capacity - self.pos;
        if size >= remaining {
            self.write_u16(Opcode::SwitchNextBuffer.header())?;
            let next = self.group.acquire()?;
            tracing::debug!(
                from = self.buffers.len() - 1,
                pool_index = next.index(),
                "switching instruction buffer"
            );
            self.buffers.push(next);
            self.pos = 0;
            self.switches += 1;
        }
        Ok(())
    }

    /// Releases every buffer back to the pool. Later writes fail.
    pub fn dispose(&mut self) -> VgirResult<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        self.pos = 0;

        let mut first_err = None;
        for buf in self.buffers.drain(..) {
            if let Err(e) = self.group.release(buf) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn write_u8(&mut self, v: u8) -> VgirResult<()> {
        self.put(v.to_le_bytes())
    }

    pub fn write_i8(&mut self, v: i8) -> VgirResult<()> {
        self.put(v.to_le_bytes())
    }

    pub fn write_u16(&mut self, v: u16) -> VgirResult<()> {
        self.put(v.to_le_bytes())
    }

    pub fn write_i16(&mut self, v: i16) -> VgirResult<()> {
        self.put(v.to_le_bytes())
    }

    pub fn write_u32(&mut self, v: u32) -> VgirResult<()> {
        self.put(v.to_le_bytes())
    }

    pub fn write_i32(&mut self, v: i32) -> VgirResult<()> {
        self.put(v.to_le_bytes())
    }

    pub fn write_u64(&mut self, v: u64) -> VgirResult<()> {
        self.put(v.to_le_bytes())
    }

    pub fn write_i64(&mut self, v: i64) -> VgirResult<()> {
        self.put(v.to_le_bytes())
    }

    pub fn write_f32(&mut self, v: f32) -> VgirResult<()> {
        self.put(v.to_le_bytes())
    }

    pub fn write_f64(&mut self, v: f64) -> VgirResult<()> {
        self.put(v.to_le_bytes())
    }

    fn current(&self) -> VgirResult<&PooledBuffer> {
        self.buffers
            .last()
            .ok_or_else(|| VgirError::invalid_state("instruction writer has been disposed"))
    }

    fn put<const N: usize>(&mut self, bytes: [u8; N]) -> VgirResult<()> {
        let pos = self.pos;
        let buf = self
            .buffers
            .last_mut()
            .ok_or_else(|| VgirError::invalid_state("instruction writer has been disposed"))?;
        let dst = buf.as_mut_slice().get_mut(pos..pos + N).ok_or_else(|| {
            VgirError::invalid_state(format!(
                "write of {N} bytes at offset {pos} overflows the current buffer"
            ))
        })?;
        dst.copy_from_slice(&bytes);
        self.pos += N;
        Ok(())
    }
}

impl Drop for InstructionWriter {
    fn drop(&mut self) {
        if let Err(e) = self.dispose() {
            tracing::warn!(error = %e, "failed to return instruction buffers to the pool");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ir/writer.rs"]
mod tests;
