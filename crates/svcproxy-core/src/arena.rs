//! Per-attempt scratch memory with a fixed byte budget.
//!
//! Every call attempt gets a fresh [`CallArena`]; the channel uses it for
//! request/response buffers and it is released when the attempt ends,
//! whether it succeeded or not. Running past the budget is reported as
//! [`ChannelError::OutOfMemory`], which the proxy retries with backoff.

use crate::error::ChannelError;

#[derive(Debug)]
pub struct CallArena {
    buf: Vec<u8>,
    limit: usize,
}

impl CallArena {
    /// Reserve an arena able to hand out `size` bytes in total.
    pub fn acquire(size: usize) -> Self {
        Self {
            buf: Vec::with_capacity(size),
            limit: size,
        }
    }

    /// Total byte budget.
    pub fn capacity(&self) -> usize {
        self.limit
    }

    /// Bytes handed out so far.
    pub fn used(&self) -> usize {
        self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.limit - self.buf.len()
    }

    /// Carve a zeroed block of `len` bytes out of the arena.
    pub fn alloc(&mut self, len: usize) -> Result<&mut [u8], ChannelError> {
        if len > self.remaining() {
            tracing::debug!(
                requested = len,
                remaining = self.remaining(),
                "call arena exhausted"
            );
            return Err(ChannelError::OutOfMemory);
        }
        let start = self.buf.len();
        self.buf.resize(start + len, 0);
        Ok(&mut self.buf[start..])
    }

    /// Copy `bytes` into the arena and return the stored block.
    pub fn alloc_copy(&mut self, bytes: &[u8]) -> Result<&[u8], ChannelError> {
        let block = self.alloc(bytes.len())?;
        block.copy_from_slice(bytes);
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_within_budget() {
        let mut arena = CallArena::acquire(16);
        assert_eq!(arena.alloc(10).unwrap().len(), 10);
        assert_eq!(arena.alloc_copy(b"abcdef").unwrap(), b"abcdef");
        assert_eq!(arena.used(), 16);
        assert_eq!(arena.remaining(), 0);
    }

    #[test]
    fn alloc_past_budget_is_out_of_memory() {
        let mut arena = CallArena::acquire(8);
        arena.alloc(5).unwrap();
        assert_eq!(arena.alloc(4), Err(ChannelError::OutOfMemory));
        // A failed allocation leaves the arena untouched.
        assert_eq!(arena.used(), 5);
    }
}
