//! A single fixed-capacity arena block.
//!
//! Once allocated, a block's backing storage never moves or resizes — only
//! its high-water mark (`used`) advances — so slices handed out of it stay
//! valid for as long as the block itself is kept alive.

use memmap2::MmapMut;

/// Where a block's bytes live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backing {
    /// Ordinary process-private heap allocation.
    Heap,
    /// Anonymous shared-memory mapping, visible to other processes that map
    /// the same region (`SPEC_FULL.md` §5, `read_shared_memory`).
    Shared,
}

pub(crate) enum BlockBuf {
    Heap(Box<[u8]>),
    Shared(MmapMut),
}

impl BlockBuf {
    fn as_slice(&self) -> &[u8] {
        match self {
            BlockBuf::Heap(b) => b,
            BlockBuf::Shared(m) => m,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            BlockBuf::Heap(b) => b,
            BlockBuf::Shared(m) => m,
        }
    }
}

/// One block in the arena's singly-linked chain.
pub struct Block {
    pub(crate) buf: BlockBuf,
    pub(crate) used: usize,
    pub(crate) backing: Backing,
}

impl Block {
    pub(crate) fn new(capacity: usize, backing: Backing) -> std::io::Result<Block> {
        let buf = match backing {
            Backing::Heap => BlockBuf::Heap(vec![0u8; capacity].into_boxed_slice()),
            Backing::Shared => BlockBuf::Shared(MmapMut::map_anon(capacity.max(1))?),
        };
        Ok(Block { buf, used: 0, backing })
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buf.as_slice().len()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.capacity() - self.used
    }

    pub(crate) fn slice_mut(&mut self, start: usize, len: usize) -> &mut [u8] {
        &mut self.buf.as_mut_slice()[start..start + len]
    }

    pub(crate) fn slice(&self, start: usize, len: usize) -> &[u8] {
        &self.buf.as_slice()[start..start + len]
    }
}
