//! Linked-memory arena allocator (`SPEC_FULL.md` §4.6).
//!
//! A request-scoped bump allocator used to stage scratch buffers (gathered
//! document columns, path scan results, response tapes) without going back
//! to the global allocator for every growth step. Memory is carved out of a
//! singly-linked chain of fixed-capacity [`Block`](block::Block)s; once a
//! block is allocated its address never changes, so slices handed out of it
//! stay valid until the arena is reset or dropped.
//!
//! Mirrors `helpers/linked_memory.hpp` in the original implementation:
//! `cheap_extend` there is this crate's [`Arena::grow`] fast path, and
//! `release_supplementary` is [`Arena::reset`] with `keep_old_data = false`.

mod block;

use ukv_core::{Error, Result};

pub use block::Backing;
use block::Block;

const DEFAULT_BLOCK_CAPACITY: usize = 4096;
const GROWTH_FACTOR: usize = 2;

/// Tracks the most recent allocation so [`Arena::grow`] can find it again.
#[derive(Clone, Copy)]
struct LastAlloc {
    block_index: usize,
    start: usize,
    len: usize,
}

/// A request-scoped linked-memory arena.
///
/// Not `Sync` — callers that need one arena per worker thread should keep a
/// pool keyed by thread id rather than sharing a single arena across
/// threads.
pub struct Arena {
    blocks: Vec<Block>,
    backing: Backing,
    initial_capacity: usize,
    last_alloc: Option<LastAlloc>,
}

impl Arena {
    /// Create an empty arena. No block is allocated until the first `alloc`.
    pub fn new(backing: Backing) -> Arena {
        Arena {
            blocks: Vec::new(),
            backing,
            initial_capacity: DEFAULT_BLOCK_CAPACITY,
            last_alloc: None,
        }
    }

    /// Create an arena whose first block is pre-sized to `capacity` bytes,
    /// for callers that know roughly how much scratch space a request needs.
    pub fn with_capacity(backing: Backing, capacity: usize) -> Arena {
        Arena {
            blocks: Vec::new(),
            backing,
            initial_capacity: capacity.max(DEFAULT_BLOCK_CAPACITY),
            last_alloc: None,
        }
    }

    /// Total bytes currently allocated across every block in the chain.
    pub fn capacity(&self) -> usize {
        self.blocks.iter().map(|b| b.capacity()).sum()
    }

    /// Total bytes handed out to callers so far (the high-water mark).
    pub fn used(&self) -> usize {
        self.blocks.iter().map(|b| b.used).sum()
    }

    fn push_block(&mut self, min_capacity: usize) -> Result<usize> {
        let next_capacity = self
            .blocks
            .last()
            .map(|b| b.capacity() * GROWTH_FACTOR)
            .unwrap_or(self.initial_capacity)
            .max(min_capacity);
        let block = Block::new(next_capacity, self.backing).map_err(|e| {
            let err = Error::OutOfMemory(format!("arena block allocation failed: {e}"));
            err.log();
            err
        })?;
        tracing::debug!(capacity = next_capacity, blocks = self.blocks.len() + 1, "arena grew");
        self.blocks.push(block);
        Ok(self.blocks.len() - 1)
    }

    /// Allocate `len` zero-initialized bytes and return a mutable view into
    /// them. The view's lifetime is tied to this borrow of the arena: once
    /// another `alloc`/`grow` call is made, the previous slice can no longer
    /// be named, though the bytes themselves remain valid until `reset`.
    pub fn alloc(&mut self, len: usize) -> Result<&mut [u8]> {
        let block_index = match self
            .blocks
            .iter()
            .position(|b| b.remaining() >= len)
        {
            Some(i) => i,
            None => self.push_block(len)?,
        };
        let block = &mut self.blocks[block_index];
        let start = block.used;
        block.used += len;
        self.last_alloc = Some(LastAlloc { block_index, start, len });
        Ok(block.slice_mut(start, len))
    }

    /// Grow the most recent allocation by `additional` bytes, preserving its
    /// existing contents. If the owning block still has room right after the
    /// allocation's tail, this extends in place (`cheap_extend` in the
    /// original); otherwise it falls back to a fresh `alloc` plus a copy.
    pub fn grow(&mut self, additional: usize) -> Result<&mut [u8]> {
        let last = self
            .last_alloc
            .ok_or_else(|| Error::ArgumentWrong("grow called with no prior allocation".into()))?;

        let block = &self.blocks[last.block_index];
        let is_tail = block.used == last.start + last.len;
        if is_tail && block.remaining() >= additional {
            let block = &mut self.blocks[last.block_index];
            block.used += additional;
            let new_len = last.len + additional;
            self.last_alloc = Some(LastAlloc { block_index: last.block_index, start: last.start, len: new_len });
            return Ok(block.slice_mut(last.start, new_len));
        }

        let mut old_bytes = vec![0u8; last.len];
        old_bytes.copy_from_slice(self.blocks[last.block_index].slice(last.start, last.len));

        let new_len = last.len + additional;
        let new_slice = self.alloc(new_len)?;
        new_slice[..last.len].copy_from_slice(&old_bytes);
        Ok(new_slice)
    }

    /// Reset the arena for reuse by the next request.
    ///
    /// When `keep_old_data` is `false` (the common case, matching
    /// `dont_discard_memory` being *unset*), every block beyond the first is
    /// freed and the first block's bump pointer is rewound to zero — the
    /// backing allocation is kept so the next request doesn't pay for it
    /// again, but its contents are logically gone. When `keep_old_data` is
    /// `true`, nothing is freed or rewound at all, so slices returned by
    /// earlier `alloc`/`grow` calls stay valid into the next request.
    pub fn reset(&mut self, keep_old_data: bool) {
        if keep_old_data {
            return;
        }
        self.last_alloc = None;
        if self.blocks.is_empty() {
            return;
        }
        self.blocks.truncate(1);
        self.blocks[0].used = 0;
    }

    /// Release every block, returning the arena to its just-constructed
    /// state. Unlike `reset`, this also frees the first block.
    pub fn release_all(&mut self) {
        self.last_alloc = None;
        self.blocks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_returns_zeroed_bytes_of_requested_length() {
        let mut arena = Arena::new(Backing::Heap);
        let buf = arena.alloc(16).unwrap();
        assert_eq!(buf.len(), 16);
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn sequential_allocs_do_not_overlap() {
        let mut arena = Arena::new(Backing::Heap);
        {
            let a = arena.alloc(8).unwrap();
            a.fill(0xAA);
        }
        {
            let b = arena.alloc(8).unwrap();
            b.fill(0xBB);
        }
        assert_eq!(arena.used(), 16);
    }

    #[test]
    fn grow_extends_in_place_when_tail_has_room() {
        let mut arena = Arena::with_capacity(Backing::Heap, 64);
        {
            let first = arena.alloc(4).unwrap();
            first.copy_from_slice(b"1234");
        }
        let grown = arena.grow(4).unwrap();
        assert_eq!(&grown[..4], b"1234");
        assert_eq!(grown.len(), 8);
    }

    #[test]
    fn grow_falls_back_to_copy_when_another_alloc_intervened() {
        let mut arena = Arena::with_capacity(Backing::Heap, 16);
        {
            let first = arena.alloc(4).unwrap();
            first.copy_from_slice(b"abcd");
        }
        let _other = arena.alloc(4).unwrap();
        let grown = arena.grow(4).unwrap();
        assert_eq!(&grown[..4], b"abcd");
        assert_eq!(grown.len(), 8);
    }

    #[test]
    fn reset_without_keep_old_data_frees_supplementary_blocks() {
        let mut arena = Arena::with_capacity(Backing::Heap, 8);
        let _ = arena.alloc(8).unwrap();
        let _ = arena.alloc(64).unwrap(); // forces a new, bigger block
        assert!(arena.blocks.len() >= 2);
        arena.reset(false);
        assert_eq!(arena.blocks.len(), 1);
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn reset_with_keep_old_data_preserves_everything() {
        let mut arena = Arena::with_capacity(Backing::Heap, 8);
        let _ = arena.alloc(8).unwrap();
        let _ = arena.alloc(64).unwrap();
        let blocks_before = arena.blocks.len();
        let used_before = arena.used();
        arena.reset(true);
        assert_eq!(arena.blocks.len(), blocks_before);
        assert_eq!(arena.used(), used_before);
    }

    #[test]
    fn shared_backing_round_trips_through_mmap() {
        let mut arena = Arena::new(Backing::Shared);
        let buf = arena.alloc(32).unwrap();
        buf[0] = 7;
        assert_eq!(buf[0], 7);
    }

    #[test]
    fn growth_factor_doubles_block_capacity() {
        let mut arena = Arena::with_capacity(Backing::Heap, 16);
        let _ = arena.alloc(16).unwrap();
        let _ = arena.alloc(1).unwrap();
        assert_eq!(arena.blocks[1].capacity(), 32);
    }
}
