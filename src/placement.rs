//! Placement & split engine: turns an adjusted byte request into a
//! block, extending the heap when no existing free block fits.

use crate::block::{self, BlockAddr, MIN_BLOCK_SIZE};
use crate::error::HeapError;
use crate::heap::HeapSource;

/// Heap growth granularity when no free block satisfies a request.
pub const CHUNKSIZE: usize = 4096;

/// Grows the heap by `max(adjusted_size, CHUNKSIZE)` bytes and lays
/// down a single free block spanning the new region. Does not touch
/// the free-list index — callers decide how to fold the new block in,
/// since that differs by policy (see `allocator::Policy`).
pub fn extend_heap<H: HeapSource>(heap: &mut H, adjusted_size: usize) -> Result<BlockAddr, HeapError> {
  let grow_by = adjusted_size.max(CHUNKSIZE);
  let base = heap.grow(grow_by)?;
  let addr = BlockAddr(base);
  unsafe {
    block::set_size_and_flag(addr, grow_by, true);
    block::write_footer(addr, grow_by);
  }
  Ok(addr)
}

/// If shrinking `block_addr` to `adjusted_size` would leave a tail of
/// at least `MIN_BLOCK_SIZE`, performs the split: `block_addr` becomes
/// exactly `adjusted_size` bytes (its allocation flag is preserved),
/// and the tail is written up as a new, not-yet-indexed free block and
/// returned. Otherwise `block_addr` is left whole and `None` is
/// returned — the caller keeps the internal fragmentation.
///
/// # Safety
/// `block_addr` must be a live block of size `>= adjusted_size`.
pub unsafe fn maybe_split(block_addr: BlockAddr, adjusted_size: usize) -> Option<BlockAddr> {
  unsafe {
    let total = block::size(block_addr);
    debug_assert!(total >= adjusted_size);
    let remainder = total - adjusted_size;
    if remainder < MIN_BLOCK_SIZE {
      return None;
    }
    let flag_free = block::is_free(block_addr);
    block::set_size_and_flag(block_addr, adjusted_size, flag_free);
    block::write_footer(block_addr, adjusted_size);

    let tail = block::next_phys(block_addr);
    block::set_size_and_flag(tail, remainder, true);
    block::write_footer(tail, remainder);
    Some(tail)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::heap::FakeHeap;

  #[test]
  fn extend_heap_grows_by_at_least_chunksize() {
    let mut heap = FakeHeap::new();
    let b = extend_heap(&mut heap, 16).unwrap();
    assert_eq!(unsafe { block::size(b) }, CHUNKSIZE);
  }

  #[test]
  fn extend_heap_honors_larger_requests() {
    let mut heap = FakeHeap::new();
    let b = extend_heap(&mut heap, CHUNKSIZE * 3).unwrap();
    assert_eq!(unsafe { block::size(b) }, CHUNKSIZE * 3);
  }

  #[test]
  fn split_leaves_a_well_formed_remainder() {
    let mut backing = vec![0u8; 4096];
    let addr = BlockAddr(backing.as_mut_ptr() as usize);
    unsafe {
      block::set_size_and_flag(addr, 256, false);
      block::write_footer(addr, 256);
      let tail = maybe_split(addr, 64).expect("remainder is well above MIN_BLOCK_SIZE");
      assert_eq!(block::size(addr), 64);
      assert_eq!(block::size(tail), 192);
      assert!(block::is_free(tail));
      assert!(!block::is_free(addr));
      assert_eq!(block::next_phys(addr), tail);
    }
  }

  #[test]
  fn split_refuses_to_leave_a_too_small_remainder() {
    let mut backing = vec![0u8; 4096];
    let addr = BlockAddr(backing.as_mut_ptr() as usize);
    unsafe {
      block::set_size_and_flag(addr, MIN_BLOCK_SIZE + 8, false);
      block::write_footer(addr, MIN_BLOCK_SIZE + 8);
      assert!(maybe_split(addr, 8).is_none());
      assert_eq!(block::size(addr), MIN_BLOCK_SIZE + 8);
    }
  }
}
