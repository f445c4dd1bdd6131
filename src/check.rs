//! Debug-only invariant checker: a linear walk of the heap plus a walk
//! of the free-list index, asserting the invariants of the data model
//! every public entry point is supposed to preserve.
//!
//! Runs unconditionally from this crate's own test suite and,
//! additionally, at the top of every `Allocator` public method when
//! built with the `invariant-checks` cargo feature (see
//! `allocator::Allocator::debug_check`).

use std::collections::HashSet;

use crate::block::{self, BlockAddr, MIN_BLOCK_SIZE};
use crate::freelist::FreeListStore;

/// Panics (via `assert!`) if any invariant from §3 of the design is
/// violated. `relax_adjacency` is set by the caller immediately after
/// a `Policy::Segregated` heap extension that has not yet been
/// followed by a `release`, per the preserved open question that this
/// policy's `extend_heap` does not coalesce its new chunk with a
/// trailing free block.
pub fn check_invariants(list: &FreeListStore, heap_lo: usize, heap_hi: usize, relax_adjacency: bool) {
  if heap_hi <= heap_lo {
    return;
  }

  let free_set: HashSet<usize> = list.free_addrs().into_iter().map(|a| a.0).collect();

  let mut addr = heap_lo;
  let mut prev_was_free = false;
  let mut total = 0usize;
  while addr < heap_hi {
    assert_eq!(addr % block::ALIGNMENT, 0, "block at {addr:#x} is not 8-byte aligned");
    let b = BlockAddr(addr);
    let size = unsafe { block::size(b) };
    assert!(size >= MIN_BLOCK_SIZE, "block at {addr:#x} has size {size}, below MIN_BLOCK_SIZE");
    assert_eq!(size % block::ALIGNMENT, 0, "block at {addr:#x} has non-8-byte-multiple size {size}");

    let back_ptr = unsafe { block::read_footer(b, size) };
    assert_eq!(back_ptr, addr, "footer of block at {addr:#x} points to {back_ptr:#x} instead of itself");

    let is_free = unsafe { block::is_free(b) };
    assert_eq!(
      is_free,
      free_set.contains(&addr),
      "block at {addr:#x} has allocation flag free={is_free} but free-list membership disagrees"
    );

    if is_free && prev_was_free && !relax_adjacency {
      panic!("two physically adjacent free blocks meet at {addr:#x}");
    }

    prev_was_free = is_free;
    total += size;
    addr += size;
  }

  assert_eq!(addr, heap_hi, "block tiling overruns the heap's high-water mark");
  assert_eq!(total, heap_hi - heap_lo, "sum of block sizes does not equal heap size");
}
