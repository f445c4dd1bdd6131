//! Allocator front-end: the three public operations, request size
//! adjustment, lazy initialization, and the realloc-via-allocate-plus-copy
//! path. Exposed as inherent methods on an owned struct rather than
//! free functions over global state.

use std::ptr;

use crate::block::{self, BlockAddr, FSZ, HSZ, MIN_BLOCK_SIZE};
use crate::check;
use crate::coalesce;
use crate::error::HeapError;
use crate::freelist::{FreeListStore, NextFit, Segregated, SortedFirstFit};
use crate::heap::{HeapSource, SbrkHeap};
use crate::placement;

/// Number of size classes in `Policy::Segregated`'s free-list index.
pub const K: usize = 7;

/// The three placement policies this core supports, selected once at
/// construction time. They share the block layout, the split
/// decision, and (mostly) the coalescing engine; they differ in how
/// free blocks are indexed and searched (see `freelist`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
  /// Single free list kept in non-decreasing size order; O(n) insert
  /// and free, first-fit search from the smallest entry.
  FirstFitSorted,
  /// Single free list, LIFO insertion, a persistent next-fit cursor.
  NextFit,
  /// `K` free lists partitioned by size class; O(1) insert, remove,
  /// and (amortized) search. The main variant this core targets.
  Segregated,
}

/// A dynamic memory allocator sitting on top of a [`HeapSource`].
///
/// Owns its heap substrate, its free-list index, and (for
/// `Policy::Segregated`) the bookkeeping the invariant checker needs
/// to relax the adjacent-free-blocks check immediately after an
/// un-coalesced heap extension. Not `Send`/`Sync`: the core is
/// explicitly single-tenant.
pub struct Allocator<H: HeapSource = SbrkHeap> {
  heap: H,
  list: FreeListStore,
  policy: Policy,
  heap_lo: Option<usize>,
  /// Set after a `Policy::Segregated` `extend_heap` call whose new
  /// chunk was not coalesced with a trailing free block, cleared on
  /// the next `release`. See the preserved open question in the
  /// design notes.
  extended_since_release: bool,
}

impl Allocator<SbrkHeap> {
  /// Constructs an allocator backed by the real process break. Does
  /// not reserve any heap yet — that happens lazily on first use, or
  /// explicitly via [`Allocator::init`].
  pub fn new(policy: Policy) -> Self {
    Self::with_heap_source(policy, SbrkHeap::new())
  }
}

impl<H: HeapSource> Allocator<H> {
  /// Constructs an allocator over an arbitrary [`HeapSource`] — the
  /// seam tests use to drive the same core against [`crate::heap::FakeHeap`].
  pub fn with_heap_source(policy: Policy, heap: H) -> Self {
    let list = match policy {
      Policy::FirstFitSorted => FreeListStore::FirstFitSorted(SortedFirstFit::new()),
      Policy::NextFit => FreeListStore::NextFit(NextFit::new()),
      Policy::Segregated => FreeListStore::Segregated(Segregated::new(K, MIN_BLOCK_SIZE)),
    };
    Allocator { heap, list, policy, heap_lo: None, extended_since_release: false }
  }

  /// Reserves the initial heap chunk and lays down one free block
  /// covering it. Safe to call more than once; only the first call has
  /// an effect. The other three public operations call this lazily, so
  /// most callers never need to call it directly.
  pub fn init(&mut self) -> Result<(), HeapError> {
    if self.heap_lo.is_some() {
      return Ok(());
    }
    let base = self.heap.grow(placement::CHUNKSIZE)?;
    let aligned_lo = block::round_up(base);
    let heap_hi = self.heap.high_addr().expect("grow just succeeded, so high_addr is set");
    let first = BlockAddr(aligned_lo);
    let size = heap_hi - aligned_lo;
    unsafe {
      block::set_size_and_flag(first, size, true);
      block::write_footer(first, size);
    }
    self.list.insert(first);
    self.heap_lo = Some(aligned_lo);
    Ok(())
  }

  fn adjust_size(n: usize) -> usize {
    block::round_up(n + HSZ + FSZ).max(MIN_BLOCK_SIZE)
  }

  /// Finds a fit via the configured policy, extending the heap on a
  /// miss. Returns the chosen block already removed from the free-list
  /// index (still marked free; the caller marks it allocated).
  fn find_or_extend(&mut self, adjusted_size: usize) -> Option<BlockAddr> {
    if let Some(b) = self.list.find_fit(adjusted_size) {
      self.list.remove(b);
      return Some(b);
    }

    let extended = placement::extend_heap(&mut self.heap, adjusted_size).ok()?;
    match self.policy {
      Policy::Segregated => {
        // Deliberately not coalesced with a trailing free block and
        // not inserted into any free list — see design notes.
        self.extended_since_release = true;
        Some(extended)
      }
      Policy::FirstFitSorted => Some(unsafe { coalesce::coalesce_scan(&mut self.list, extended) }),
      Policy::NextFit => {
        let heap_lo = self.heap_lo.expect("initialized before any extend");
        let heap_hi = self.heap.high_addr().expect("just extended");
        Some(unsafe { coalesce::coalesce_boundary_tags(&mut self.list, heap_lo, heap_hi, extended) })
      }
    }
  }

  /// Allocates `n` bytes, returning an 8-byte-aligned payload pointer,
  /// or null if `n == 0` or the request cannot be satisfied.
  pub fn allocate(&mut self, n: usize) -> *mut u8 {
    if n == 0 {
      return ptr::null_mut();
    }
    if self.init().is_err() {
      return ptr::null_mut();
    }

    let adjusted = Self::adjust_size(n);
    let Some(block_addr) = self.find_or_extend(adjusted) else {
      return ptr::null_mut();
    };

    unsafe {
      block::set_size_and_flag(block_addr, block::size(block_addr), false);
      if let Some(tail) = placement::maybe_split(block_addr, adjusted) {
        self.list.insert(tail);
      }
    }

    self.debug_check();
    block_addr.payload()
  }

  /// Releases a pointer previously returned by [`Allocator::allocate`]
  /// or [`Allocator::resize`]. `p == null` is a no-op. Releasing a
  /// pointer this allocator never handed out, or releasing one twice,
  /// is undefined behavior (caught on a best-effort basis by the
  /// invariant checker under the `invariant-checks` feature).
  pub fn release(&mut self, p: *mut u8) {
    if p.is_null() {
      return;
    }
    if self.init().is_err() {
      return;
    }

    let h = BlockAddr::from_payload(p);
    unsafe {
      block::set_size_and_flag(h, block::size(h), true);
      block::write_footer(h, block::size(h));
    }

    let merged = match self.policy {
      Policy::FirstFitSorted => unsafe { coalesce::coalesce_scan(&mut self.list, h) },
      Policy::NextFit | Policy::Segregated => {
        let heap_lo = self.heap_lo.expect("released through an initialized allocator");
        let heap_hi = self.heap.high_addr().expect("initialized");
        unsafe { coalesce::coalesce_boundary_tags(&mut self.list, heap_lo, heap_hi, h) }
      }
    };
    self.list.insert(merged);
    self.extended_since_release = false;

    self.debug_check();
  }

  /// Resizes a previously allocated block. `n == 0` is equivalent to
  /// `release(p)` and returns null. `p == null` behaves as
  /// `allocate(n)`. On allocation failure returns null and leaves `p`
  /// untouched.
  pub fn resize(&mut self, p: *mut u8, n: usize) -> *mut u8 {
    if n == 0 {
      self.release(p);
      return ptr::null_mut();
    }
    if p.is_null() {
      return self.allocate(n);
    }

    let q = self.allocate(n);
    if q.is_null() {
      return ptr::null_mut();
    }

    let old_block = BlockAddr::from_payload(p);
    if unsafe { block::is_free(old_block) } {
      // Defensive: only reachable if the caller passed an
      // already-released pointer back into resize. Preserved from the
      // spec rather than treated as an error, since Policy::Segregated
      // tolerates such a call without corrupting state.
      return q;
    }

    let old_payload_size = unsafe { block::size(old_block) - HSZ - FSZ };
    let copy_len = old_payload_size.min(n);
    unsafe {
      ptr::copy_nonoverlapping(p, q, copy_len);
    }
    self.release(p);
    q
  }

  #[cfg(any(test, feature = "invariant-checks"))]
  fn debug_check(&self) {
    self.check_invariants();
  }

  #[cfg(not(any(test, feature = "invariant-checks")))]
  fn debug_check(&self) {}

  /// Number of distinct free blocks currently indexed. A diagnostic,
  /// not one of the three core operations.
  pub fn free_block_count(&self) -> usize {
    self.list.free_addrs().len()
  }

  /// Total bytes currently sitting in free blocks (header/footer
  /// included).
  pub fn free_bytes(&self) -> usize {
    self.list.free_addrs().iter().map(|b| unsafe { block::size(*b) }).sum()
  }

  /// `[heap_lo, heap_hi)` once the heap has been reserved, or `None`
  /// beforehand.
  pub fn heap_bounds(&self) -> Option<(usize, usize)> {
    self.heap_lo.map(|lo| (lo, self.heap.high_addr().unwrap_or(lo)))
  }

  /// Runs the full heap-consistency walk unconditionally, regardless of
  /// the `invariant-checks` feature. Exposed for tests and interactive
  /// diagnostics; panics on the first violated invariant.
  pub fn check_invariants(&self) {
    if let Some(heap_lo) = self.heap_lo {
      let heap_hi = self.heap.high_addr().unwrap_or(heap_lo);
      check::check_invariants(&self.list, heap_lo, heap_hi, self.extended_since_release);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::ALIGNMENT;
  use crate::heap::FakeHeap;

  fn new_test_allocator(policy: Policy) -> Allocator<FakeHeap> {
    Allocator::with_heap_source(policy, FakeHeap::new())
  }

  #[test]
  fn init_and_single_alloc_leaves_one_free_block_after_release() {
    for policy in [Policy::FirstFitSorted, Policy::NextFit, Policy::Segregated] {
      let mut a = new_test_allocator(policy);
      assert!(a.init().is_ok());
      let p = a.allocate(16);
      assert!(!p.is_null());
      assert_eq!((p as usize) % ALIGNMENT, 0);
      a.release(p);

      let heap_lo = a.heap_lo.unwrap();
      let heap_hi = a.heap.high_addr().unwrap();
      assert_eq!(a.list.free_addrs().len(), 1, "policy {policy:?} should merge back to one free block");
      let only_free = a.list.free_addrs()[0];
      assert_eq!(only_free.0, heap_lo);
      assert_eq!(unsafe { block::size(only_free) }, heap_hi - heap_lo);
    }
  }

  #[test]
  fn allocate_zero_returns_null_without_mutating_state() {
    let mut a = new_test_allocator(Policy::Segregated);
    assert!(a.allocate(0).is_null());
    assert!(a.heap_lo.is_none(), "a zero-size request must not even lazily initialize the heap");
  }

  #[test]
  fn release_null_is_a_no_op() {
    let mut a = new_test_allocator(Policy::Segregated);
    a.release(ptr::null_mut());
    assert!(a.heap_lo.is_none());
  }

  #[test]
  fn resize_null_behaves_as_allocate() {
    let mut a = new_test_allocator(Policy::Segregated);
    let p = a.resize(ptr::null_mut(), 32);
    assert!(!p.is_null());
  }

  #[test]
  fn resize_to_zero_behaves_as_release() {
    let mut a = new_test_allocator(Policy::Segregated);
    let p = a.allocate(32);
    let q = a.resize(p, 0);
    assert!(q.is_null());
    assert_eq!(a.list.free_addrs().len(), 1);
  }

  #[test]
  fn resize_grows_through_copy_and_preserves_prefix() {
    let mut a = new_test_allocator(Policy::Segregated);
    let p = a.allocate(16);
    unsafe {
      ptr::write_bytes(p, 0xAA, 16);
    }
    let q = a.resize(p, 1024);
    assert!(!q.is_null());
    let bytes = unsafe { std::slice::from_raw_parts(q, 16) };
    assert!(bytes.iter().all(|&b| b == 0xAA));
  }

  #[test]
  fn split_on_a_fresh_chunk_leaves_the_expected_remainder() {
    let mut a = new_test_allocator(Policy::Segregated);
    a.init().unwrap();
    let heap_size = a.heap.high_addr().unwrap() - a.heap_lo.unwrap();
    assert_eq!(heap_size, placement::CHUNKSIZE);

    let p = a.allocate(16);
    assert!(!p.is_null());
    let allocated_size = Allocator::<FakeHeap>::adjust_size(16);
    let remaining_free: usize = a.list.free_addrs().iter().map(|b| unsafe { block::size(*b) }).sum();
    assert_eq!(remaining_free, heap_size - allocated_size);
  }

  #[test]
  fn coalesce_merges_both_sides_on_release() {
    for policy in [Policy::FirstFitSorted, Policy::NextFit, Policy::Segregated] {
      let mut a = new_test_allocator(policy);
      let pa = a.allocate(64);
      let pb = a.allocate(64);
      let pc = a.allocate(64);
      a.release(pa);
      a.release(pc);
      a.release(pb);
      assert_eq!(a.list.free_addrs().len(), 1, "policy {policy:?} failed to merge into one block");
    }
  }

  #[test]
  fn next_fit_rotation_lands_on_the_released_slot() {
    let mut a = new_test_allocator(Policy::NextFit);
    let pa = a.allocate(32);
    let _pb = a.allocate(32);
    let _pc = a.allocate(32);
    a.release(pa);
    let pd = a.allocate(32);
    assert_eq!(pd, pa, "the cursor should land back on a's freed slot, not past c");
  }

  #[test]
  fn out_of_memory_surfaces_as_null_without_partial_mutation() {
    let mut a = Allocator::with_heap_source(Policy::Segregated, FakeHeap::with_limit(placement::CHUNKSIZE));
    a.init().unwrap();
    // The one CHUNKSIZE-sized free block is already exhausted by init;
    // any further extension must fail since the fake heap has no more
    // room.
    let p = a.allocate(placement::CHUNKSIZE * 2);
    assert!(p.is_null());
  }
}
