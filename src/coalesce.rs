//! Coalescing engine: given a newly-freed block, merge it with any
//! physically adjacent free neighbors in one shot, removing them from
//! whatever free list they belong to first.
//!
//! Two strategies are implemented, matching the two ways a newly-freed
//! block's physical neighbors can be located (see `freelist`'s module
//! doc):
//!
//! - [`coalesce_boundary_tags`] — `Policy::NextFit` and
//!   `Policy::Segregated` use the footer back-pointer to find the
//!   physical predecessor in O(1), and simple pointer arithmetic to
//!   find the physical successor in O(1).
//! - [`coalesce_scan`] — `Policy::FirstFitSorted` has no boundary tags
//!   to consult for this purpose; it instead walks the free list
//!   directly, checking physical address adjacency against each
//!   member.
//!
//! Both take a not-yet-inserted free block and return the (possibly
//! larger, possibly relocated) block that the caller must still insert
//! into the free-list index.

use crate::block::{self, BlockAddr};
use crate::freelist::FreeListStore;

/// Merges `b` with its physical neighbors using boundary tags.
/// `heap_lo`/`heap_hi_excl` bound the current heap so the ends can be
/// detected without reading out-of-bounds memory.
///
/// # Safety
/// `b` must be a live, currently-free block not present in `list`;
/// `heap_lo`/`heap_hi_excl` must be the current heap bounds.
pub unsafe fn coalesce_boundary_tags(
  list: &mut FreeListStore,
  heap_lo: usize,
  heap_hi_excl: usize,
  b: BlockAddr,
) -> BlockAddr {
  unsafe {
    let is_first = b.0 == heap_lo;
    let is_last = b.0 + block::size(b) == heap_hi_excl;
    let prev = if is_first { None } else { Some(block::prev_phys(b)) };
    let next = if is_last { None } else { Some(block::next_phys(b)) };
    let prev_free = prev.is_some_and(|p| block::is_free(p));
    let next_free = next.is_some_and(|n| block::is_free(n));

    let merged = match (prev_free, next_free) {
      (false, false) => b,
      (false, true) => {
        let succ = next.unwrap();
        list.remove(succ);
        let new_size = block::size(b) + block::size(succ);
        block::set_size_and_flag(b, new_size, true);
        block::write_footer(b, new_size);
        retarget_next_fit(list, succ, b);
        b
      }
      (true, false) => {
        let pred = prev.unwrap();
        list.remove(pred);
        let new_size = block::size(pred) + block::size(b);
        block::set_size_and_flag(pred, new_size, true);
        block::write_footer(pred, new_size);
        retarget_next_fit(list, b, pred);
        pred
      }
      (true, true) => {
        let pred = prev.unwrap();
        let succ = next.unwrap();
        list.remove(pred);
        list.remove(succ);
        let new_size = block::size(pred) + block::size(b) + block::size(succ);
        block::set_size_and_flag(pred, new_size, true);
        block::write_footer(pred, new_size);
        retarget_next_fit(list, b, pred);
        retarget_next_fit(list, succ, pred);
        pred
      }
    };
    merged
  }
}

/// `Policy::NextFit`'s side effect: if the cursor pointed inside a
/// block that just got absorbed into a merge, retarget it to the
/// surviving block. A no-op for the other two policies.
fn retarget_next_fit(list: &mut FreeListStore, absorbed: BlockAddr, survivor: BlockAddr) {
  if let Some(nf) = list.as_next_fit_mut() {
    nf.retarget_on_coalesce(absorbed, survivor);
  }
}

/// Merges `b` with any physically adjacent member of `list` by walking
/// the free list directly (no boundary tags consulted for neighbor
/// discovery), repeating until a full pass finds nothing left to
/// merge. Mirrors `Policy::FirstFitSorted`'s source coalesce, which has
/// the same O(n) shape.
///
/// # Safety
/// `b` must be a live, currently-free block not present in `list`.
pub unsafe fn coalesce_scan(list: &mut FreeListStore, mut b: BlockAddr) -> BlockAddr {
  loop {
    let mut merged_this_pass = false;
    for cur in list.free_addrs() {
      unsafe {
        let b_start = b.0;
        let b_end = b.0 + block::size(b);
        let cur_start = cur.0;
        let cur_end = cur.0 + block::size(cur);
        if cur_end == b_start {
          list.remove(cur);
          let new_size = block::size(cur) + block::size(b);
          block::set_size_and_flag(cur, new_size, true);
          block::write_footer(cur, new_size);
          b = cur;
          merged_this_pass = true;
          break;
        } else if b_end == cur_start {
          list.remove(cur);
          let new_size = block::size(b) + block::size(cur);
          block::set_size_and_flag(b, new_size, true);
          block::write_footer(b, new_size);
          merged_this_pass = true;
          break;
        }
      }
    }
    if !merged_this_pass {
      return b;
    }
  }
}
