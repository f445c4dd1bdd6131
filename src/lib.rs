//! # segalloc — A Boundary-Tag Memory Allocator Library
//!
//! This crate provides a user-space dynamic memory allocator that
//! manages a single contiguous heap obtained via `sbrk`, in the style
//! of a textbook malloc lab: every block (free or allocated) carries a
//! boundary tag (header + footer) so neighbors can be found and merged
//! in O(1), and three interchangeable placement policies sit on top of
//! that shared core.
//!
//! ## Overview
//!
//! ```text
//!   Heap layout (boundary-tag blocks, tiled end to end):
//!
//!   ┌──────────┬──────────────────────┬──────────┬──────────┬───────────┐
//!   │  header  │  payload / links     │  footer  │  header  │   ...     │
//!   └──────────┴──────────────────────┴──────────┴──────────┴───────────┘
//!    block 0 (free or allocated)        block 1                 ...
//! ```
//!
//! Each block's footer stores a back-pointer to its own header, which
//! lets the coalescing engine locate a block's physical predecessor
//! without scanning. The header packs the block's size and allocation
//! flag into a single word, followed by free-list link fields that are
//! only meaningful while the block is free.
//!
//! ## Crate Structure
//!
//! ```text
//!   segalloc
//!   ├── error      - HeapError
//!   ├── heap       - HeapSource trait; SbrkHeap and FakeHeap
//!   ├── block      - boundary-tag layout and accessors (internal)
//!   ├── freelist   - the three free-list index shapes (internal)
//!   ├── coalesce   - boundary-tag and scan-based merge engines (internal)
//!   ├── placement  - heap extension and block splitting (internal)
//!   ├── check      - debug invariant checker (internal)
//!   └── allocator  - Policy, Allocator: the public front-end
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use segalloc::{Allocator, Policy};
//!
//! fn main() {
//!     let mut allocator = Allocator::new(Policy::Segregated);
//!
//!     unsafe {
//!         let p = allocator.allocate(64) as *mut u64;
//!         *p = 42;
//!         println!("Value: {}", *p);
//!         allocator.release(p as *mut u8);
//!     }
//! }
//! ```
//!
//! ## Placement policies
//!
//! - [`Policy::FirstFitSorted`] — one free list kept in non-decreasing
//!   size order, first-fit search, coalescing by scanning the free
//!   list for an address-adjacent neighbor (no boundary-tag lookup).
//! - [`Policy::NextFit`] — one free list, LIFO insertion, a persistent
//!   search cursor; boundary-tag coalescing retargets the cursor when
//!   it pointed into an absorbed block.
//! - [`Policy::Segregated`] — seven size-class free lists with O(1)
//!   insert/remove and amortized O(1) search; boundary-tag coalescing
//!   on release, but a freshly extended chunk is deliberately *not*
//!   coalesced with a trailing free block before use (see `DESIGN.md`).
//!
//! ## Features
//!
//! - **Real coalescing**: adjacent free blocks are merged, not just
//!   accumulated, unlike a pure bump allocator.
//! - **Direct OS interaction**: uses `sbrk` for heap growth by default,
//!   behind the same [`HeapSource`] seam tests drive with an in-process
//!   fake.
//! - **Debug invariant checking**: enable the `invariant-checks` cargo
//!   feature to run a full heap-consistency walk at the top of every
//!   public `Allocator` method.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization primitives; an
//!   `Allocator` is neither `Send` nor `Sync`.
//! - **Unix-only**: [`SbrkHeap`] requires `libc` and `sbrk` (POSIX
//!   systems).
//!
//! ## Safety
//!
//! This crate manages raw memory directly. The public [`Allocator`]
//! API itself is safe to call (misuse such as double-release is
//! detected on a best-effort basis, not prevented at the type level),
//! but the block-layout internals below it are not.

mod allocator;
mod block;
mod check;
mod coalesce;
mod error;
mod freelist;
mod heap;
mod placement;

pub use allocator::{Allocator, Policy, K};
pub use block::{ALIGNMENT, FSZ, HSZ, MIN_BLOCK_SIZE};
pub use error::HeapError;
pub use heap::{FakeHeap, HeapSource, SbrkHeap};
pub use placement::CHUNKSIZE;
