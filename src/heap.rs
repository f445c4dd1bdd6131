//! The heap-growth primitive the allocator core is written against.
//!
//! [`HeapSource`] is the one external collaborator the allocator core
//! depends on: something that can extend a contiguous break and report
//! the current high-water mark. [`SbrkHeap`] is the production
//! implementation, a thin wrapper over `libc::sbrk`. Tests drive the
//! same core against [`FakeHeap`], an in-process stand-in with no
//! dependency on process break state, so the allocator's own test
//! suite can run many independent `Allocator` instances concurrently
//! without fighting over the one real break a process has.

use libc::{c_void, intptr_t};

use crate::error::HeapError;

/// A source of contiguous, growable heap memory.
pub trait HeapSource {
  /// Extends the heap by `bytes` and returns the address the break
  /// used to sit at (i.e. the start of the newly available region).
  fn grow(&mut self, bytes: usize) -> Result<usize, HeapError>;

  /// The address one past the last byte ever handed out, or `None` if
  /// `grow` has never been called.
  fn high_addr(&self) -> Option<usize>;

  /// Total bytes ever handed out via `grow`.
  fn size(&self) -> usize;
}

/// `HeapSource` backed directly by the process break via `libc::sbrk`.
pub struct SbrkHeap {
  base: Option<usize>,
  total: usize,
}

impl SbrkHeap {
  pub fn new() -> Self {
    SbrkHeap { base: None, total: 0 }
  }
}

impl Default for SbrkHeap {
  fn default() -> Self {
    Self::new()
  }
}

impl HeapSource for SbrkHeap {
  fn grow(&mut self, bytes: usize) -> Result<usize, HeapError> {
    let prev = unsafe { libc::sbrk(bytes as intptr_t) };
    if prev == usize::MAX as *mut c_void {
      return Err(HeapError::OutOfMemory);
    }
    let prev_addr = prev as usize;
    if self.base.is_none() {
      self.base = Some(prev_addr);
    }
    self.total += bytes;
    Ok(prev_addr)
  }

  fn high_addr(&self) -> Option<usize> {
    self.base.map(|base| base + self.total)
  }

  fn size(&self) -> usize {
    self.total
  }
}

/// Deterministic, in-process `HeapSource` used by tests. Backs the
/// "heap" with a fixed-capacity, heap-allocated byte slice reserved up
/// front, so the addresses handed back by `grow` are real, writable
/// memory the allocator core can read and write through raw pointers —
/// not just opaque integers — while staying independent of the real
/// process break, so many allocators can be exercised side by side and
/// an induced out-of-memory condition is reproducible. The capacity
/// doubles as the point at which `grow` starts failing.
pub struct FakeHeap {
  storage: Box<[u8]>,
  base: usize,
  used: usize,
}

/// Default reservation for [`FakeHeap::new`]: generous enough for any
/// of this crate's tests without the zero-fill becoming slow.
const DEFAULT_CAPACITY: usize = 1 << 24;

impl FakeHeap {
  /// Creates a fake heap with [`DEFAULT_CAPACITY`] bytes of headroom
  /// and no artificial limit below that.
  pub fn new() -> Self {
    Self::with_limit(DEFAULT_CAPACITY)
  }

  /// Creates a fake heap that fails `grow` once more than `limit`
  /// total bytes have been requested, for exercising the
  /// out-of-memory path deterministically. `limit` bytes are reserved
  /// (and zero-filled) up front so the backing storage never moves.
  pub fn with_limit(limit: usize) -> Self {
    let storage = vec![0u8; limit].into_boxed_slice();
    let base = storage.as_ptr() as usize;
    FakeHeap { storage, base, used: 0 }
  }
}

impl Default for FakeHeap {
  fn default() -> Self {
    Self::new()
  }
}

impl HeapSource for FakeHeap {
  fn grow(&mut self, bytes: usize) -> Result<usize, HeapError> {
    if self.used + bytes > self.storage.len() {
      return Err(HeapError::OutOfMemory);
    }
    let prev = self.base + self.used;
    self.used += bytes;
    Ok(prev)
  }

  fn high_addr(&self) -> Option<usize> {
    if self.used == 0 {
      None
    } else {
      Some(self.base + self.used)
    }
  }

  fn size(&self) -> usize {
    self.used
  }
}
