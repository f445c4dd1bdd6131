//! Error type for the one documented failure mode the core surfaces as
//! a `Result` rather than a sentinel: the heap substrate refusing to
//! grow. (The other two documented failure modes — a zero-byte request
//! and caller misuse such as double-free — are not errors in this
//! type's sense: the former is routine and observable only through the
//! null return, the latter is undefined behavior the invariant checker
//! catches on a best-effort basis rather than something `Result` could
//! represent.)

use std::error::Error;
use std::fmt;

/// The heap-growth primitive failed to extend the break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
  /// The underlying `sbrk`-equivalent call returned its failure
  /// sentinel; the process has exhausted whatever limit backs it.
  OutOfMemory,
}

impl fmt::Display for HeapError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      HeapError::OutOfMemory => write!(f, "heap growth primitive failed (out of memory)"),
    }
  }
}

impl Error for HeapError {}
