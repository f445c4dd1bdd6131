use std::io::Read;

use libc::sbrk;
use segalloc::{Allocator, Policy};

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap`, `htop`,
/// `gdb`, or just visually track how allocations change the program break.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints the current program break using `sbrk(0)`.
/// The program break is the upper boundary of the heap managed via brk/sbrk.
unsafe fn print_program_break(label: &str) {
  println!("[{}] PID = {}, program break (sbrk(0)) = {:?}", label, std::process::id(), unsafe {
    sbrk(0)
  });
}

fn main() {
  // The segregated-fit policy: seven size-class free lists, O(1)
  // insert/remove, amortized O(1) search.
  let mut allocator = Allocator::new(Policy::Segregated);

  unsafe {
    print_program_break("start");
    block_until_enter_pressed();

    // --------------------------------------------------------------
    // 1) Allocate a handful of blocks. The first call lazily grows
    //    the heap by one CHUNKSIZE-sized region.
    // --------------------------------------------------------------
    let a = allocator.allocate(64) as *mut u64;
    *a = 0xDEAD_BEEF;
    println!("allocated a @ {:p}, wrote {:#x}", a, *a);
    print_program_break("after a");
    block_until_enter_pressed();

    let b = allocator.allocate(256);
    println!("allocated b @ {:p} (256 bytes)", b);

    let c = allocator.allocate(16);
    println!("allocated c @ {:p} (16 bytes)", c);
    block_until_enter_pressed();

    // --------------------------------------------------------------
    // 2) Release the middle block, then the first: a boundary-tag
    //    coalesce should merge them into a single free block at b's
    //    old address without growing the heap further.
    // --------------------------------------------------------------
    allocator.release(b);
    allocator.release(a as *mut u8);
    println!("released a and b; heap should not have grown");
    print_program_break("after release");
    block_until_enter_pressed();

    // --------------------------------------------------------------
    // 3) Resize c well past its current size, forcing a fresh
    //    allocation, a copy of its live bytes, and a release of the
    //    old block.
    // --------------------------------------------------------------
    let d = allocator.resize(c, 4096);
    println!("resized c -> d @ {:p} (4096 bytes)", d);
    print_program_break("after resize");

    allocator.release(d);
    println!("released d");
    print_program_break("end");
  }
}
