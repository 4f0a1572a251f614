use spin::Mutex;

use super::address::PhysAddr;
use crate::{
    config::PAGE_SIZE,
    error::{KernelError, KernelResult},
};

// `__free_ram`/`__free_ram_end` only have definitions via `linker.ld`, which
// is wired in through `.cargo/config.toml`'s rustflags for the riscv32
// target only. Host test builds link against neither that script nor that
// target, so the symbols are stubbed out here under `cfg(test)` — the bump
// math itself is exercised through the symbol-free `alloc_from` below
// instead of through these addresses.
#[cfg(not(test))]
extern "C" {
    fn __free_ram();
    fn __free_ram_end();
}
#[cfg(test)]
unsafe extern "C" fn __free_ram() {}
#[cfg(test)]
unsafe extern "C" fn __free_ram_end() {}

/// Bump allocator over `[__free_ram, __free_ram_end)` (§3.1).
///
/// No process in this kernel ever exits and tears down its address space, so
/// frames are never reclaimed; a free-list is unnecessary complexity for a
/// kernel whose whole lifetime is a handful of cooperative processes.
struct FrameAllocator {
    next_free: usize,
}

static ALLOCATOR: Mutex<FrameAllocator> = Mutex::new(FrameAllocator { next_free: 0 });

/// Pure bump-allocation step: given the current cursor and the `[base, end)`
/// region, returns the address of the next `n`-page run and panics-free
/// exhaustion check. Kept free of the linker symbols above so it can run on
/// the host under `cargo test`.
fn alloc_from(cursor: usize, base: usize, end: usize, n: usize) -> KernelResult<usize> {
    let size = n * PAGE_SIZE;
    let paddr = base + cursor;
    if paddr + size > end {
        return Err(KernelError::FrameAllocFailed);
    }
    Ok(paddr)
}

/// Allocates `n` contiguous zero-filled physical pages, returning the
/// address of the first (§3/§4.3: `alloc_pages(n)`).
pub fn alloc_pages(n: usize) -> KernelResult<PhysAddr> {
    let base = __free_ram as usize;
    let end = __free_ram_end as usize;

    let mut alloc = ALLOCATOR.lock();
    let paddr = alloc_from(alloc.next_free, base, end, n)?;
    alloc.next_free += n * PAGE_SIZE;
    drop(alloc);

    unsafe {
        core::ptr::write_bytes(paddr as *mut u8, 0, n * PAGE_SIZE);
    }
    Ok(PhysAddr(paddr))
}

/// Allocates a single zero-filled physical page; a convenience wrapper
/// around [`alloc_pages`] for the common `n = 1` case.
pub fn alloc_page() -> KernelResult<PhysAddr> {
    alloc_pages(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_page_aligned_address_for_aligned_base() {
        let base = 0x8020_0000;
        let end = base + 16 * PAGE_SIZE;
        let paddr = alloc_from(3 * PAGE_SIZE, base, end, 1).unwrap();
        assert_eq!(paddr, base + 3 * PAGE_SIZE);
        assert_eq!(paddr % PAGE_SIZE, 0);
    }

    #[test]
    fn n_pages_advances_by_exactly_n_times_page_size() {
        let base = 0x8020_0000;
        let end = base + 16 * PAGE_SIZE;
        let paddr = alloc_from(0, base, end, 4).unwrap();
        assert_eq!(paddr, base);
        // the caller advances its cursor by n * PAGE_SIZE; the next run
        // must start exactly there, with no gap or overlap.
        let next = alloc_from(4 * PAGE_SIZE, base, end, 1).unwrap();
        assert_eq!(next, base + 4 * PAGE_SIZE);
    }

    #[test]
    fn exhaustion_is_an_error_not_a_panic() {
        let base = 0x8020_0000;
        let end = base + 2 * PAGE_SIZE;
        assert_eq!(
            alloc_from(0, base, end, 3),
            Err(KernelError::FrameAllocFailed)
        );
    }

    #[test]
    fn fits_exactly_at_the_boundary() {
        let base = 0x8020_0000;
        let end = base + 2 * PAGE_SIZE;
        assert!(alloc_from(0, base, end, 2).is_ok());
        assert!(alloc_from(1, base, end, 2).is_err());
    }
}
