mod address;
mod frame;
mod page_table;

pub use address::{PhysAddr, VirtAddr};
pub use frame::{alloc_page, alloc_pages};
pub use page_table::{PageTable, PteFlags};

// See `mm::frame` for why these are stubbed under `cfg(test)`: the real
// addresses only exist once `linker.ld` is applied, which host test builds
// never do.
#[cfg(not(test))]
extern "C" {
    fn __kernel_base();
    fn __free_ram_end();
}
#[cfg(test)]
unsafe extern "C" fn __kernel_base() {}
#[cfg(test)]
unsafe extern "C" fn __free_ram_end() {}

use crate::{config::VIRTIO_BLK_PADDR, error::KernelResult};

/// Builds a fresh page table for a new process: identity-maps all of kernel
/// memory (so traps and syscalls can run with the user's `satp` still
/// loaded) plus the VirtIO MMIO window (§3.3).
pub fn new_process_page_table() -> KernelResult<PageTable> {
    let mut table = PageTable::new()?;

    let mut paddr = __kernel_base as usize;
    let end = __free_ram_end as usize;
    while paddr < end {
        table.map(
            VirtAddr(paddr),
            PhysAddr(paddr),
            PteFlags::R | PteFlags::W | PteFlags::X,
        )?;
        paddr += crate::config::PAGE_SIZE;
    }

    table.map(
        VirtAddr(VIRTIO_BLK_PADDR),
        PhysAddr(VIRTIO_BLK_PADDR),
        PteFlags::R | PteFlags::W,
    )?;

    Ok(table)
}
