use bitflags::bitflags;

use super::{address::PhysAddr, address::VirtAddr, frame::alloc_page};
use crate::{config::pte, error::KernelResult};

bitflags! {
    /// Sv32 page table entry permission/validity bits (§3.2).
    pub struct PteFlags: u32 {
        const V = pte::V;
        const R = pte::R;
        const W = pte::W;
        const X = pte::X;
        const U = pte::U;
    }
}

/// A single Sv32 page table entry: `PPN[21:10] | flags[9:0]`.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct PageTableEntry(u32);

impl PageTableEntry {
    const PPN_SHIFT: u32 = 10;

    pub const fn empty() -> Self {
        Self(0)
    }

    fn new(ppn: u32, flags: PteFlags) -> Self {
        Self((ppn << Self::PPN_SHIFT) | flags.bits())
    }

    pub fn is_valid(self) -> bool {
        PteFlags::from_bits_truncate(self.0).contains(PteFlags::V)
    }

    /// Physical address of the frame (or next-level table) this entry points to.
    pub fn addr(self) -> PhysAddr {
        PhysAddr(((self.0 >> Self::PPN_SHIFT) as usize) * crate::config::PAGE_SIZE)
    }
}

/// A process's first-level Sv32 page table.
///
/// Owns exactly the first-level page, allocated on construction; second-level
/// tables are allocated lazily the first time a `vpn1` slot is mapped, the
/// same order of operations the reference kernel performs in `map_page`.
pub struct PageTable {
    root: PhysAddr,
}

impl PageTable {
    pub fn new() -> KernelResult<Self> {
        let root = alloc_page()?;
        Ok(Self { root })
    }

    /// Value to load into `satp` to activate this table in Sv32 mode.
    pub fn satp(&self) -> usize {
        crate::config::SATP_SV32 | (self.root.ppn() as usize)
    }

    fn table1(&self) -> &mut [PageTableEntry; 1024] {
        unsafe { &mut *(self.root.0 as *mut [PageTableEntry; 1024]) }
    }

    /// Maps one page-aligned `vaddr` to `paddr` with the given permissions.
    ///
    /// Panics on unaligned addresses: every call site in this kernel only
    /// ever maps whole pages, so misalignment means a caller bug.
    pub fn map(&mut self, vaddr: VirtAddr, paddr: PhysAddr, flags: PteFlags) -> KernelResult<()> {
        assert!(vaddr.is_page_aligned(), "unaligned vaddr {:#x}", vaddr.0);
        assert!(paddr.is_page_aligned(), "unaligned paddr {:#x}", paddr.0);

        let vpn1 = vaddr.vpn1();
        let table1 = self.table1();
        if !table1[vpn1].is_valid() {
            let table0_frame = alloc_page()?;
            table1[vpn1] = PageTableEntry::new(table0_frame.ppn(), PteFlags::V);
        }

        let table0_addr = table1[vpn1].addr();
        let table0 = unsafe { &mut *(table0_addr.0 as *mut [PageTableEntry; 1024]) };
        let vpn0 = vaddr.vpn0();
        table0[vpn0] = PageTableEntry::new(paddr.ppn(), flags | PteFlags::V);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pte_encodes_ppn_and_flags() {
        let pte = PageTableEntry::new(0x1234, PteFlags::R | PteFlags::W | PteFlags::V);
        assert!(pte.is_valid());
        assert_eq!(pte.addr(), PhysAddr(0x1234 * crate::config::PAGE_SIZE));
    }

    #[test]
    fn empty_entry_is_invalid() {
        assert!(!PageTableEntry::empty().is_valid());
    }
}
