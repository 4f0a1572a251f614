use spin::Mutex;

use crate::config::{PROCS_MAX, PROC_STACK_SIZE};
use crate::mm::PageTable;

#[cfg(not(test))]
use core::mem::size_of;

#[cfg(not(test))]
use super::context::switch_context;
#[cfg(not(test))]
use crate::{
    error::KernelResult,
    mm::{new_process_page_table, PteFlags, VirtAddr},
    trap::user_entry,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum State {
    Unused,
    Runnable,
    Exited,
}

/// One process control block: pid, scheduling state, saved stack pointer,
/// its own Sv32 page table, and an 8 KiB kernel stack carried inline so the
/// whole table is a single static array with no heap allocation per process.
pub struct Process {
    /// A small positive integer for every real process; the idle process's
    /// slot is overridden to `-1` by [`set_idle`] right after it's created
    /// (§3), mirroring the reference kernel's `idle_proc->pid = -1`.
    pub pid: isize,
    pub state: State,
    sp: usize,
    pub page_table: Option<PageTable>,
    stack: [u8; PROC_STACK_SIZE],
}

impl Process {
    const fn unused() -> Self {
        Self {
            pid: 0,
            state: State::Unused,
            sp: 0,
            page_table: None,
            stack: [0; PROC_STACK_SIZE],
        }
    }

    /// Address one past the end of this process's kernel stack, i.e. the
    /// value loaded into `sscratch` while it runs.
    pub fn stack_top(&self) -> usize {
        self.stack.as_ptr() as usize + self.stack.len()
    }

    /// Pointer to the saved-stack-pointer slot `switch_context` reads/writes.
    pub fn sp_mut(&mut self) -> *mut usize {
        &mut self.sp as *mut usize
    }
}

pub static PROCS: Mutex<[Process; PROCS_MAX]> =
    Mutex::new([const { Process::unused() }; PROCS_MAX]);

/// Creates a process running `image` (a flat user binary, §4.1), mapping the
/// whole identity-mapped kernel range plus VirtIO into its own page table and
/// copying the image page-by-page into freshly allocated user pages.
///
/// Used once for the idle process (`image` empty) and once for the initial
/// shell; neither ever exits the loop below with `FrameAllocFailed` in
/// practice, since the kernel boots with `__free_ram` sized to fit both.
#[cfg(not(test))]
pub fn create_process(image: &[u8]) -> KernelResult<usize> {
    let mut procs = PROCS.lock();
    let (index, proc) = procs
        .iter_mut()
        .enumerate()
        .find(|(_, p)| p.state == State::Unused)
        .expect("no free process slots");

    let callee_saved: [usize; 13] = [
        user_entry as usize, // ra
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // s0..s11
    ];
    let regs_start = proc.stack.len() - callee_saved.len() * size_of::<usize>();
    let mut offset = regs_start;
    for reg in callee_saved {
        proc.stack[offset..offset + size_of::<usize>()].copy_from_slice(&reg.to_ne_bytes());
        offset += size_of::<usize>();
    }

    let mut page_table = new_process_page_table()?;
    for (i, chunk) in image.chunks(crate::config::PAGE_SIZE).enumerate() {
        let frame = crate::mm::alloc_page()?;
        unsafe {
            core::ptr::copy_nonoverlapping(chunk.as_ptr(), frame.0 as *mut u8, chunk.len());
        }
        page_table.map(
            VirtAddr(crate::config::USER_BASE + i * crate::config::PAGE_SIZE),
            frame,
            PteFlags::U | PteFlags::R | PteFlags::W | PteFlags::X,
        )?;
    }

    proc.pid = (index + 1) as isize;
    proc.state = State::Runnable;
    proc.sp = proc.stack.as_ptr() as usize + regs_start;
    proc.page_table = Some(page_table);

    Ok(index + 1)
}

/// Overrides the idle process's slot (identified by the pid [`create_process`]
/// returned for it) to carry pid `-1`, the distinguished idle sentinel (§3).
/// Called once at boot right after the idle process is created, the same
/// order of operations as the reference kernel's `idle_proc->pid = -1`.
#[cfg(not(test))]
pub fn set_idle(idle_pid: usize) {
    PROCS.lock()[idle_pid - 1].pid = -1;
}

/// Switches `satp`/`sscratch` to `next` and context-switches onto its stack.
///
/// # Safety
/// `next` must be a `Runnable` slot in [`PROCS`] whose `sp`/`page_table` were
/// set up by [`create_process`]; the caller must not hold the `PROCS` lock.
#[cfg(not(test))]
pub unsafe fn switch_to(prev_sp: *mut usize, next_index: usize) {
    let (next_sp, satp, stack_top) = {
        let procs = PROCS.lock();
        let next = &procs[next_index];
        (
            &next.sp as *const usize as *mut usize,
            next.page_table.as_ref().unwrap().satp(),
            next.stack_top(),
        )
    };

    core::arch::asm!(
        "sfence.vma",
        "csrw satp, {satp}",
        "sfence.vma",
        "csrw sscratch, {sscratch}",
        satp = in(reg) satp,
        sscratch = in(reg) stack_top,
    );

    switch_context(prev_sp, next_sp);
}
