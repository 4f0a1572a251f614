// `std` (and its default panic handler/allocator) is pulled back in for
// `cargo test`: the custom `#[panic_handler]`/`#[global_allocator]` below
// are themselves `cfg(not(test))`-gated so there's no lang-item clash, and
// host test binaries get a normal libtest harness instead of this crate's
// own `boot` entry point.
#![cfg_attr(not(test), no_std)]
#![cfg_attr(not(test), no_main)]
#![feature(alloc_error_handler)]

mod config;
// `console` talks to SBI through `sbi_rt`, a riscv32-only dependency; it and
// everything that calls into it (`syscall`) are out of the `cfg(test)` build.
#[cfg(not(test))]
mod console;
mod driver;
mod error;
mod fs;
#[cfg(not(test))]
mod heap;
mod mm;
#[cfg(not(test))]
mod panic;
#[cfg(not(test))]
mod syscall;
mod task;
mod trap;

extern crate alloc;

// Everything below is the real boot path: naked asm entry, BSS clear, and
// the boot sequence from spec.md §2. None of it is host-testable (no real
// hart, no linked `linker.ld`, see SPEC_FULL.md §8), so it's entirely
// `cfg(not(test))` rather than reproducing bare-metal addresses on the host.
#[cfg(not(test))]
mod boot {
    use core::arch::naked_asm;

    use log::info;

    extern "C" {
        fn __bss();
        fn __bss_end();
        fn __stack_top();
    }

    extern "C" {
        /// Start of the shell's flat binary image, linked in by the build's
        /// `objcopy`-generated object (§4.1/§6 boot contract).
        static _binary_build_shell_bin_start: u8;
        static _binary_build_shell_bin_size: u8;
    }

    /// Entry point named by `linker.ld`'s `ENTRY(boot)`: sets up the boot
    /// stack and jumps into Rust before anything else runs.
    #[unsafe(no_mangle)]
    #[unsafe(link_section = ".text.boot")]
    #[unsafe(naked)]
    unsafe extern "C" fn boot() -> ! {
        naked_asm!(
            "la sp, {stack_top}",
            "j {main}",
            stack_top = sym __stack_top,
            main = sym rust_main,
        )
    }

    fn clear_bss() {
        unsafe {
            let start = __bss as usize;
            let end = __bss_end as usize;
            core::slice::from_raw_parts_mut(start as *mut u8, end - start).fill(0);
        }
    }

    extern "C" fn rust_main() -> ! {
        clear_bss();
        crate::console::init_logger();
        crate::heap::init();
        crate::trap::init();
        info!("booting");

        crate::driver::virtio_block::init().expect("virtio-blk init failed");
        crate::fs::tar::init().expect("tar filesystem init failed");

        let idle_pid = crate::task::create_process(&[]).expect("failed to create idle process");
        debug_assert_eq!(idle_pid, 1);
        crate::task::set_idle(idle_pid);

        let shell_image = unsafe {
            let start = &_binary_build_shell_bin_start as *const u8;
            let size = &_binary_build_shell_bin_size as *const u8 as usize;
            core::slice::from_raw_parts(start, size)
        };
        crate::task::create_process(shell_image).expect("failed to create shell process");

        crate::task::yield_now();
        panic!("switched back to boot context after yielding to idle");
    }
}
