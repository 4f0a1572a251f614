//! Only compiled into the real no_std build (see `main.rs`'s `mod panic`
//! declaration): `std` supplies its own panic handler for `cargo test`
//! builds, and defining this one unconditionally would collide with it.

use core::panic::PanicInfo;

use sbi_rt::{system_reset, NoReason, Shutdown};

use crate::println;

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    if let Some(location) = info.location() {
        println!(
            "\u{1B}[31mPANIC: {}:{}: {}\u{1B}[0m",
            location.file(),
            location.line(),
            info.message()
        );
    } else {
        println!("\u{1B}[31mPANIC: {}\u{1B}[0m", info.message());
    }
    system_reset(Shutdown, NoReason);
    loop {}
}
