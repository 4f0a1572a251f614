mod logger;

use core::fmt::{Arguments, Write};

pub use logger::init as init_logger;
use spin::Mutex;

struct Stdin;

impl Stdin {
    /// Raw SBI legacy return value: a byte 0..=255 on success, or `-1`
    /// (all bits set) if no input is pending yet.
    #[allow(deprecated)]
    fn getchar(&self) -> isize {
        sbi_rt::legacy::console_getchar() as isize
    }
}

struct Stdout;

impl Stdout {
    #[allow(deprecated)]
    fn putchar(&self, c: u8) {
        sbi_rt::legacy::console_putchar(c as usize);
    }
}

impl Write for Stdout {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for c in s.bytes() {
            self.putchar(c);
        }
        Ok(())
    }
}

static STDIN: Mutex<Stdin> = Mutex::new(Stdin);
static STDOUT: Mutex<Stdout> = Mutex::new(Stdout);

/// Polls the SBI console for one byte. `-1` means nothing is pending yet;
/// callers that need a blocking read retry in a yield loop (§4.6).
pub fn getchar() -> isize {
    STDIN.lock().getchar()
}

/// Writes one raw byte to the SBI console (§4.6: PUTCHAR is `a0` verbatim,
/// not a re-encoded `char` — a byte `>= 0x80` must not turn into UTF-8).
pub fn putchar(c: u8) {
    STDOUT.lock().putchar(c);
}

#[doc(hidden)]
pub fn print(args: Arguments) {
    STDOUT.lock().write_fmt(args).unwrap();
}

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {
        $crate::console::print(core::format_args!($($arg)*))
    }
}

#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($fmt:literal $(, $($arg:tt)+)?) => {
        $crate::console::print(core::format_args!(concat!($fmt, "\n") $(, $($arg)+)?))
    }
}
