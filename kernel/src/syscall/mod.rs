use core::slice;

use crate::{
    console::{getchar, putchar},
    fs::tar,
    task::{self, yield_now, State, PROCS},
    trap::TrapFrame,
};

numeric_enum_macro::numeric_enum! {
    #[repr(usize)]
    #[derive(Debug, Eq, PartialEq, Clone, Copy)]
    /// The five syscall numbers this ABI defines (§4.6), carried in `a3`.
    pub enum SyscallNo {
        Putchar = 1,
        Getchar = 2,
        Exit = 3,
        Readfile = 4,
        Writefile = 5,
    }
}

/// Dispatches on `frame.a3` to one of the five syscalls the ABI defines
/// (§4.6). `frame.a0` carries the return value back to userspace; advancing
/// `sepc` past the `ecall` instruction is the trap handler's job, not this
/// function's.
pub fn dispatch(frame: &mut TrapFrame) {
    let Ok(no) = SyscallNo::try_from(frame.a3) else {
        panic!("unexpected syscall a3={:#x}", frame.a3);
    };

    match no {
        SyscallNo::Putchar => {
            putchar(frame.a0 as u8);
        }
        SyscallNo::Getchar => loop {
            let ch = getchar();
            if ch >= 0 {
                frame.a0 = ch as usize;
                break;
            }
            yield_now();
        },
        SyscallNo::Exit => {
            let current = task::current();
            let pid = {
                let mut procs = PROCS.lock();
                procs[current].state = State::Exited;
                procs[current].pid
            };
            crate::println!("process {} exited", pid);
            yield_now();
            panic!("unreachable: exited process was scheduled again");
        }
        SyscallNo::Readfile | SyscallNo::Writefile => handle_file_syscall(frame, no),
    }
}

fn handle_file_syscall(frame: &mut TrapFrame, no: SyscallNo) {
    let filename = unsafe {
        let ptr = frame.a0 as *const u8;
        let len = (0..100).take_while(|&i| *ptr.add(i) != 0).count();
        core::str::from_utf8_unchecked(slice::from_raw_parts(ptr, len))
    };

    let Some(index) = tar::lookup(filename) else {
        crate::println!("file not found: {}", filename);
        frame.a0 = usize::MAX; // -1
        return;
    };

    let buf = unsafe { slice::from_raw_parts_mut(frame.a1 as *mut u8, frame.a2) };

    if no == SyscallNo::Writefile {
        match tar::write(index, buf) {
            Ok(len) => frame.a0 = len,
            Err(_) => frame.a0 = usize::MAX,
        }
    } else {
        frame.a0 = tar::read(index, buf);
    }
}
