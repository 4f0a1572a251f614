// `context::switch_context` is riscv naked asm with no host equivalent; kept
// out of `cfg(test)` builds along with everything downstream of it.
#[cfg(not(test))]
mod context;
mod process;
mod sched;

#[cfg(not(test))]
pub use process::{create_process, set_idle};
pub use process::{Process, State, PROCS};
pub use sched::{current, next_runnable};
#[cfg(not(test))]
pub use sched::yield_now;
