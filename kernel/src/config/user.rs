/// Base virtual address every user image is linked and mapped at.
///
/// Flat binaries have no relocation info, so this address is fixed and
/// baked into `user/user.ld` at build time (§4.1).
///
/// The five syscall numbers (§4.6) aren't duplicated here: `syscall::SyscallNo`
/// is their one source of truth, since nothing in this crate builds a
/// separate userspace binary that would need them as free-standing
/// constants (the shell is an external collaborator, spec.md §1).
pub const USER_BASE: usize = 0x0100_0000;
