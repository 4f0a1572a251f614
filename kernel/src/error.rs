#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// Bump allocator has exhausted `__free_ram..__free_ram_end`.
    FrameAllocFailed,

    /// A tar header's magic field was not `"ustar"`.
    InvalidTarHeader,
}

pub type KernelResult<T = ()> = Result<T, KernelError>;
