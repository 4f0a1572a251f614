use core::mem::size_of;

/// Integer register file saved/restored by `kernel_entry` across a trap.
///
/// `#[repr(C)]` rather than the original's packed layout: every field is a
/// `usize`, so there are no alignment gaps to pack away, and an unpacked
/// layout lets `&mut TrapFrame` be dereferenced without triggering unaligned
/// access lints.
#[repr(C)]
#[derive(Debug, Default)]
pub struct TrapFrame {
    pub ra: usize,
    pub gp: usize,
    pub tp: usize,
    pub t0: usize,
    pub t1: usize,
    pub t2: usize,
    pub t3: usize,
    pub t4: usize,
    pub t5: usize,
    pub t6: usize,
    pub a0: usize,
    pub a1: usize,
    pub a2: usize,
    pub a3: usize,
    pub a4: usize,
    pub a5: usize,
    pub a6: usize,
    pub a7: usize,
    pub s0: usize,
    pub s1: usize,
    pub s2: usize,
    pub s3: usize,
    pub s4: usize,
    pub s5: usize,
    pub s6: usize,
    pub s7: usize,
    pub s8: usize,
    pub s9: usize,
    pub s10: usize,
    pub s11: usize,
    pub sp: usize,
}

const _: () = assert!(size_of::<TrapFrame>() == 31 * size_of::<usize>());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_no_hidden_padding() {
        assert_eq!(size_of::<TrapFrame>(), 31 * size_of::<usize>());
    }
}
