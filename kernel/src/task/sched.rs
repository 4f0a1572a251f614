use super::process::State;
#[cfg(not(test))]
use super::process::PROCS;
#[cfg(not(test))]
use crate::config::PROCS_MAX;

/// Currently running process's index into [`PROCS`]; index 0 is always the
/// idle process created at boot.
static mut CURRENT: usize = 0;

/// Picks the next runnable, non-idle process after `current`, scanning in
/// index order starting just past it and wrapping around (§3.4). Falls back
/// to the idle slot (index 0) if no other process is runnable; the scan
/// never re-checks `current` until every other slot has been tried, so a
/// still-runnable current process always yields to a waiting peer first.
///
/// Pure over the table's states so the round-robin policy can be exercised
/// without a live process table or trap machinery.
pub fn next_runnable(states: &[State], current: usize) -> usize {
    for i in 1..states.len() {
        let idx = (current + i) % states.len();
        if idx != 0 && states[idx] == State::Runnable {
            return idx;
        }
    }
    if states[current] == State::Runnable {
        return current;
    }
    0
}

/// Yields the CPU to the next runnable process, or returns immediately if
/// none but the current (or idle) process is runnable.
#[cfg(not(test))]
pub fn yield_now() {
    let states: [State; PROCS_MAX] = {
        let procs = PROCS.lock();
        core::array::from_fn(|i| procs[i].state)
    };

    let current = unsafe { CURRENT };
    let next = next_runnable(&states, current);
    if next == current {
        return;
    }
    unsafe { CURRENT = next };

    let prev_sp = {
        let mut procs = PROCS.lock();
        procs[current].sp_mut()
    };

    unsafe {
        super::process::switch_to(prev_sp, next);
    }
}

/// Index of the process currently running.
pub fn current() -> usize {
    unsafe { CURRENT }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    fn states(runnable: &[usize], len: usize) -> Vec<State> {
        let mut v = alloc::vec![State::Unused; len];
        for &i in runnable {
            v[i] = State::Runnable;
        }
        v
    }

    #[test]
    fn picks_next_runnable_after_current() {
        let s = states(&[2, 5], 8);
        assert_eq!(next_runnable(&s, 1), 2);
    }

    #[test]
    fn wraps_around_to_lower_indices() {
        let s = states(&[2], 8);
        assert_eq!(next_runnable(&s, 3), 2);
    }

    #[test]
    fn never_selects_idle_slot_zero() {
        let mut s = states(&[3], 8);
        s[0] = State::Runnable;
        assert_eq!(next_runnable(&s, 3), 3);
    }

    #[test]
    fn stays_on_current_when_nothing_else_runnable() {
        let s = states(&[4], 8);
        assert_eq!(next_runnable(&s, 4), 4);
    }

    #[test]
    fn prefers_a_waiting_peer_over_a_still_runnable_current() {
        // Both 3 (current) and 5 are runnable; 5 must get a turn before
        // yield hands the CPU straight back to 3, or 5 would starve.
        let s = states(&[3, 5], 8);
        assert_eq!(next_runnable(&s, 3), 5);
    }

    #[test]
    fn falls_back_to_idle_when_current_has_exited() {
        let mut s = states(&[], 8);
        s[0] = State::Runnable; // idle
        assert_eq!(next_runnable(&s, 3), 0);
    }

    #[test]
    fn every_process_scheduled_at_least_once_per_k_yields() {
        // §8: for k runnable processes, k consecutive yields visit each one.
        let runnable = [1usize, 2, 3, 4];
        let mut s = states(&runnable, 8);
        s[0] = State::Runnable;
        let mut current = 0;
        let mut seen = alloc::vec![false; 8];
        for _ in 0..runnable.len() {
            current = next_runnable(&s, current);
            seen[current] = true;
        }
        assert!(runnable.iter().all(|&p| seen[p]));
    }
}
