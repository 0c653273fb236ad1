//! Inferred sub-journey completion rules.
//!
//! The engine never emits an explicit "sub-journey ended" signal. Nesting is
//! inferred from the single global orchestration counter:
//!
//! - a counter *gap* (`new - last > 1`) while nested means the engine
//!   returned through skipped or short-circuited parent steps;
//! - a counter *decrease* while nested means execution resumed in an
//!   ancestor whose step list was further along.
//!
//! This resolver is a pure function over a stack snapshot so the ambiguous
//! boundary cases can be tested in isolation. The no-counter-update rule
//! (sub-journey completion without a step advance) lives in the
//! orchestration interpreter because it needs no stack scan.

use crate::journey::JourneyContext;

/// Number of contexts to pop for a counter update of `new_step`, given a
/// bottom-to-top stack snapshot. Returns 0 when not nested, when the update
/// is an ordinary advance, or when a gap matches no ancestor (the skipped
/// steps were local preconditions, not a sub-journey return). Never asks to
/// pop the root.
pub fn resolve_pops(stack: &[JourneyContext], new_step: i64) -> usize {
    if stack.len() <= 1 {
        return 0;
    }
    let top = stack.last().expect("stack checked non-empty");
    let diff = new_step - top.last_orchestration_step;

    if diff > 1 {
        // Gap: scan ancestors top-down for the one this counter continues.
        for pops in 1..stack.len() {
            let ancestor = &stack[stack.len() - 1 - pops];
            if new_step - ancestor.last_orchestration_step == 1 {
                return pops;
            }
        }
        return 0;
    }

    if diff < 0 {
        // Decrease: pop the current context, then keep popping while the
        // counter is still behind the ancestor, never consuming the root.
        let mut pops = 1;
        while pops < stack.len() - 1 {
            let ancestor = &stack[stack.len() - 1 - pops];
            if new_step < ancestor.last_orchestration_step {
                pops += 1;
            } else {
                break;
            }
        }
        return pops;
    }

    0
}
