//! Keeps the tree walk from running off the end of the native stack.
//!
//! Every script-level call nests several evaluator frames, so deep but
//! legitimate recursion needs more stack than a thread starts with.

/// Stack that must remain before recursing further.
const RED_ZONE: usize = 128 * 1024;

/// Size of each extra segment when the stack has to grow.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first moving to a fresh stack segment if the current one is
/// nearly exhausted.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
