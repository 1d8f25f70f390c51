//! Stack growth for the recursive passes.
//!
//! Parser, resolver and interpreter recurse once per syntactic nesting level
//! and per Lox call.  Wrapping those entry points in
//! [`ensure_sufficient_stack`] moves execution onto a freshly allocated
//! segment when the remaining stack drops below [`RED_ZONE`], so deep (but
//! bounded) programs never hit the host's guard page.  Unbounded Lox recursion
//! is stopped separately by the interpreter's call‑depth limit.

/// Minimum stack space to keep available (100KB red zone).
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
