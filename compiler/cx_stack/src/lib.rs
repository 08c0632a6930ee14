//! Stack safety for recursive walks over expression and declaration graphs.
//!
//! Constant folding, statement serialization and on-demand declaration
//! loading all recurse along the node graph. A left-leaning chain of
//! binary operators or a long redeclaration chain spread across module
//! files can nest far deeper than the default thread stack allows, so
//! every such recursion goes through [`ensure_sufficient_stack`].
//!
//! On native targets the stack is grown on demand with `stacker`; on
//! `wasm32` the call is a plain passthrough.

/// Remaining stack below which a new segment is allocated (128KB).
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment (2MB).
const STACK_PER_RECURSION: usize = 2 * 1024 * 1024;

/// Run `f`, first growing the stack if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
