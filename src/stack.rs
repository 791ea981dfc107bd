//! Stack growth for deep recursion.
//!
//! Reading and evaluation recurse once per nesting level. The depth limits in
//! [`Config`](crate::Config) decide when a program is too deep; this module makes
//! sure the native stack never runs out first, by growing it on demand.

/// If less than this remains, grow the stack
const RED_ZONE: usize = 128 * 1024;

/// Size of each additional stack segment
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first growing the stack if less than the red zone remains
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
