//! Stack growth for rendering deeply nested fragments.
//!
//! Fragment nesting depth is decided by the caller, so every recursive
//! render goes through [`ensure_sufficient_stack`].

/// Grow the stack when less than this remains (64KB).
const RED_ZONE: usize = 64 * 1024;

/// Size of each newly allocated stack segment (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Runs `f`, first moving to a fresh stack segment if the current one is
/// nearly exhausted.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
	stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
	f()
}
