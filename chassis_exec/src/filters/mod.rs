//! # Temporal filters module
//!
//! Small filters used to condition signals between control cycles. Each
//! filter is a plain state struct advanced by a pure update function, with a
//! thin owning wrapper for convenience.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod debounce;
mod rate_limiter;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use debounce::*;
pub use rate_limiter::*;
