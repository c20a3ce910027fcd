#![forbid(unsafe_code)]

//! Engine log macros.
//!
//! The engine logs lifecycle transitions at `debug` and per-tick pointer
//! positions at `trace`, always through `crate::debug!` / `crate::trace!`.
//! With the `tracing` feature those are `tracing`'s macros and accept its
//! structured field syntax. Without it they expand to nothing, so call
//! sites need no `cfg` and cost nothing.

#[cfg(feature = "tracing")]
pub use tracing::{debug, trace};

#[cfg(not(feature = "tracing"))]
mod disabled {
    /// Lifecycle log line; discarded without the `tracing` feature.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// Per-tick log line; discarded without the `tracing` feature.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn macros_accept_structured_fields() {
        crate::debug!(text = %"abc", frontier = 3, "scramble play");
        crate::trace!(frontier = 3, cells = "abc".len(), "scramble tick");
    }
}
