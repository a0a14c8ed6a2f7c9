//! Optional tracing integration.
//!
//! With the `tracing-integration` feature enabled the macros below forward to
//! the [`tracing`](https://docs.rs/tracing) crate, keeping structured fields
//! intact. Without it they expand to a dead branch that still borrows every
//! field value, so call sites never need their own `cfg` gates and emit no
//! unused-variable warnings.

#[cfg(feature = "tracing-integration")]
#[doc(hidden)]
pub use tracing as __tracing;

/// Emits a trace-level event.
#[cfg(feature = "tracing-integration")]
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => { $crate::tracing_compat::__tracing::trace!($($arg)*) };
}

/// Emits a debug-level event.
#[cfg(feature = "tracing-integration")]
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => { $crate::tracing_compat::__tracing::debug!($($arg)*) };
}

/// Emits an info-level event.
#[cfg(feature = "tracing-integration")]
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { $crate::tracing_compat::__tracing::info!($($arg)*) };
}

/// Emits a warn-level event.
#[cfg(feature = "tracing-integration")]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { $crate::tracing_compat::__tracing::warn!($($arg)*) };
}

/// Emits an error-level event.
#[cfg(feature = "tracing-integration")]
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { $crate::tracing_compat::__tracing::error!($($arg)*) };
}

/// Borrows each field of an event inside a branch that never runs.
#[cfg(not(feature = "tracing-integration"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __discard_fields {
    () => {};
    ($name:ident = %$value:expr $(, $($rest:tt)*)?) => {
        let _ = &$value;
        $($crate::__discard_fields!($($rest)*);)?
    };
    ($name:ident = ?$value:expr $(, $($rest:tt)*)?) => {
        let _ = &$value;
        $($crate::__discard_fields!($($rest)*);)?
    };
    ($name:ident = $value:expr $(, $($rest:tt)*)?) => {
        let _ = &$value;
        $($crate::__discard_fields!($($rest)*);)?
    };
    ($name:ident $(, $($rest:tt)*)?) => {
        let _ = &$name;
        $($crate::__discard_fields!($($rest)*);)?
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        let _ = format_args!($fmt $(, $arg)*);
    };
}

/// Emits a trace-level event (no-op without `tracing-integration`).
#[cfg(not(feature = "tracing-integration"))]
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {{
        if false {
            $crate::__discard_fields!($($arg)*);
        }
    }};
}

/// Emits a debug-level event (no-op without `tracing-integration`).
#[cfg(not(feature = "tracing-integration"))]
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {{
        if false {
            $crate::__discard_fields!($($arg)*);
        }
    }};
}

/// Emits an info-level event (no-op without `tracing-integration`).
#[cfg(not(feature = "tracing-integration"))]
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {{
        if false {
            $crate::__discard_fields!($($arg)*);
        }
    }};
}

/// Emits a warn-level event (no-op without `tracing-integration`).
#[cfg(not(feature = "tracing-integration"))]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        if false {
            $crate::__discard_fields!($($arg)*);
        }
    }};
}

/// Emits an error-level event (no-op without `tracing-integration`).
#[cfg(not(feature = "tracing-integration"))]
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        if false {
            $crate::__discard_fields!($($arg)*);
        }
    }};
}
