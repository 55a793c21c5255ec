//! Internal compiler errors.
//!
//! Broken invariants inside the backend (a cache load emitted from the
//! wrong function, a local with two storage kinds, an escaped variable
//! read with no closure environment) are bugs in the compiler, never in
//! the program being compiled. They are logged and then abort compilation
//! with a panic; they are not threaded through `Result`.

use std::fmt;

/// Log `message` as an internal compiler error and panic.
#[cold]
#[track_caller]
pub fn internal_error(message: fmt::Arguments<'_>) -> ! {
    let location = std::panic::Location::caller();
    tracing::error!(%location, "internal compiler error: {message}");
    panic!("internal compiler error: {message}");
}

/// Report an internal compiler error with `format!`-style arguments.
///
/// ```ignore
/// ice!("method entry for {name} used from another function");
/// ```
#[macro_export]
macro_rules! ice {
    ($($arg:tt)*) => {
        $crate::ice::internal_error(format_args!($($arg)*))
    };
}
