#![deny(missing_docs)]
//! Shared logging utilities for the mirror workspace.
//!
//! Library crates never talk to a concrete logger. They log through the
//! `mirror_*` macros below, which forward to the `log` facade, and the
//! binary decides where the records end up.

/// Log target used by the sync driver, so its records can be filtered
/// separately from request handling.
pub const SYNC_TARGET: &str = "mirror::sync";

/// Log target used by the subscriber registry and the SSE transport.
pub const FANOUT_TARGET: &str = "mirror::fanout";

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! mirror_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! mirror_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! mirror_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! mirror_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! mirror_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Initializes a terminal logger for tests.
///
/// Safe to call from every test: the second and later calls are no-ops.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may already have installed the logger.
    let _ = TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto);
}
