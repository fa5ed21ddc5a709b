#![deny(missing_docs)]
//! Shared logging utilities for the collector workspace.
//!
//! This crate provides the `collector_*` logging macros used across the
//! codebase and a minimal test initializer for the global logger. Every line
//! is prefixed with the sequence number of the logical message being
//! processed so interleaved chunk logs can be correlated.

use std::cell::Cell;

thread_local! {
    /// Thread-local storage for the current logical message sequence number.
    static MESSAGE_SEQ: Cell<u64> = const { Cell::new(0) };
}

/// Sets the logical message sequence number for the current thread.
/// The engine calls this once whenever a new logical message begins.
pub fn set_message_seq(seq: u64) {
    MESSAGE_SEQ.with(|v| v.set(seq));
}

/// Retrieves the logical message sequence number for the current thread.
/// Returns 0 if no message has been started on this thread.
pub fn current_message_seq() -> u64 {
    MESSAGE_SEQ.with(|v| v.get())
}

/// Logs a trace-level message, prefixed with the current message sequence.
#[macro_export]
macro_rules! collector_trace {
    ($($arg:tt)*) => {{
        log::trace!("[msg {}] {}", $crate::current_message_seq(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message, prefixed with the current message sequence.
#[macro_export]
macro_rules! collector_debug {
    ($($arg:tt)*) => {{
        log::debug!("[msg {}] {}", $crate::current_message_seq(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message, prefixed with the current message sequence.
#[macro_export]
macro_rules! collector_info {
    ($($arg:tt)*) => {{
        log::info!("[msg {}] {}", $crate::current_message_seq(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message, prefixed with the current message sequence.
#[macro_export]
macro_rules! collector_warn {
    ($($arg:tt)*) => {{
        log::warn!("[msg {}] {}", $crate::current_message_seq(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message, prefixed with the current message sequence.
#[macro_export]
macro_rules! collector_error {
    ($($arg:tt)*) => {{
        log::error!("[msg {}] {}", $crate::current_message_seq(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
