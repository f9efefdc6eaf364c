//! Helper to set the backtrace env var.

use std::sync::Once;

static INIT: Once = Once::new();

/// Sets `RUST_BACKTRACE=1` unless the variable is already set.
///
/// Must be called before the runtime spawns any thread, since it mutates the process
/// environment. Calls after the first are no-ops.
pub fn enable() {
    INIT.call_once(|| {
        if std::env::var_os("RUST_BACKTRACE").is_none() {
            // SAFETY: called from `main` before any other thread is started.
            unsafe { std::env::set_var("RUST_BACKTRACE", "1") };
        }
    });
}
