//! Runtime diagnostics
//!
//! Marshaling failures never unwind into the engine. They are reported here
//! and the offending operation becomes a no-op.

use std::cell::RefCell;

thread_local! {
    static CAPTURED: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Report a runtime error
pub fn print_err(message: impl Into<String>) {
    let message = message.into();
    tracing::error!(target: "gdbind::runtime", "{}", message);
    CAPTURED.with(|captured| captured.borrow_mut().push(message));
}

/// Drain the diagnostics reported on this thread
pub fn take_diagnostics() -> Vec<String> {
    CAPTURED.with(|captured| std::mem::take(&mut *captured.borrow_mut()))
}
