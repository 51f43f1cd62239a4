//! Ctrl-C handling for the command line.
//!
//! While a background task runs, Ctrl-C cancels it through its
//! [`CancelToken`]; the worker stops before its next file and the run ends
//! with [`crate::SortError::Cancelled`]. With no task running, Ctrl-C exits
//! immediately with [`EXIT_CODE_INTERRUPTED`].

use crate::task::{CancelToken, lock};
use std::io::Write;
use std::sync::{Arc, Mutex, OnceLock};

/// Exit code after an interrupt: 128 + SIGINT.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Routes Ctrl-C to the task currently being watched.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandler {
    current: Arc<Mutex<Option<CancelToken>>>,
}

/// Stops routing interrupts to a task when dropped.
pub struct WatchGuard<'a> {
    handler: &'a InterruptHandler,
}

impl Drop for WatchGuard<'_> {
    fn drop(&mut self) {
        *lock(&self.handler.current) = None;
    }
}

impl InterruptHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends interrupts to `token` until the guard is dropped.
    pub fn watch(&self, token: CancelToken) -> WatchGuard<'_> {
        *lock(&self.current) = Some(token);
        WatchGuard { handler: self }
    }

    /// Cancels the watched task. Returns false when nothing is watched.
    pub fn interrupt(&self) -> bool {
        match lock(&self.current).as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

static GLOBAL_HANDLER: OnceLock<InterruptHandler> = OnceLock::new();

/// Installs the process-wide Ctrl-C handler, once.
///
/// Later calls return the installed handler. If installation fails the
/// returned handler still works, it just never fires.
pub fn install_handler() -> InterruptHandler {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        return handler.clone();
    }

    let handler = InterruptHandler::new();
    let hook = handler.clone();
    match ctrlc::set_handler(move || {
        if hook.interrupt() {
            let _ = writeln!(
                std::io::stderr(),
                "\nInterrupted. Stopping after the current file..."
            );
            log::info!("Interrupt received, cancelling task");
        } else {
            std::process::exit(EXIT_CODE_INTERRUPTED);
        }
    }) {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler.clone());
        }
        Err(e) => log::warn!("Could not install Ctrl-C handler: {}", e),
    }
    handler
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_without_task() {
        let handler = InterruptHandler::new();
        assert!(!handler.interrupt());
    }

    #[test]
    fn test_interrupt_cancels_watched_token() {
        let handler = InterruptHandler::new();
        let token = CancelToken::new();
        {
            let _guard = handler.watch(token.clone());
            assert!(handler.interrupt());
        }
        assert!(token.is_cancelled());
        // The guard is gone; a second interrupt has nothing to cancel.
        assert!(!handler.interrupt());
    }
}
