//! Fallible render scope.
//!
//! A failure while composing the scene — a bad photo payload, a panic in
//! drawing code — must not take the whole application down.  The
//! supervisor runs the fallible part of each frame, traps both `Err` and
//! panics, and keeps the frame loop in a fallback state until the user
//! explicitly asks for a retry.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::error;

pub struct RenderSupervisor {
    failure: Option<String>,
}

impl Default for RenderSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSupervisor {
    pub fn new() -> Self {
        RenderSupervisor { failure: None }
    }

    /// The current failure message, if the scope is tripped.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Clear the failure and allow the next `run` to re-attempt.
    pub fn reset(&mut self) {
        self.failure = None;
    }

    /// Run a fallible render step.  While tripped, the step is skipped
    /// entirely; an `Err` or a panic trips the scope and yields `None`.
    pub fn run<T>(&mut self, step: impl FnOnce() -> Result<T, String>) -> Option<T> {
        if self.failure.is_some() {
            return None;
        }
        match catch_unwind(AssertUnwindSafe(step)) {
            Ok(Ok(value)) => Some(value),
            Ok(Err(message)) => {
                error!("scene error: {message}");
                self.failure = Some(message);
                None
            }
            Err(panic) => {
                let message = panic_message(panic);
                error!("panic during scene render: {message}");
                self.failure = Some(message);
                None
            }
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_passes_through() {
        let mut sup = RenderSupervisor::new();
        assert_eq!(sup.run(|| Ok(7)), Some(7));
        assert!(sup.failure().is_none());
    }

    #[test]
    fn error_trips_and_skips_until_reset() {
        let mut sup = RenderSupervisor::new();
        assert_eq!(sup.run(|| Err::<(), _>("boom".to_string())), None);
        assert_eq!(sup.failure(), Some("boom"));

        // Tripped scope never even calls the step.
        let mut called = false;
        let _ = sup.run(|| {
            called = true;
            Ok(())
        });
        assert!(!called);

        sup.reset();
        assert_eq!(sup.run(|| Ok(1)), Some(1));
    }

    #[test]
    fn panic_is_trapped_with_its_message() {
        let mut sup = RenderSupervisor::new();
        let out: Option<()> = sup.run(|| panic!("texture missing"));
        assert_eq!(out, None);
        assert_eq!(sup.failure(), Some("texture missing"));
    }
}
