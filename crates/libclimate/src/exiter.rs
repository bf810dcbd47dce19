//! Exit strategies.
//!
//! Every terminal path (help, version, failed verification, abort) ends in
//! [`Exiter::exit`]. [`ProcessExiter`] never returns; [`CaptureExiter`] and
//! [`StubExiter`] do, so code after the call runs when they are in use.

use std::fmt;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Defines if/how a process is exited.
pub trait Exiter: fmt::Debug + Send + Sync {
    fn exit(&self, code: i32);
}

/// Ends the process with the given status.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExiter;

impl Exiter for ProcessExiter {
    fn exit(&self, code: i32) {
        tracing::debug!(code, "exiting process");
        std::process::exit(code);
    }
}

/// Records the exit code instead of exiting. Intended as a test double.
#[derive(Debug, Default)]
pub struct CaptureExiter {
    code: Mutex<Option<i32>>,
    calls: AtomicUsize,
}

impl CaptureExiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent exit code, if `exit` has been called.
    pub fn exit_code(&self) -> Option<i32> {
        *self.code.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// How many times `exit` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Exiter for CaptureExiter {
    fn exit(&self, code: i32) {
        *self.code.lock().unwrap_or_else(PoisonError::into_inner) = Some(code);
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Does nothing. Intended as a test double.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubExiter;

impl Exiter for StubExiter {
    fn exit(&self, _code: i32) {}
}
