//! Panic capture, call serialisation, and bounded execution.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError, mpsc};
use std::thread;
use std::time::Duration;

/// Reasons a bounded call produced no value.
#[derive(Debug)]
pub(super) enum Abandoned {
    /// The budget elapsed; the worker keeps running detached.
    TimedOut,
    /// The worker exited without reporting.
    Lost,
    /// The worker thread could not be created.
    Spawn(io::Error),
}

/// Runs `call` while holding `gate` (when present), converting a panic into
/// its rendered message.
///
/// The gate is acquired outside the unwind boundary so a panicking handler
/// never poisons it.
pub(super) fn guarded<T>(gate: Option<&Mutex<()>>, call: impl FnOnce() -> T) -> Result<T, String> {
    let _permit = gate.map(|gate| gate.lock().unwrap_or_else(PoisonError::into_inner));
    panic::catch_unwind(AssertUnwindSafe(call)).map_err(panic_message)
}

/// Runs `call` on a worker thread and waits at most `timeout` for it.
pub(super) fn bounded<T, F>(name: &str, timeout: Duration, call: F) -> Result<T, Abandoned>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (sender, receiver) = mpsc::sync_channel(1);
    thread::Builder::new()
        .name(name.to_owned())
        .spawn(move || {
            // The receiver is gone once the caller has given up.
            let _ignored = sender.send(call());
        })
        .map_err(Abandoned::Spawn)?;
    match receiver.recv_timeout(timeout) {
        Ok(value) => Ok(value),
        Err(mpsc::RecvTimeoutError::Timeout) => Err(Abandoned::TimedOut),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(Abandoned::Lost),
    }
}

pub(super) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => payload
            .downcast_ref::<&'static str>()
            .map_or_else(|| "non-string panic payload".to_owned(), |message| (*message).to_owned()),
    }
}
