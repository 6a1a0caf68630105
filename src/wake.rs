//! Cancellable delayed-wake capability for servicing [`Redraw::At`]
//! requests.
//!
//! The engine never sleeps on its own; after an animation burst it hands the
//! host a wake deadline. This module is the host-side implementation: a
//! worker thread parked on a channel with a timeout. Dropping (or
//! explicitly cancelling) the handle disconnects the channel before the
//! timeout fires, which guarantees the callback never runs against a
//! disposed engine.
//!
//! [`Redraw::At`]: crate::engine::Redraw::At

use std::{thread, time::Duration};

use crossbeam_channel::{RecvTimeoutError, Sender, bounded};

/// Guard for one scheduled wake. Dropping it cancels the wake.
pub struct WakeHandle {
    cancel: Option<Sender<()>>,
}

impl WakeHandle {
    /// Cancels the wake explicitly. Equivalent to dropping the handle.
    pub fn cancel(mut self) {
        self.cancel.take();
    }
}

impl Drop for WakeHandle {
    fn drop(&mut self) {
        self.cancel.take();
    }
}

/// Runs `callback` after `delay` unless the returned handle is cancelled or
/// dropped first.
pub fn schedule_wake(delay: Duration, callback: impl FnOnce() + Send + 'static) -> WakeHandle {
    let (tx, rx) = bounded::<()>(0);
    thread::spawn(move || match rx.recv_timeout(delay) {
        Err(RecvTimeoutError::Timeout) => callback(),
        // Sender dropped or signalled: the wake was cancelled.
        Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
    });
    WakeHandle { cancel: Some(tx) }
}
