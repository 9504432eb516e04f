//! One-shot broadcast stop signal.
//!
//! The signal is a channel that never carries a message: firing the trigger
//! drops the only sender, which disconnects the channel. Every receiver, now
//! and in the future, then sees `Disconnected` immediately. That makes the
//! signal usable as an arm of `crossbeam_channel::select!` next to queue
//! operations and tickers.

use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

/// Create a connected trigger/signal pair.
#[must_use]
pub fn stop_signal() -> (StopTrigger, StopSignal) {
    let (tx, rx) = bounded(0);
    (StopTrigger { tx: Some(tx) }, StopSignal { rx })
}

/// Owning side of the stop signal. Dropping it also fires the signal.
#[derive(Debug)]
pub struct StopTrigger {
    tx: Option<Sender<()>>,
}

impl StopTrigger {
    /// Fire the signal. Returns `true` only for the call that fired it.
    pub fn fire(&mut self) -> bool {
        self.tx.take().is_some()
    }

    /// Whether this trigger has fired.
    #[must_use]
    pub const fn is_fired(&self) -> bool {
        self.tx.is_none()
    }
}

/// Observing side of the stop signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: Receiver<()>,
}

impl StopSignal {
    /// Whether the signal has fired.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Block until the signal fires.
    pub fn wait(&self) {
        let _ = self.rx.recv();
    }

    /// Block until the signal fires or `timeout` elapses. Returns `true` if it fired.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        matches!(
            self.rx.recv_timeout(timeout),
            Err(RecvTimeoutError::Disconnected)
        )
    }

    /// Channel to place in a `select!` arm; it becomes ready when stopped.
    pub(crate) const fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}
