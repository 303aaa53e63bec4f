//! Cancellable periodic check: run a probe on a fixed interval until it fires or is stopped.

use crossbeam_channel::{Receiver, bounded, select, tick};
use log::debug;
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::CancelToken;

/// How a [`PeriodicCheck`] ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The check returned true.
    Triggered,
    /// The stop token was cancelled first.
    Stopped,
}

/// Background ticker. Runs `check` every `interval`; notifies once through [`outcome`](Self::outcome).
pub struct PeriodicCheck {
    outcome_rx: Receiver<CheckOutcome>,
    handle: JoinHandle<()>,
}

impl PeriodicCheck {
    /// Start the ticker thread. The first check runs one `interval` after start.
    pub fn spawn<F>(interval: Duration, stop: CancelToken, mut check: F) -> io::Result<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let (outcome_tx, outcome_rx) = bounded::<CheckOutcome>(1);
        let handle = thread::Builder::new()
            .name(format!("{}-check", env!("CARGO_PKG_NAME")))
            .spawn(move || {
                let ticker = tick(interval);
                let outcome = loop {
                    select! {
                        recv(ticker) -> _ => {
                            if check() {
                                break CheckOutcome::Triggered;
                            }
                        }
                        recv(stop.closed()) -> _ => break CheckOutcome::Stopped,
                    }
                };
                debug!("periodic check finished: {:?}", outcome);
                let _ = outcome_tx.send(outcome);
            })?;
        Ok(Self { outcome_rx, handle })
    }

    /// One-shot notification; receives exactly one outcome. Usable in `select!`.
    pub fn outcome(&self) -> &Receiver<CheckOutcome> {
        &self.outcome_rx
    }

    /// Block until the check finishes and join its thread.
    pub fn wait(self) -> CheckOutcome {
        let outcome = self.outcome_rx.recv().unwrap_or(CheckOutcome::Stopped);
        let _ = self.handle.join();
        outcome
    }
}
