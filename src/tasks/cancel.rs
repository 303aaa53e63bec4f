use crossbeam_channel::{Receiver, Sender, bounded};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared done-flag. Cloning shares the same flag.
///
/// Besides polling [`is_cancelled`](Self::is_cancelled), blocking code can wait on
/// [`closed`](Self::closed) inside `crossbeam_channel::select!`: the receiver never yields a
/// message and becomes ready (disconnected) the moment the token is cancelled.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

struct CancelInner {
    flag: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    closed: Receiver<()>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (trigger, closed) = bounded::<()>(0);
        Self {
            inner: Arc::new(CancelInner {
                flag: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                closed,
            }),
        }
    }

    /// Raise the flag. Idempotent.
    pub fn cancel(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        // Dropping the only sender disconnects `closed`.
        self.inner
            .trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Receiver that becomes ready once cancelled. For use in `select!`.
    pub fn closed(&self) -> &Receiver<()> {
        &self.inner.closed
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
