//! Dispatcher: feed items into the bounded work queue, then close it.

use crossbeam_channel::{Sender, select};
use log::{debug, warn};

use crate::WorkItem;
use crate::tasks::CancelToken;

/// Push every item onto `work_tx` in input order, blocking while the queue is full.
/// Consumes `work_tx`; dropping it closes the queue so workers see exhaustion.
///
/// Stops early when `cancel` fires or every worker has gone away. Returns the count of items pushed.
pub fn dispatch<I>(items: I, work_tx: Sender<WorkItem>, cancel: &CancelToken) -> usize
where
    I: IntoIterator<Item = WorkItem>,
{
    let mut sent = 0_usize;
    for item in items {
        if cancel.is_cancelled() {
            debug!("dispatch: cancelled after {} items", sent);
            break;
        }
        select! {
            send(work_tx, item) -> res => {
                if res.is_err() {
                    warn!("dispatch: no workers left to receive items; stopping after {}", sent);
                    break;
                }
                sent += 1;
            }
            recv(cancel.closed()) -> _ => {
                debug!("dispatch: cancelled while waiting for queue space after {} items", sent);
                break;
            }
        }
    }
    drop(work_tx);
    debug!("dispatch: queue closed, {} items sent", sent);
    sent
}
