//! One-shot answers from background threads.
//!
//! Ask several slow questions at once, then block on the answers: [`ask`] starts the work and
//! returns a [`FutureAnswer`]; [`wait_all`] / [`wait_any`] combine several of them. A producer
//! that yields more than one answer uses [`ask_stream`].

use crossbeam_channel::{Receiver, Select, Sender, bounded, unbounded};
use std::io;
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// The answering thread exited (panicked) without producing an answer.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("answering thread exited without an answer")]
pub struct AnswerLost;

/// Handle to a value being produced on another thread.
pub struct FutureAnswer<T> {
    rx: Receiver<T>,
    handle: Option<JoinHandle<()>>,
}

/// Start `f` on a new thread and return a handle to its answer.
///
/// Panics if the OS refuses to create a thread, like [`std::thread::spawn`].
/// Use [`ask_named`] to get the spawn error instead.
pub fn ask<T, F>(f: F) -> FutureAnswer<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = bounded::<T>(1);
    let handle = thread::spawn(move || {
        let _ = tx.send(f());
    });
    FutureAnswer {
        rx,
        handle: Some(handle),
    }
}

/// Like [`ask`] but names the thread and returns the spawn error.
pub fn ask_named<T, F>(name: impl Into<String>, f: F) -> io::Result<FutureAnswer<T>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = bounded::<T>(1);
    let handle = thread::Builder::new().name(name.into()).spawn(move || {
        let _ = tx.send(f());
    })?;
    Ok(FutureAnswer {
        rx,
        handle: Some(handle),
    })
}

impl<T> FutureAnswer<T> {
    /// Block until the answer is available.
    pub fn wait(mut self) -> Result<T, AnswerLost> {
        let answer = self.rx.recv().map_err(|_| AnswerLost);
        self.reap();
        answer
    }

    /// True once the answer can be taken without blocking.
    pub fn is_ready(&self) -> bool {
        !self.rx.is_empty()
    }

    fn reap(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Block on every future in turn. Answers come back in the same order as `futures`.
pub fn wait_all<T>(futures: Vec<FutureAnswer<T>>) -> Vec<Result<T, AnswerLost>> {
    futures.into_iter().map(FutureAnswer::wait).collect()
}

/// First answer to arrive, plus the futures still pending.
pub struct AnyAnswer<T> {
    /// Position of the answered future in the input vector.
    pub index: usize,
    pub answer: Result<T, AnswerLost>,
    /// The other futures, in input order.
    pub pending: Vec<FutureAnswer<T>>,
}

/// Block until any future answers. Returns None for an empty input.
pub fn wait_any<T>(mut futures: Vec<FutureAnswer<T>>) -> Option<AnyAnswer<T>> {
    if futures.is_empty() {
        return None;
    }
    let (index, answer) = {
        let mut sel = Select::new();
        for f in &futures {
            sel.recv(&f.rx);
        }
        let oper = sel.select();
        let index = oper.index();
        let answer = oper.recv(&futures[index].rx).map_err(|_| AnswerLost);
        (index, answer)
    };
    let mut answered = futures.remove(index);
    answered.reap();
    Some(AnyAnswer {
        index,
        answer,
        pending: futures,
    })
}

/// Stream of answers from one background producer. Ends when the producer returns.
pub struct AnswerStream<T> {
    rx: Receiver<T>,
    handle: Option<JoinHandle<()>>,
}

/// Start `f` on a new thread; every value it sends becomes one answer in the stream.
///
/// `f` should stop when a send fails: the stream was dropped.
pub fn ask_stream<T, F>(f: F) -> AnswerStream<T>
where
    T: Send + 'static,
    F: FnOnce(&Sender<T>) + Send + 'static,
{
    let (tx, rx) = unbounded::<T>();
    let handle = thread::spawn(move || f(&tx));
    AnswerStream {
        rx,
        handle: Some(handle),
    }
}

impl<T> Iterator for AnswerStream<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        match self.rx.recv() {
            Ok(v) => Some(v),
            Err(_) => {
                if let Some(handle) = self.handle.take() {
                    let _ = handle.join();
                }
                None
            }
        }
    }
}
