//! Task primitives shared by the pipeline and its callers: cancellation, one-shot answers, periodic checks.

pub mod cancel;
pub mod future;
pub mod periodic;

pub use cancel::CancelToken;
pub use future::{
    AnswerLost, AnswerStream, AnyAnswer, FutureAnswer, ask, ask_named, ask_stream, wait_all,
    wait_any,
};
pub use periodic::{CheckOutcome, PeriodicCheck};
