//! Background task helpers: future answers, answer streams, periodic checks, cancel tokens.

mod common;

use crossbeam_channel::{after, select};
use fanpipe::CancelToken;
use fanpipe::tasks::{
    AnswerLost, CheckOutcome, PeriodicCheck, ask, ask_named, ask_stream, wait_all, wait_any,
};
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

#[test]
fn test_ask_returns_answer() {
    let answer = ask(|| 6 * 7);
    assert_eq!(answer.wait(), Ok(42));
}

#[test]
fn test_ask_named_runs_on_named_thread() {
    let answer = ask_named("answer-thread", || {
        thread::current().name().map(str::to_string)
    })
    .unwrap();
    assert_eq!(answer.wait().unwrap().as_deref(), Some("answer-thread"));
}

#[test]
fn test_panicking_answer_is_lost() {
    let answer = ask(|| -> u32 { panic!("no answer today") });
    assert_eq!(answer.wait(), Err(AnswerLost));
}

#[test]
fn test_wait_all_keeps_input_order() {
    let futures = vec![
        ask(|| {
            thread::sleep(Duration::from_millis(60));
            "slow"
        }),
        ask(|| "fast"),
        ask(|| {
            thread::sleep(Duration::from_millis(20));
            "medium"
        }),
    ];
    let answers: Vec<_> = wait_all(futures).into_iter().map(Result::unwrap).collect();
    assert_eq!(answers, vec!["slow", "fast", "medium"]);
}

#[test]
fn test_wait_any_returns_first_answer_and_pending() {
    let futures = vec![
        ask(|| {
            thread::sleep(Duration::from_millis(300));
            1
        }),
        ask(|| 2),
    ];
    let first = wait_any(futures).unwrap();
    assert_eq!(first.index, 1);
    assert_eq!(first.answer, Ok(2));
    assert_eq!(first.pending.len(), 1);

    let rest = wait_all(first.pending);
    assert_eq!(rest, vec![Ok(1)]);
}

#[test]
fn test_wait_any_empty_is_none() {
    assert!(wait_any::<u8>(Vec::new()).is_none());
}

#[test]
fn test_is_ready_after_answer_arrives() {
    let answer = ask(|| 5);
    let deadline = after(Duration::from_secs(5));
    while !answer.is_ready() {
        assert!(deadline.is_empty(), "answer never became ready");
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(answer.wait(), Ok(5));
}

#[test]
fn test_ask_stream_yields_every_value_then_ends() {
    let stream = ask_stream(|tx| {
        for i in 0..5 {
            if tx.send(i * 10).is_err() {
                return;
            }
        }
    });
    assert_eq!(stream.collect::<Vec<_>>(), vec![0, 10, 20, 30, 40]);
}

#[test]
fn test_cancel_token_closes_receiver() {
    let token = CancelToken::new();
    let observer = token.clone();
    assert!(!observer.is_cancelled());

    let waiter = ask(move || {
        select! {
            recv(observer.closed()) -> _ => observer.is_cancelled(),
            recv(after(Duration::from_secs(5))) -> _ => false,
        }
    });
    thread::sleep(Duration::from_millis(20));
    token.cancel();
    token.cancel();
    assert_eq!(waiter.wait(), Ok(true));
    assert!(token.is_cancelled());
}

#[test]
fn test_periodic_check_triggers() {
    let hits = common::counter();
    let hits_check = hits.clone();
    let check = PeriodicCheck::spawn(Duration::from_millis(5), CancelToken::new(), move || {
        hits_check.fetch_add(1, Ordering::SeqCst) + 1 >= 3
    })
    .unwrap();
    assert_eq!(check.wait(), CheckOutcome::Triggered);
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[test]
fn test_periodic_check_stops_on_cancel() {
    let stop = CancelToken::new();
    let check = PeriodicCheck::spawn(Duration::from_millis(5), stop.clone(), || false).unwrap();
    thread::sleep(Duration::from_millis(30));
    stop.cancel();
    assert_eq!(check.wait(), CheckOutcome::Stopped);
}

#[test]
fn test_periodic_check_outcome_usable_in_select() {
    let check =
        PeriodicCheck::spawn(Duration::from_millis(5), CancelToken::new(), || true).unwrap();
    let got = select! {
        recv(check.outcome()) -> outcome => outcome.ok(),
        recv(after(Duration::from_secs(5))) -> _ => None,
    };
    assert_eq!(got, Some(CheckOutcome::Triggered));
}
