//! Concurrency tests for the run store
//!
//! Racing callers must see each check-then-act as atomic: one winner per
//! checkpoint resolution or run completion, and exactly one audit entry.

mod fixtures;

use automation_runs::{Receipt, RunEventKind, RunStatus, RunStoreError};
use fixtures::store_with_run;
use serde_json::json;
use std::sync::{Arc, Barrier};
use std::thread;

const CONTENDERS: usize = 16;

#[test]
fn test_concurrent_resolves_have_one_winner() {
    let (store, run) = store_with_run();
    let checkpoint = store.add_checkpoint(&run.id, json!({"step": "review"})).unwrap();
    let barrier = Arc::new(Barrier::new(CONTENDERS));

    let results: Vec<Result<(), RunStoreError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..CONTENDERS)
            .map(|_| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                let run_id = run.id.clone();
                let checkpoint_id = checkpoint.id.clone();
                scope.spawn(move || {
                    barrier.wait();
                    store.resolve_checkpoint(&run_id, &checkpoint_id)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let already = results
        .iter()
        .filter(|r| **r == Err(RunStoreError::AlreadyResolved))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(already, CONTENDERS - 1);

    let run = store.get_run(&run.id).unwrap();
    let resolved_events = run
        .events
        .iter()
        .filter(|e| e.kind == RunEventKind::CheckpointResolved)
        .filter(|e| e.checkpoint_id.as_ref() == Some(&checkpoint.id))
        .count();
    assert_eq!(resolved_events, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_completions_issue_one_receipt() {
    let (store, run) = store_with_run();

    let handles: Vec<_> = (0..CONTENDERS)
        .map(|_| {
            let store = Arc::clone(&store);
            let run_id = run.id.clone();
            tokio::spawn(async move { store.complete_run(&run_id) })
        })
        .collect();

    let mut receipts: Vec<Receipt> = Vec::new();
    let mut already_terminal = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(receipt) => receipts.push(receipt),
            Err(RunStoreError::AlreadyTerminal) => already_terminal += 1,
            Err(other) => panic!("unexpected rejection: {other}"),
        }
    }

    assert_eq!(receipts.len(), 1);
    assert_eq!(already_terminal, CONTENDERS - 1);

    let run = store.get_run(&run.id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.receipt.as_ref(), receipts.first());
}

#[test]
fn test_completion_racing_checkpoint_never_completes_with_open_gate() {
    for _ in 0..50 {
        let (store, run) = store_with_run();
        let barrier = Arc::new(Barrier::new(2));

        let (added, completed) = thread::scope(|scope| {
            let adder = {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                let run_id = run.id.clone();
                scope.spawn(move || {
                    barrier.wait();
                    store.add_checkpoint(&run_id, json!({}))
                })
            };
            let completer = {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                let run_id = run.id.clone();
                scope.spawn(move || {
                    barrier.wait();
                    store.complete_run(&run_id)
                })
            };
            (adder.join().unwrap(), completer.join().unwrap())
        });

        let run = store.get_run(&run.id).unwrap();
        match (added, completed) {
            // Checkpoint first: completion must have been refused
            (Ok(_), Err(RunStoreError::CheckpointPending)) => {
                assert_eq!(run.status, RunStatus::AwaitingCheckpoint);
                assert!(run.receipt.is_none());
            }
            // Completion first: the terminal run refuses the checkpoint
            (Err(RunStoreError::NotFound), Ok(_)) => {
                assert_eq!(run.status, RunStatus::Completed);
                assert!(run.checkpoints.is_empty());
            }
            other => panic!("inconsistent interleaving: {other:?}"),
        }
        assert_eq!(store.audit_run(&run.id), Some(Ok(())));
    }
}

#[test]
fn test_concurrent_readers_see_whole_runs() {
    let (store, run) = store_with_run();

    thread::scope(|scope| {
        let writer = {
            let store = Arc::clone(&store);
            let run_id = run.id.clone();
            scope.spawn(move || {
                for _ in 0..200 {
                    let cp = store.add_checkpoint(&run_id, json!({})).unwrap();
                    store.resolve_checkpoint(&run_id, &cp.id).unwrap();
                }
            })
        };

        for _ in 0..4 {
            let store = Arc::clone(&store);
            let run_id = run.id.clone();
            scope.spawn(move || {
                for _ in 0..200 {
                    let snapshot = store.get_run(&run_id).unwrap();
                    // Each snapshot's status must match its own last event
                    assert_eq!(snapshot.events.last().unwrap().status, snapshot.status);
                    assert!(snapshot.events.len() > snapshot.checkpoints.len());
                    assert!(store.has_pending_checkpoints(&run_id).is_some());
                }
            });
        }

        writer.join().unwrap();
    });

    let run = store.get_run(&run.id).unwrap();
    assert_eq!(run.checkpoints.len(), 200);
    assert_eq!(run.status, RunStatus::Created);
    assert_eq!(store.audit_run(&run.id), Some(Ok(())));
}
