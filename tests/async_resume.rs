//! Held transitions completed from async tasks.

use std::time::Duration;
use tokio::sync::oneshot;
use turnstile::builder::MachineBuilder;
use turnstile::engine::{FireError, FireResult, SharedMachine, Slot, Verdict};

fn downloader() -> SharedMachine {
    MachineBuilder::new()
        .initial("idle")
        .event("fetch", "idle", "ready")
        .event("reset", "ready", "idle")
        .on(Slot::leave("idle"), |_| Ok(Verdict::Defer))
        .build()
        .unwrap()
        .into()
}

#[tokio::test]
async fn resume_after_background_work() {
    let shared = downloader();
    let ticket = shared.fire("fetch").unwrap().pending().cloned().unwrap();

    let (done_tx, done_rx) = oneshot::channel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let _ = done_tx.send("payload");
    });

    assert!(shared.is_state("idle"));
    assert!(matches!(shared.fire("reset"), Err(FireError::InvalidTransition { .. })));

    assert_eq!(done_rx.await.unwrap(), "payload");
    assert_eq!(shared.resume_transition(&ticket).unwrap(), FireResult::Committed);
    assert!(shared.is_state("ready"));
}

#[tokio::test]
async fn resume_from_spawned_task() {
    let shared = downloader();
    let ticket = shared.fire("fetch").unwrap().pending().cloned().unwrap();

    let handle = shared.clone();
    let resumed = tokio::task::spawn_blocking(move || handle.resume_transition(&ticket))
        .await
        .unwrap();

    assert_eq!(resumed.unwrap(), FireResult::Committed);
    assert!(shared.is_state("ready"));
    assert!(shared.pending().is_none());
}

#[tokio::test]
async fn abandon_from_spawned_task() {
    let shared = downloader();
    let ticket = shared.fire("fetch").unwrap().pending().cloned().unwrap();

    let handle = shared.clone();
    let stale = ticket.clone();
    tokio::task::spawn_blocking(move || handle.abandon_transition(&ticket))
        .await
        .unwrap()
        .unwrap();

    assert!(shared.is_state("idle"));
    assert!(shared.can("fetch"));
    assert!(matches!(
        shared.resume_transition(&stale),
        Err(FireError::NotPending)
    ));
}
