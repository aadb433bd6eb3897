//! End-to-end queue behavior against the in-memory engine.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::FakeEngine;
use wharf_download::{
    DownloadRequest, EngineError, EngineEvent, TaskId, TaskState, TransferEnginePort,
    TransferQueue, TransferQueueDeps, build_transfer_queue, event_channel,
    reconciler::EventReconciler,
};

fn build() -> (Arc<FakeEngine>, TransferQueue, EventReconciler) {
    let (event_tx, event_rx) = event_channel();
    let engine = FakeEngine::new(event_tx);
    let (queue, reconciler) = build_transfer_queue(TransferQueueDeps {
        engine: Arc::clone(&engine) as Arc<dyn TransferEnginePort>,
        events: event_rx,
    });
    (engine, queue, reconciler)
}

#[tokio::test]
async fn test_add_creates_queued_task_with_zero_progress() {
    let (_engine, queue, _reconciler) = build();

    let id = queue
        .dispatcher
        .add(DownloadRequest::new("https://h/f.zip", "/d/f.zip"))
        .await
        .unwrap();

    let task = queue.state.task(&id).await.unwrap();
    assert_eq!(task.state, TaskState::Queued);
    assert_eq!(task.progress.downloaded_bytes, 0);
    assert_eq!(task.name, "f.zip");
}

#[tokio::test]
async fn test_progress_event_yields_fifty_percent() {
    let (_engine, queue, reconciler) = build();
    let id = queue
        .dispatcher
        .add(DownloadRequest::new("https://h/f.zip", "/d/f.zip"))
        .await
        .unwrap();

    reconciler
        .handle(EngineEvent::progress(
            id.as_str(),
            512_000,
            Some(1_024_000),
            100_000,
        ))
        .await;

    let task = queue.state.task(&id).await.unwrap();
    assert!((task.progress.percent - 50.0).abs() < 0.01);
}

#[tokio::test]
async fn test_clear_finished_removes_exactly_terminal_tasks() {
    let (engine, queue, _reconciler) = build();
    engine
        .seed_task(common::task_fixture("c1", TaskState::Completed, 10, Some(10)))
        .await;
    engine
        .seed_task(common::task_fixture("c2", TaskState::Completed, 10, Some(10)))
        .await;
    engine
        .seed_task(common::task_fixture("f1", TaskState::Failed, 3, Some(10)))
        .await;
    engine
        .seed_task(common::task_fixture("d1", TaskState::Downloading, 5, Some(10)))
        .await;
    queue.dispatcher.refresh().await.unwrap();

    let removed = queue.dispatcher.clear_finished().await.unwrap();

    assert_eq!(removed, 3);
    let remaining = queue.state.tasks().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].state, TaskState::Downloading);
}

#[tokio::test]
async fn test_pause_all_is_idempotent() {
    let (engine, queue, _reconciler) = build();
    engine
        .seed_task(common::task_fixture("q1", TaskState::Queued, 0, None))
        .await;
    engine
        .seed_task(common::task_fixture("d1", TaskState::Downloading, 5, Some(10)))
        .await;
    engine
        .seed_task(common::task_fixture("c1", TaskState::Completed, 10, Some(10)))
        .await;

    let first = queue.dispatcher.pause_all().await.unwrap();
    let second = queue.dispatcher.pause_all().await.unwrap();

    assert_eq!(first, 2);
    assert_eq!(second, 0);
}

#[tokio::test]
async fn test_retry_failed_requeues_only_failed_tasks() {
    let (engine, queue, _reconciler) = build();
    engine
        .seed_task(common::task_fixture("f1", TaskState::Failed, 3, Some(10)))
        .await;
    engine
        .seed_task(common::task_fixture("f2", TaskState::Failed, 6, Some(10)))
        .await;
    engine
        .seed_task(common::task_fixture("done", TaskState::Completed, 10, Some(10)))
        .await;
    queue.dispatcher.refresh().await.unwrap();

    let count = queue.dispatcher.retry_failed().await.unwrap();

    assert_eq!(count, 2);
    for id in ["f1", "f2"] {
        let task = queue.state.task(&TaskId::new(id)).await.unwrap();
        assert_eq!(task.state, TaskState::Queued);
        assert_eq!(task.retries, 1);
        assert!(task.error.is_none());
    }
    assert_eq!(
        queue.state.task(&TaskId::new("done")).await.unwrap().state,
        TaskState::Completed
    );
}

#[tokio::test]
async fn test_batch_cancel_with_explicit_ids() {
    let (engine, queue, _reconciler) = build();
    engine
        .seed_task(common::task_fixture("a", TaskState::Downloading, 1, Some(10)))
        .await;
    engine
        .seed_task(common::task_fixture("b", TaskState::Queued, 0, None))
        .await;
    engine
        .seed_task(common::task_fixture("c", TaskState::Completed, 10, Some(10)))
        .await;
    queue.dispatcher.refresh().await.unwrap();

    let ids = vec![TaskId::new("a"), TaskId::new("c"), TaskId::new("ghost")];
    let count = queue.dispatcher.batch_cancel(Some(&ids)).await.unwrap();

    // "c" is already terminal, "ghost" is unknown: only "a" is cancelled
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_engine_unavailable_fails_fast_and_leaves_store_unchanged() {
    let (engine, queue, _reconciler) = build();
    engine
        .seed_task(common::task_fixture("a", TaskState::Downloading, 1, Some(10)))
        .await;
    queue.dispatcher.refresh().await.unwrap();

    engine.set_online(false).await;

    let err = queue
        .dispatcher
        .add(DownloadRequest::new("https://h/g.zip", "/d/g.zip"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unavailable { .. }));

    let err = queue.dispatcher.pause_all().await.unwrap_err();
    assert!(matches!(err, EngineError::Unavailable { .. }));

    // Store still holds exactly the pre-outage snapshot
    let tasks = queue.state.tasks().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].state, TaskState::Downloading);
}

#[tokio::test]
async fn test_remove_is_permitted_in_any_state() {
    let (engine, queue, _reconciler) = build();
    engine
        .seed_task(common::task_fixture("a", TaskState::Downloading, 1, Some(10)))
        .await;
    queue.dispatcher.refresh().await.unwrap();

    queue.dispatcher.remove(&TaskId::new("a")).await.unwrap();

    assert!(queue.state.task(&TaskId::new("a")).await.is_none());
    assert!(engine.list_tasks().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_single_task_commands_surface_not_found() {
    let (_engine, queue, _reconciler) = build();

    let err = queue.dispatcher.pause(&TaskId::new("ghost")).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_event_feed_end_to_end() {
    let (engine, queue, reconciler) = build();
    let id = queue
        .dispatcher
        .add(DownloadRequest::new("https://h/f.zip", "/d/f.zip"))
        .await
        .unwrap();

    let mut revision = queue.state.subscribe();
    tokio::spawn(reconciler.run());

    engine.emit(EngineEvent::started(id.as_str())).await;
    engine
        .emit(EngineEvent::progress(id.as_str(), 1_024, Some(2_048), 512))
        .await;
    engine.emit(EngineEvent::completed(id.as_str())).await;

    // Wait until the reconciler has driven the task to its terminal state
    let deadline = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(task) = queue.state.task(&id).await {
                if task.state == TaskState::Completed {
                    break;
                }
            }
            revision.changed().await.expect("state alive");
        }
    })
    .await;
    assert!(deadline.is_ok(), "reconciler never completed the task");

    let task = queue.state.task(&id).await.unwrap();
    assert!(task.started_at.is_some());
    assert!(task.completed_at.is_some());

    let history = queue.state.history_list(None).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, id);
}

#[tokio::test]
async fn test_verify_uses_recorded_checksum() {
    let (_engine, queue, _reconciler) = build();
    let id = queue
        .dispatcher
        .add(
            DownloadRequest::new("https://h/f.zip", "/d/f.zip")
                .with_checksum(common::FAKE_CHECKSUM),
        )
        .await
        .unwrap();

    assert!(queue.dispatcher.verify(&id).await.unwrap());
    assert_eq!(
        queue.dispatcher.checksum(&id).await.unwrap(),
        common::FAKE_CHECKSUM
    );
}

#[tokio::test]
async fn test_sync_stats_pulls_engine_aggregates() {
    let (engine, queue, _reconciler) = build();
    engine
        .seed_task(common::task_fixture("d1", TaskState::Downloading, 5, Some(10)))
        .await;
    engine
        .seed_task(common::task_fixture("q1", TaskState::Queued, 0, None))
        .await;

    // The local store has not fetched either task yet
    assert_eq!(queue.state.stats().await.total_count(), 0);

    let stats = queue.dispatcher.sync_stats().await.unwrap();

    assert_eq!(stats.downloading, 1);
    assert_eq!(stats.queued, 1);
    assert!((stats.overall_progress_percent - 50.0).abs() < 0.01);
    assert_eq!(queue.state.stats().await, stats);
}
