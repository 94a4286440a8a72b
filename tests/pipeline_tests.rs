// Pipeline integration tests: ordered delivery under out-of-order
// inference completion, failure isolation, stop/drain semantics, and
// the single-active-session invariant.

mod common;

use anyhow::Result;
use common::{frames_for_ms, scripted_manager, test_config, wait_until, ScriptedEngine};
use lecture_scribe::{DeviceError, EngineError, ReorderBuffer, SessionError, SessionManager};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Reorder buffer
// ============================================================================

#[test]
fn test_reorder_releases_in_order_completions_immediately() {
    let mut reorder = ReorderBuffer::new();

    assert_eq!(reorder.complete(0, "a".to_string()), vec!["a"]);
    assert_eq!(reorder.complete(1, "b".to_string()), vec!["b"]);
    assert_eq!(reorder.next_expected(), 2);
    assert_eq!(reorder.pending(), 0);
}

#[test]
fn test_reorder_buffers_early_completions_until_gap_fills() {
    let mut reorder = ReorderBuffer::new();

    // Completion order [1, 2, 0]: nothing is released until sequence 0
    // resolves, then everything comes out in sequence order at once
    assert!(reorder.complete(1, "world".to_string()).is_empty());
    assert!(reorder.complete(2, "foo".to_string()).is_empty());
    assert_eq!(reorder.pending(), 2);

    let released = reorder.complete(0, "hello".to_string());
    assert_eq!(released, vec!["hello", "world", "foo"]);
    assert_eq!(reorder.pending(), 0);
    assert_eq!(reorder.next_expected(), 3);
}

#[test]
fn test_reorder_empty_fragment_releases_ordering() {
    let mut reorder = ReorderBuffer::new();

    assert!(reorder.complete(1, "tail".to_string()).is_empty());

    // A failed segment resolves with no text but still advances the cursor
    let released = reorder.complete(0, String::new());
    assert_eq!(released, vec!["", "tail"]);
}

#[test]
fn test_reorder_ignores_already_delivered_sequence() {
    let mut reorder = ReorderBuffer::new();

    assert_eq!(reorder.complete(0, "a".to_string()), vec!["a"]);
    assert!(reorder.complete(0, "dup".to_string()).is_empty());
    assert_eq!(reorder.next_expected(), 1);
}

// ============================================================================
// Ordered delivery
// ============================================================================

#[tokio::test]
async fn test_transcript_is_ordered_despite_out_of_order_completion() -> Result<()> {
    // Three 1s segments; the engine resolves them in order [1, 2, 0]
    let engine = ScriptedEngine::new()
        .with(0, 400, Ok("hello"))
        .with(1, 100, Ok("world"))
        .with(2, 150, Ok("foo"));
    let manager = scripted_manager(engine, frames_for_ms(3000), false, test_config());

    let mut updates = manager.subscribe();
    let collector = tokio::spawn(async move {
        let mut snapshots = Vec::new();
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            let done = snapshot == "hello world foo";
            snapshots.push(snapshot);
            if done {
                break;
            }
        }
        snapshots
    });

    manager.start_session().await?;

    // Segments 1 and 2 complete early but stay buffered behind 0
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(manager.transcript(), "");

    assert!(
        wait_until(|| manager.transcript() == "hello world foo", 5000).await,
        "transcript never drained, got: {:?}",
        manager.transcript()
    );

    // The visible transcript only ever grew in sequence order
    let snapshots = collector.await?;
    for pair in snapshots.windows(2) {
        assert!(
            pair[1].starts_with(pair[0].as_str()),
            "transcript shrank or reordered: {:?} -> {:?}",
            pair[0],
            pair[1]
        );
    }

    let stats = manager.stop_session().await.expect("session was active");
    assert_eq!(stats.segments_dispatched, 3);
    assert_eq!(stats.segments_transcribed, 3);
    assert_eq!(stats.segments_failed, 0);

    Ok(())
}

#[tokio::test]
async fn test_failed_segment_contributes_nothing_but_keeps_order() -> Result<()> {
    // Sequence 2 fails; 0, 1, 3 still land in relative order
    let engine = ScriptedEngine::new()
        .with(0, 10, Ok("zero"))
        .with(1, 30, Ok("one"))
        .with(2, 20, Err(EngineError::InferenceFailed("model choked".to_string())))
        .with(3, 10, Ok("three"));
    let manager = scripted_manager(engine, frames_for_ms(3500), false, test_config());

    manager.start_session().await?;

    assert!(wait_until(|| manager.transcript() == "zero one three", 5000).await);

    let stats = manager.stop_session().await.expect("session was active");
    assert_eq!(stats.segments_dispatched, 4);
    assert_eq!(stats.segments_transcribed, 3);
    assert_eq!(stats.segments_failed, 1);

    Ok(())
}

#[tokio::test]
async fn test_not_ready_engine_fails_only_the_submitted_segment() -> Result<()> {
    // The engine was not up for segment 0; the session carries on
    let engine = ScriptedEngine::new()
        .with(0, 10, Err(EngineError::NotReady))
        .with(1, 10, Ok("later"));
    let manager = scripted_manager(engine, frames_for_ms(2000), false, test_config());

    manager.start_session().await?;

    assert!(wait_until(|| manager.transcript() == "later", 5000).await);

    let stats = manager.stop_session().await.expect("session was active");
    assert_eq!(stats.segments_failed, 1);

    Ok(())
}

#[tokio::test]
async fn test_empty_recognition_unblocks_later_segments() -> Result<()> {
    // Sequence 0 recognizes nothing (silence); sequence 1 must not wait
    let engine = ScriptedEngine::new()
        .with(0, 50, Ok(""))
        .with(1, 10, Ok("tail"));
    let manager = scripted_manager(engine, frames_for_ms(2000), false, test_config());

    manager.start_session().await?;

    assert!(wait_until(|| manager.transcript() == "tail", 5000).await);

    manager.stop_session().await;

    Ok(())
}

// ============================================================================
// Stop and drain
// ============================================================================

#[tokio::test]
async fn test_stop_flushes_trailing_segment_and_waits_for_drain() -> Result<()> {
    // 900ms of audio never reaches a 1s boundary: the only segment is
    // the trailing partial, flushed and transcribed during stop()
    let engine = ScriptedEngine::new().with(0, 200, Ok("captured"));
    let manager = scripted_manager(engine, frames_for_ms(900), true, test_config());

    manager.start_session().await?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let stats = manager.stop_session().await.expect("session was active");

    assert_eq!(manager.transcript(), "captured");
    assert_eq!(stats.segments_dispatched, 1);
    assert_eq!(stats.segments_transcribed, 1);
    assert!(!stats.is_recording);

    Ok(())
}

#[tokio::test]
async fn test_transcript_is_frozen_after_stop() -> Result<()> {
    // Sequence 1 outlives the 500ms drain timeout; its result (and the
    // buffered sequence 2) must be discarded, even though the inference
    // itself completes later
    let engine = ScriptedEngine::new()
        .with(0, 10, Ok("alpha"))
        .with(1, 700, Ok("slow"))
        .with(2, 10, Ok("gamma"));
    let manager = scripted_manager(engine, frames_for_ms(2500), true, test_config());

    manager.start_session().await?;

    assert!(wait_until(|| manager.transcript() == "alpha", 2000).await);

    let stats = manager.stop_session().await.expect("session was active");
    assert!(!stats.is_recording);
    assert_eq!(stats.segments_dispatched, 3);

    let frozen = manager.transcript();
    assert_eq!(frozen, "alpha");

    // Sequence 1 completes around 700ms; nothing may arrive late
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(manager.transcript(), frozen);

    Ok(())
}

#[tokio::test]
async fn test_stop_without_session_is_a_noop() -> Result<()> {
    let manager = scripted_manager(
        ScriptedEngine::new(),
        Vec::new(),
        false,
        test_config(),
    );

    assert!(manager.stop_session().await.is_none());
    assert!(!manager.is_active().await);

    Ok(())
}

// ============================================================================
// Session lifecycle
// ============================================================================

#[tokio::test]
async fn test_second_start_fails_without_disturbing_the_first() -> Result<()> {
    let engine = ScriptedEngine::new().with(0, 10, Ok("ongoing"));
    let manager = scripted_manager(engine, frames_for_ms(900), true, test_config());

    manager.start_session().await?;
    assert!(manager.is_active().await);

    // Second start is rejected outright
    let err = manager.start_session().await.unwrap_err();
    assert_eq!(err, SessionError::AlreadyActive);

    // The running session is untouched and still stops cleanly
    assert!(manager.is_active().await);
    let stats = manager.stop_session().await.expect("session was active");
    assert_eq!(stats.segments_dispatched, 1);

    Ok(())
}

#[tokio::test]
async fn test_permission_denied_leaves_no_active_session() -> Result<()> {
    let manager = SessionManager::new(
        test_config(),
        Arc::new(ScriptedEngine::new()),
        Box::new(|| Err(DeviceError::PermissionDenied)),
    );

    let err = manager.start_session().await.unwrap_err();
    assert_eq!(err, SessionError::Device(DeviceError::PermissionDenied));

    assert!(!manager.is_active().await);
    assert!(manager.stop_session().await.is_none());

    Ok(())
}

#[tokio::test]
async fn test_new_session_starts_with_a_clean_transcript() -> Result<()> {
    let engine = ScriptedEngine::new().with(0, 200, Ok("first words"));
    let manager = scripted_manager(engine, frames_for_ms(1000), false, test_config());

    manager.start_session().await?;
    assert!(wait_until(|| manager.transcript() == "first words", 5000).await);
    manager.stop_session().await;

    // The transcript survives stop for late readers
    assert_eq!(manager.transcript(), "first words");

    // ...until the next session resets it
    manager.start_session().await?;
    assert_eq!(manager.transcript(), "");

    assert!(wait_until(|| manager.transcript() == "first words", 5000).await);
    assert_eq!(manager.transcript(), "first words"); // no residue, no doubling

    manager.stop_session().await;

    Ok(())
}
