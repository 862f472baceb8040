use super::mock::{MockHelper, GAME_PATH};
use super::{custom, orchestrator, skin, Events};
use crate::config::ActivationConfig;
use crate::error::ActivationError;
use crate::helper::ActivateResponse;
use crate::orchestrator::Orchestrator;
use crate::progress::ActivationStage;
use crate::selection::ActivationRequest;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::task::Poll;
use tokio::sync::Semaphore;

#[tokio::test]
async fn test_skin_and_custom_end_to_end() {
    let (orchestrator, helper) = orchestrator(MockHelper::new());
    let events = Events::default();
    let request = ActivationRequest::new(vec![skin(1, 101)], vec![custom("c1")]);

    let summary = orchestrator.activate(&request, events.sink()).await.unwrap();

    assert_eq!(summary.activated, 2);
    assert!(summary.skipped.is_empty());
    assert!(!summary.selection_unchanged);

    let sent = helper.last_activate_request();
    assert_eq!(sent.game_path, Utf8PathBuf::from(GAME_PATH));
    assert_eq!(sent.items.len(), 2);
    assert_eq!(sent.items[0].local_path, Utf8PathBuf::from("/cache/101.bundle"));
    assert_eq!(sent.items[0].id, request.skins()[0].composite_key());
    assert!(!sent.items[0].is_custom);
    assert_eq!(sent.items[1].local_path, Utf8PathBuf::from("/mods/c1.fantome"));
    assert_eq!(sent.items[1].id, "c1");
    assert!(sent.items[1].is_custom);

    let last = events.last();
    assert_eq!(last.stage, ActivationStage::Complete);
    assert_eq!(last.current, 2);
    assert_eq!(last.total, 2);
    assert_eq!(last.completed_items, vec![0, 1]);
    assert!(orchestrator.is_overlay_running());
}

#[tokio::test]
async fn test_stages_are_emitted_in_order() {
    let (orchestrator, _helper) = orchestrator(MockHelper::new());
    let events = Events::default();
    let skins = (0..7).map(|i| skin(i, i * 1000 + 1)).collect();
    let request = ActivationRequest::new(skins, vec![custom("a"), custom("b")]);

    orchestrator.activate(&request, events.sink()).await.unwrap();

    let stages: Vec<ActivationStage> = events.all().iter().map(|e| e.stage).collect();
    assert!(stages.windows(2).all(|w| w[0] <= w[1]), "{stages:?}");
    assert_eq!(stages.first(), Some(&ActivationStage::Detecting));
    assert_eq!(
        stages.iter().filter(|s| **s == ActivationStage::Downloading).count(),
        2
    );
    assert_eq!(
        stages.iter().filter(|s| **s == ActivationStage::Preparing).count(),
        2
    );
    assert_eq!(stages.last(), Some(&ActivationStage::Complete));

    let preparing: Vec<Option<usize>> = events
        .all()
        .iter()
        .filter(|e| e.stage == ActivationStage::Preparing)
        .map(|e| e.current_item_index)
        .collect();
    assert_eq!(preparing, vec![Some(7), Some(8)]);
}

#[tokio::test]
async fn test_downloads_are_bounded_by_batch_size() {
    let (orchestrator, helper) = orchestrator(MockHelper::new());
    let events = Events::default();
    let skins = (0..12).map(|i| skin(i, i * 1000 + 1)).collect();
    let request = ActivationRequest::new(skins, vec![]);

    orchestrator.activate(&request, events.sink()).await.unwrap();

    assert_eq!(helper.download_calls.load(Ordering::SeqCst), 12);
    assert_eq!(helper.max_in_flight.load(Ordering::SeqCst), 5);

    let downloading: Vec<_> = events
        .all()
        .into_iter()
        .filter(|e| e.stage == ActivationStage::Downloading)
        .collect();
    let currents: Vec<usize> = downloading.iter().map(|e| e.current).collect();
    assert_eq!(currents, vec![5, 10, 12]);
    assert_eq!(downloading[0].completed_items, vec![0, 1, 2, 3, 4]);
    assert_eq!(downloading[2].completed_items.len(), 12);
}

#[tokio::test]
async fn test_custom_batch_size_is_honored() {
    let helper = Arc::new(MockHelper::new());
    let config = ActivationConfig {
        batch_size: 2,
        verify_cached_paths: false,
    };
    let orchestrator = Orchestrator::with_config(Arc::clone(&helper), config);
    let skins = (0..5).map(|i| skin(i, i * 1000 + 1)).collect();

    orchestrator
        .activate(&ActivationRequest::new(skins, vec![]), |_| {})
        .await
        .unwrap();

    assert_eq!(helper.max_in_flight.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failed_download_is_skipped() {
    let (orchestrator, helper) = orchestrator(MockHelper::new().failing_skin(201));
    let events = Events::default();
    let request = ActivationRequest::new(vec![skin(1, 101), skin(2, 201), skin(3, 301)], vec![]);

    let summary = orchestrator.activate(&request, events.sink()).await.unwrap();

    assert_eq!(summary.activated, 2);
    assert_eq!(summary.skipped, vec!["Champion 2 Skin 201".to_string()]);

    let sent = helper.last_activate_request();
    let paths: Vec<&str> = sent.items.iter().map(|i| i.local_path.as_str()).collect();
    assert_eq!(paths, vec!["/cache/101.bundle", "/cache/301.bundle"]);

    let all = events.all();
    let downloading = all
        .iter()
        .find(|e| e.stage == ActivationStage::Downloading)
        .unwrap();
    assert_eq!(downloading.current, 3);
    assert_eq!(downloading.completed_items, vec![0, 2]);
    assert!(all.iter().any(|e| e.stage == ActivationStage::Activating));

    let last = events.last();
    assert_eq!(last.stage, ActivationStage::Complete);
    assert_eq!(last.completed_items, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_all_downloads_failing_is_an_error() {
    let (orchestrator, helper) =
        orchestrator(MockHelper::new().failing_skin(101).failing_skin(201));
    let events = Events::default();
    let request = ActivationRequest::new(vec![skin(1, 101), skin(2, 201)], vec![]);

    let err = orchestrator.activate(&request, events.sink()).await.unwrap_err();

    assert_eq!(err, ActivationError::NothingResolved { failed: 2 });
    assert_eq!(helper.activate_calls(), 0);
    assert_eq!(events.last().stage, ActivationStage::Error);
    assert!(!orchestrator.is_overlay_running());
}

#[tokio::test]
async fn test_empty_request_fails_before_detection() {
    let (orchestrator, helper) = orchestrator(MockHelper::new());
    let events = Events::default();

    let err = orchestrator
        .activate(&ActivationRequest::default(), events.sink())
        .await
        .unwrap_err();

    assert_eq!(err, ActivationError::EmptySelection);
    let all = events.all();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].stage, ActivationStage::Error);
    assert_eq!(helper.detect_calls.load(Ordering::SeqCst), 0);
    assert_eq!(helper.download_calls.load(Ordering::SeqCst), 0);
    assert!(!orchestrator.is_activation_in_progress());
}

#[tokio::test]
async fn test_missing_game_path() {
    let (orchestrator, helper) = orchestrator(MockHelper::new().without_game());
    let events = Events::default();
    let request = ActivationRequest::new(vec![skin(1, 101)], vec![]);

    let err = orchestrator.activate(&request, events.sink()).await.unwrap_err();

    assert_eq!(err, ActivationError::GamePathNotFound);
    assert_eq!(helper.download_calls.load(Ordering::SeqCst), 0);
    let stages: Vec<_> = events.all().iter().map(|e| e.stage).collect();
    assert_eq!(stages, vec![ActivationStage::Detecting, ActivationStage::Error]);
    assert_eq!(events.last().message, err.to_string());
}

#[tokio::test]
async fn test_concurrent_activation_is_rejected() {
    let gate = Arc::new(Semaphore::new(0));
    let (orchestrator, helper) = orchestrator(MockHelper::new().gated(Arc::clone(&gate)));
    let request = ActivationRequest::new(vec![], vec![custom("c1")]);

    let first_events = Events::default();
    let mut first = Box::pin(orchestrator.activate(&request, first_events.sink()));
    assert!(matches!(futures::poll!(&mut first), Poll::Pending));
    assert!(orchestrator.is_activation_in_progress());

    let second_events = Events::default();
    let err = orchestrator
        .activate(&request, second_events.sink())
        .await
        .unwrap_err();

    assert_eq!(err, ActivationError::AlreadyInProgress);
    let rejected = second_events.all();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].stage, ActivationStage::Error);
    assert_eq!(rejected[0].message, err.to_string());
    assert!(rejected[0].message.contains("already in progress"));
    assert!(!orchestrator.is_overlay_running());
    assert_eq!(helper.detect_calls.load(Ordering::SeqCst), 1);
    assert_eq!(helper.activate_calls(), 1);

    gate.add_permits(1);
    let summary = first.await.unwrap();
    assert!(!summary.selection_unchanged);
    assert!(orchestrator.is_overlay_running());
    assert!(!orchestrator.is_activation_in_progress());
}

#[tokio::test]
async fn test_guard_released_after_failure() {
    let (orchestrator, _helper) =
        orchestrator(MockHelper::new().responding(ActivateResponse::failed("boom")));
    let request = ActivationRequest::new(vec![skin(1, 101)], vec![]);

    assert!(orchestrator.activate(&request, |_| {}).await.is_err());
    assert!(!orchestrator.is_activation_in_progress());
    let err = orchestrator.activate(&request, |_| {}).await.unwrap_err();
    assert_ne!(err, ActivationError::AlreadyInProgress);
}

#[tokio::test]
async fn test_native_failure_message_is_verbatim() {
    let (orchestrator, helper) = orchestrator(
        MockHelper::new().responding(ActivateResponse::failed("mkoverlay failed: bad wad")),
    );
    let events = Events::default();
    let request = ActivationRequest::new(vec![skin(1, 101)], vec![]);

    let err = orchestrator.activate(&request, events.sink()).await.unwrap_err();

    assert_eq!(
        err,
        ActivationError::Native {
            message: "mkoverlay failed: bad wad".to_string()
        }
    );
    let last = events.last();
    assert_eq!(last.stage, ActivationStage::Error);
    assert_eq!(last.message, "mkoverlay failed: bad wad");
    assert_eq!(last.vanguard_blocked, None);
    assert_eq!(helper.refresh_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_security_block_refreshes_helper_once() {
    let (orchestrator, helper) = orchestrator(
        MockHelper::new()
            .responding(ActivateResponse::blocked("C0000229"))
            .refreshing(true),
    );
    let events = Events::default();
    let request = ActivationRequest::new(vec![skin(1, 101)], vec![]);

    let err = orchestrator.activate(&request, events.sink()).await.unwrap_err();

    assert_eq!(err, ActivationError::SecurityBlocked { refreshed: true });
    assert!(err.retry_recommended());
    assert_eq!(helper.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(helper.activate_calls(), 1);

    let last = events.last();
    assert_eq!(last.stage, ActivationStage::Error);
    assert_eq!(last.vanguard_blocked, Some(true));
    assert!(last.message.contains("try activating again"));
    assert!(!last.message.contains("C0000229"));
    assert!(!orchestrator.is_overlay_running());
}

#[tokio::test]
async fn test_security_block_with_failed_refresh() {
    let (orchestrator, helper) = orchestrator(
        MockHelper::new()
            .responding(ActivateResponse::blocked("ah_result"))
            .refreshing(false),
    );
    let events = Events::default();
    let request = ActivationRequest::new(vec![], vec![custom("c1")]);

    let err = orchestrator.activate(&request, events.sink()).await.unwrap_err();

    assert_eq!(err, ActivationError::SecurityBlocked { refreshed: false });
    assert!(!err.retry_recommended());
    assert_eq!(helper.refresh_calls.load(Ordering::SeqCst), 1);

    let last = events.last();
    assert_eq!(last.vanguard_blocked, Some(true));
    assert!(last.message.contains("refreshing the helper failed"));
}

#[tokio::test]
async fn test_same_selection_is_flagged_unchanged() {
    let (orchestrator, helper) = orchestrator(MockHelper::new());
    let first = ActivationRequest::new(vec![skin(1, 101), skin(2, 201)], vec![custom("c1")]);
    let reordered = ActivationRequest::new(vec![skin(2, 201), skin(1, 101)], vec![custom("c1")]);

    let summary = orchestrator.activate(&first, |_| {}).await.unwrap();
    assert!(!summary.selection_unchanged);
    assert!(!helper.last_activate_request().selection_unchanged);

    let summary = orchestrator.activate(&reordered, |_| {}).await.unwrap();
    assert!(summary.selection_unchanged);
    assert!(helper.last_activate_request().selection_unchanged);
    assert_eq!(helper.activate_calls(), 2);

    let changed = ActivationRequest::new(vec![skin(1, 101).with_chroma(105, None, None)], vec![]);
    let summary = orchestrator.activate(&changed, |_| {}).await.unwrap();
    assert!(!summary.selection_unchanged);
}

#[tokio::test]
async fn test_failed_activation_keeps_previous_fingerprint() {
    let (orchestrator, helper) = orchestrator(MockHelper::new());
    let request = ActivationRequest::new(vec![skin(1, 101)], vec![]);
    orchestrator.activate(&request, |_| {}).await.unwrap();

    *helper.activate_response.lock().unwrap() = ActivateResponse::failed("boom");
    let other = ActivationRequest::new(vec![skin(1, 102)], vec![]);
    assert!(orchestrator.activate(&other, |_| {}).await.is_err());

    *helper.activate_response.lock().unwrap() = ActivateResponse::succeeded("ok");
    let summary = orchestrator.activate(&request, |_| {}).await.unwrap();
    assert!(summary.selection_unchanged);
}

#[tokio::test]
async fn test_cached_paths_are_reused() {
    let (orchestrator, helper) = orchestrator(MockHelper::new());
    let request = ActivationRequest::new(vec![skin(1, 101), skin(2, 201)], vec![]);

    orchestrator.activate(&request, |_| {}).await.unwrap();
    orchestrator.activate(&request, |_| {}).await.unwrap();

    assert_eq!(helper.download_calls.load(Ordering::SeqCst), 2);
    assert_eq!(helper.last_activate_request().items.len(), 2);
}

#[tokio::test]
async fn test_variants_are_cached_separately() {
    let (orchestrator, helper) = orchestrator(MockHelper::new());
    let base = ActivationRequest::new(vec![skin(1, 101)], vec![]);
    let chroma = ActivationRequest::new(vec![skin(1, 101).with_chroma(105, None, None)], vec![]);

    orchestrator.activate(&base, |_| {}).await.unwrap();
    orchestrator.activate(&chroma, |_| {}).await.unwrap();

    assert_eq!(helper.download_calls.load(Ordering::SeqCst), 2);
    let requests = helper.download_requests.lock().unwrap().clone();
    assert_eq!(requests[1].chroma_id, Some(105));
    assert_eq!(
        helper.last_activate_request().items[0].local_path,
        Utf8PathBuf::from("/cache/101_chroma_105.bundle")
    );
}

#[tokio::test]
async fn test_duplicate_keys_download_once() {
    let (orchestrator, helper) = orchestrator(MockHelper::new());
    let request = ActivationRequest::new(vec![skin(1, 101), skin(1, 101)], vec![]);

    let summary = orchestrator.activate(&request, |_| {}).await.unwrap();

    assert_eq!(helper.download_calls.load(Ordering::SeqCst), 1);
    assert_eq!(summary.activated, 2);
}

#[tokio::test]
async fn test_invalidate_cache_forces_download() {
    let (orchestrator, helper) = orchestrator(MockHelper::new());
    let request = ActivationRequest::new(vec![skin(1, 101)], vec![]);

    orchestrator.activate(&request, |_| {}).await.unwrap();
    orchestrator.invalidate_cache();
    let summary = orchestrator.activate(&request, |_| {}).await.unwrap();

    assert_eq!(helper.download_calls.load(Ordering::SeqCst), 2);
    assert!(!summary.selection_unchanged);
}

#[tokio::test]
async fn test_missing_cached_file_is_downloaded_again() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path()).unwrap();
    let helper = Arc::new(MockHelper::new().materializing_into(root));
    let orchestrator = Orchestrator::new(Arc::clone(&helper));
    let request = ActivationRequest::new(vec![skin(1, 101)], vec![]);

    orchestrator.activate(&request, |_| {}).await.unwrap();
    orchestrator.activate(&request, |_| {}).await.unwrap();
    assert_eq!(helper.download_calls.load(Ordering::SeqCst), 1);

    std::fs::remove_file(root.join("101.bundle")).unwrap();
    orchestrator.activate(&request, |_| {}).await.unwrap();
    assert_eq!(helper.download_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_game_path_is_detected_once_per_session() {
    let (orchestrator, helper) = orchestrator(MockHelper::new());
    let request = ActivationRequest::new(vec![], vec![custom("c1")]);

    orchestrator.activate(&request, |_| {}).await.unwrap();
    orchestrator.activate(&request, |_| {}).await.unwrap();

    assert_eq!(helper.detect_calls.load(Ordering::SeqCst), 1);
    assert_eq!(orchestrator.game_path(), Some(Utf8PathBuf::from(GAME_PATH)));
}
